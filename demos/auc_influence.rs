use faer::Mat;
use ipcw_influence::{
    AucOptions, CensoringWeights, DEFAULT_CONFIDENCE_LEVEL, HorizonRole, InfluenceSummary,
    OrderingPolicy, PairwiseConcordance, SurvivalInput, auc_influence_cv_input,
    auc_influence_input, ipcw_auc, render_influence_table,
};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

const N_SUBJECTS: usize = 2_000;
const HORIZON: f64 = 2.0;
const SIMULATION_SEED: u64 = 11;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (input, score) = simulate_competing_risks(N_SUBJECTS, SIMULATION_SEED);
    let weights = censoring_kaplan_meier(&input);
    println!(
        "subjects: {}, censoring survival at horizon: {:.3}",
        input.len(),
        weights.at_horizon
    );

    let auc = ipcw_auc(&input, &score, &weights, OrderingPolicy::SortAndRestore)?;
    let options = AucOptions {
        ordering: OrderingPolicy::SortAndRestore,
        ..AucOptions::default()
    };
    let plug_in = auc_influence_input(&input, &score, &weights, auc, options)?;

    // smoothed score differences stand in for out-of-fold concordance estimates
    let concordance = smoothed_concordance(&input, &score)?;
    let cv_numerator = auc * auc_denominator(&input, &weights)?;
    let cross_validated = auc_influence_cv_input(
        &input,
        &weights,
        &concordance,
        cv_numerator,
        OrderingPolicy::SortAndRestore,
    )?;

    let rows = [
        (
            "auc (plug-in)",
            InfluenceSummary::from_influence(auc, &plug_in, DEFAULT_CONFIDENCE_LEVEL)?,
        ),
        (
            "auc (smoothed kernel)",
            InfluenceSummary::from_influence(auc, &cross_validated, DEFAULT_CONFIDENCE_LEVEL)?,
        ),
    ];
    println!("{}", render_influence_table(&rows));
    Ok(())
}

fn simulate_competing_risks(subjects: usize, seed: u64) -> (SurvivalInput, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut time = Vec::with_capacity(subjects);
    let mut status = Vec::with_capacity(subjects);
    let mut score = Vec::with_capacity(subjects);
    for _ in 0..subjects {
        let x = sample_standard_normal(&mut rng);
        let event = sample_exponential(&mut rng, 0.5 * (0.8 * x).exp());
        let competing = sample_exponential(&mut rng, 0.3);
        let censoring = sample_exponential(&mut rng, 0.2);
        let first = event.min(competing);
        time.push(first.min(censoring));
        status.push(if censoring <= first {
            0
        } else if event < competing {
            1
        } else {
            2
        });
        score.push(x);
    }
    (SurvivalInput::new(time, status, HORIZON), score)
}

/// Kaplan–Meier censoring survival `G(T_i-)` and `G(tau)` in the caller's
/// order, assuming continuous times.
fn censoring_kaplan_meier(input: &SurvivalInput) -> CensoringWeights {
    let n = input.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| input.time[a].total_cmp(&input.time[b]));
    let mut survival = 1.0;
    let mut at_horizon = 1.0;
    let mut before_time = vec![1.0; n];
    for (rank, &subject) in order.iter().enumerate() {
        before_time[subject] = survival;
        if input.status[subject] == 0 {
            survival *= 1.0 - 1.0 / usize_to_f64(n - rank);
        }
        if input.time[subject] <= input.horizon {
            at_horizon = survival;
        }
    }
    CensoringWeights::new(before_time, at_horizon)
}

fn smoothed_concordance(
    input: &SurvivalInput,
    score: &[f64],
) -> Result<PairwiseConcordance, Box<dyn std::error::Error>> {
    let roles = input.roles()?;
    let cases: Vec<usize> = (0..roles.len())
        .filter(|&i| roles[i] == HorizonRole::Case)
        .collect();
    let controls: Vec<usize> = (0..roles.len())
        .filter(|&i| roles[i].is_control())
        .collect();
    let thetahat = Mat::from_fn(cases.len(), controls.len(), |row, col| {
        logistic(4.0 * (score[cases[row]] - score[controls[col]]))
    });
    Ok(PairwiseConcordance::new(thetahat, cases, controls))
}

/// `F1 * (P(T > tau) / G(tau) + F2)` from the weighted role shares.
fn auc_denominator(
    input: &SurvivalInput,
    weights: &CensoringWeights,
) -> Result<f64, Box<dyn std::error::Error>> {
    let roles = input.roles()?;
    let n = usize_to_f64(roles.len());
    let mut case_mass = 0.0;
    let mut competing_mass = 0.0;
    let mut survivors = 0.0;
    for (role, g) in roles.iter().zip(&weights.before_time) {
        match role {
            HorizonRole::Case => case_mass += 1.0 / g,
            HorizonRole::Competing => competing_mass += 1.0 / g,
            HorizonRole::Survivor => survivors += 1.0,
            HorizonRole::CensoredBefore => {}
        }
    }
    Ok(case_mass / n * (survivors / n / weights.at_horizon + competing_mass / n))
}

fn sample_standard_normal(rng: &mut StdRng) -> f64 {
    let u1 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

fn sample_exponential(rng: &mut StdRng, rate: f64) -> f64 {
    -(1.0 - rng.random::<f64>()).ln() / rate
}

fn logistic(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

fn usize_to_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}
