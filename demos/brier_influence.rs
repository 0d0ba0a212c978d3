use ipcw_influence::{
    CensoringWeights, DEFAULT_CONFIDENCE_LEVEL, InfluenceSummary, OrderingPolicy, SurvivalInput,
    brier_influence_input, brier_influence_squared_input, ipcw_brier, ipcw_squared_residuals,
    render_influence_table,
};

const N_SUBJECTS: usize = 400;
const HORIZON: f64 = 3.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (input, risk) = deterministic_sample(N_SUBJECTS);
    let weights = censoring_kaplan_meier(&input);

    let brier = ipcw_brier(&input, &risk, &weights)?;
    let plug_in = brier_influence_input(
        &input,
        &risk,
        &weights.before_time,
        brier,
        OrderingPolicy::RequireSorted,
    )?;
    let residuals = ipcw_squared_residuals(&input, &risk, &weights)?;
    let from_residuals =
        brier_influence_squared_input(&input, &residuals, OrderingPolicy::RequireSorted)?;

    let rows = [
        (
            "brier (risk)",
            InfluenceSummary::from_influence(brier, &plug_in, DEFAULT_CONFIDENCE_LEVEL)?,
        ),
        (
            "brier (squared residuals)",
            InfluenceSummary::from_influence(brier, &from_residuals, DEFAULT_CONFIDENCE_LEVEL)?,
        ),
    ];
    println!("{}", render_influence_table(&rows));
    Ok(())
}

fn deterministic_sample(subjects: usize) -> (SurvivalInput, Vec<f64>) {
    let time = (0..subjects)
        .map(|i| 0.02f64.mul_add(usize_to_f64(i), 0.05))
        .collect();
    let status = (0..subjects)
        .map(|i| match i % 5 {
            0 => 0,
            1 | 3 => 1,
            _ => 2,
        })
        .collect();
    let risk = (0..subjects)
        .map(|i| {
            let wave = (usize_to_f64(i) / 17.0).sin();
            0.2f64.mul_add(wave, 0.4)
        })
        .collect();
    (SurvivalInput::new(time, status, HORIZON), risk)
}

/// Kaplan–Meier censoring survival for time-sorted data without ties.
fn censoring_kaplan_meier(input: &SurvivalInput) -> CensoringWeights {
    let n = input.len();
    let mut survival = 1.0;
    let mut at_horizon = 1.0;
    let mut before_time = Vec::with_capacity(n);
    for (i, (&time, &status)) in input.time.iter().zip(&input.status).enumerate() {
        before_time.push(survival);
        if status == 0 {
            survival *= 1.0 - 1.0 / usize_to_f64(n - i);
        }
        if time <= input.horizon {
            at_horizon = survival;
        }
    }
    CensoringWeights::new(before_time, at_horizon)
}

fn usize_to_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}
