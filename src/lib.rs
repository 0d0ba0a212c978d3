#![forbid(unsafe_code)]

//! # `ipcw_influence`
//!
//! Per-subject influence functions for inverse-probability-of-censoring
//! weighted (IPCW) accuracy estimators of risk predictions under right
//! censoring and competing risks: the time-dependent AUC (plug-in and
//! cross-validated), the Brier score, and the cross-validated AUC of a binary
//! outcome. The censoring distribution is accounted for through the
//! Nelson–Aalen compensator of the censoring martingale.
//!
//! Influence vectors feed directly into standard errors and Wald intervals via
//! [`InfluenceSummary`].
//!
//! ```
//! use ipcw_influence::{
//!     AucOptions, CensoringWeights, InfluenceSummary, OrderingPolicy, SurvivalInput,
//!     auc_influence_input, ipcw_auc,
//! };
//!
//! let input = SurvivalInput::new(
//!     vec![1.0, 2.0, 2.0, 3.0, 4.0, 5.0, 5.0, 6.0],
//!     vec![1, 0, 2, 1, 0, 1, 2, 0],
//!     5.0,
//! );
//! let risk = [0.4, 0.3, 0.5, 0.7, 0.8, 0.6, 0.4, 0.1];
//! let weights = CensoringWeights::new(vec![1.0, 1.0, 0.9, 0.9, 0.9, 0.75, 0.75, 0.6], 0.75);
//!
//! let auc = ipcw_auc(&input, &risk, &weights, OrderingPolicy::RequireSorted).unwrap();
//! let ic = auc_influence_input(&input, &risk, &weights, auc, AucOptions::default()).unwrap();
//! let summary = InfluenceSummary::from_influence(auc, &ic, 0.95).unwrap();
//! assert!(summary.standard_error > 0.0);
//! ```

pub mod inference;
pub mod influence;
pub mod input;
pub mod utils;

pub use inference::{
    ConfidenceInterval, DEFAULT_CONFIDENCE_LEVEL, InferenceError, InfluenceSummary,
    render_influence_table, standard_error,
};
pub use influence::{
    AucComponents, AucOptions, CensoringCompensator, Horizon, InfluenceError, PairwiseKernel,
    RankAggregates, RankAggregationStrategy, RiskRanking, TieHandling, TimeBlock,
    auc_influence_cv_input, auc_influence_input, auc_influence_with_strategy,
    binary_auc_influence_cv, brier_influence_input, brier_influence_squared_input, ipcw_auc,
    ipcw_brier, ipcw_squared_residuals,
};
pub use input::{
    BinaryInput, CensoringWeights, EventStatus, HorizonRole, InputError, OrderingPolicy,
    PairwiseConcordance, SurvivalInput, TimeOrderedSample,
};
