//! # Influence functions
//!
//! Per-subject influence-function contributions for IPCW time-dependent
//! accuracy estimators under right censoring and competing risks.
//!
//! Every entry point validates its input through [`crate::input`], arranges
//! the sample in time order, builds the Nelson–Aalen [`CensoringCompensator`]
//! and locates the [`Horizon`], then hands off to an assembler:
//!
//! - [`auc`] for the plug-in and cross-validated time-dependent AUC.
//! - [`brier`] for the Brier score and its squared-residual variant.
//! - [`binary`] for the cross-validated AUC on a binary outcome.
//!
//! Results are returned in the caller's subject order.

use thiserror::Error;

use crate::input::InputError;

pub mod auc;
pub mod binary;
pub mod brier;
pub mod compensator;
pub mod fold;
pub mod horizon;
pub mod ranking;

pub use auc::{
    AucComponents, AucOptions, auc_influence_cv_input, auc_influence_input,
    auc_influence_with_strategy, ipcw_auc,
};
pub use binary::binary_auc_influence_cv;
pub use brier::{
    brier_influence_input, brier_influence_squared_input, ipcw_brier, ipcw_squared_residuals,
};
pub use compensator::{CensoringCompensator, TimeBlock};
pub use horizon::Horizon;
pub use ranking::{
    PairwiseKernel, RankAggregates, RankAggregationStrategy, RiskRanking, TieHandling,
};

/// Errors returned by the influence-function entry points.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InfluenceError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("{quantity} must be finite and strictly positive, got {value}")]
    DegenerateDenominator { quantity: &'static str, value: f64 },
}
