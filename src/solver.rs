//! Solver interface
//!
//! Numerical solving happens outside this crate. Integrations implement
//! [`Solver`] and consume a conformant [`StructuredModel`]; file-based solvers
//! can use [`StructuredModel::to_lp`] instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::StructuredModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error,
}

/// Solver answer for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub status: SolveStatus,
    /// Variable name -> value; empty unless a point was found
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
    #[serde(default)]
    pub objective_value: Option<f64>,
}

impl Solution {
    pub fn value(&self, variable: &str) -> Option<f64> {
        self.values.get(variable).copied()
    }

    /// Objective recomputed from `values`; None if a referenced value is missing
    pub fn evaluate_objective(&self, model: &StructuredModel) -> Option<f64> {
        model
            .objective
            .terms
            .iter()
            .map(|t| self.value(&t.variable).map(|v| t.coefficient * v))
            .sum()
    }
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver unavailable: {0}")]
    Unavailable(String),

    #[error("solver rejected the model: {0}")]
    Rejected(String),
}

/// External numerical solver
pub trait Solver: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, model: &StructuredModel) -> Result<Solution, SolverError>;
}
