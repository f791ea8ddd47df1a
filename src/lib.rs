//! Dcision - natural-language to optimization-model compiler
//!
//! Turns an unstructured problem description into a solver-ready
//! mathematical program (variables, objective, constraints). Known problem
//! categories go through deterministic recipes; everything else goes through
//! a language model whose output is normalized, checked and repaired once.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ ProblemDescription│  text + hints
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │    Classifier    │  declarative signal table
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐     no recipe / low confidence / missing entity
//! │  ModelAssembler  │ ──────────────────────────────┐
//! └────────┬─────────┘                               ▼
//!          │ recipe                         ┌──────────────────┐
//!          ▼                                │ GenerativeAdapter│  LanguageModel
//! ┌──────────────────┐                      └────────┬─────────┘
//! │  RecipeRegistry  │                               ▼
//! └────────┬─────────┘                      ┌──────────────────┐
//!          │                                │    Normalizer    │  3 strategies
//!          │                                └────────┬─────────┘
//!          ▼                                         ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ ConformanceChecker                                            │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ▼
//!                   StructuredModel | FailureReport
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use dcision::ModelAssembler;
//!
//! # async fn run() {
//! let assembler = ModelAssembler::with_defaults(None);
//! let model = assembler
//!     .build_model(
//!         "3 production lines make 20, 30 and 25 units/hour; meet demand of 500 units",
//!         BTreeMap::new(),
//!         Some("production_planning"),
//!     )
//!     .await
//!     .unwrap();
//! println!("{}", model.to_lp());
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod classify;
pub mod config;
pub mod conformance;
pub mod generate;
pub mod model;
pub mod normalize;
pub mod recipe;
pub mod solver;

pub use assembler::{
    AssemblerConfig, BuildOutcome, BuildRequest, FailureReason, FailureReport, ModelAssembler,
    RouteDecision, Stage,
};
pub use classify::{Classifier, SignalTable};
pub use config::{ConfigError, DcisionConfig};
pub use conformance::{ConformanceChecker, Violation};
pub use generate::{
    ClaudeModel, GenerativeAdapter, LanguageModel, OllamaModel, ScriptedModel, TransportError,
};
pub use model::{
    Classification, Complexity, ConstraintSpec, Direction, ObjectiveSpec, ProblemCategory,
    ProblemDescription, Provenance, Relation, Source, StructuredModel, Term, VarDomain,
    VariableSpec,
};
pub use normalize::{NormalizationFailure, Normalizer, Strategy};
pub use recipe::{ExpectedShape, ExtractionFailure, PartialModel, Recipe, RecipeRegistry};
pub use solver::{Solution, SolveStatus, Solver, SolverError};
