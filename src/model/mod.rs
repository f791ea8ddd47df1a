//! Data Model
//!
//! Problem descriptions going in, structured optimization models coming out.

pub mod lp;
pub mod problem;
pub mod structured;

pub use problem::{Classification, ProblemCategory, ProblemDescription};
pub use structured::{
    estimate_complexity, Complexity, ConstraintSpec, Direction, ObjectiveSpec, Provenance,
    Relation, Source, StructuredModel, Term, VarDomain, VariableSpec,
};
