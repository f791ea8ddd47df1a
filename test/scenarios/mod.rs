//! Table-driven end-to-end scenarios

pub mod cases;
pub mod harness;
