//! Expected model shapes
//!
//! A shape is what a category's model must look like: the top-level fields a
//! generated response has to carry, the variable roles that must appear and
//! the constraint families that must be realised.

use serde::Serialize;

use crate::model::{ProblemCategory, Relation};

/// Top-level fields every structured model response must carry
pub const REQUIRED_FIELDS: [&str; 3] = ["variables", "objective", "constraints"];

/// A family of constraints a recipe always emits
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintShape {
    /// Family name (e.g. "demand_coverage")
    pub name: String,
    pub relation: Relation,
    /// Role of the variables the constraint sums over
    pub role: String,
    /// Human-readable form, e.g. "rate * operating_time >= demand"
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedShape {
    pub category: ProblemCategory,
    pub required_fields: Vec<String>,
    pub variable_roles: Vec<String>,
    pub constraint_shapes: Vec<ConstraintShape>,
}

impl ExpectedShape {
    /// Shape with only the required top-level fields
    pub fn generic(category: ProblemCategory) -> Self {
        ExpectedShape {
            category,
            required_fields: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            variable_roles: Vec::new(),
            constraint_shapes: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.variable_roles.push(role.into());
        self
    }

    pub fn with_constraint(
        mut self,
        name: impl Into<String>,
        relation: Relation,
        role: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.constraint_shapes.push(ConstraintShape {
            name: name.into(),
            relation,
            role: role.into(),
            description: description.into(),
        });
        self
    }
}
