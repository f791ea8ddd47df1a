//! Template Registry
//!
//! One deterministic model-construction recipe per known problem category.
//!
//! # Architecture
//!
//! ```text
//! ProblemDescription -> Recipe::extract -> PartialModel -> StructuredModel
//!                            |
//!                 pattern rules scoped to the category
//!                 (hints take precedence over text)
//! ```
//!
//! A recipe declares the variable roles it expects, the constraint families
//! it always emits, how to read parameters out of text and hints, and an
//! optional category-specific validation predicate. Recipes are read-only
//! once the registry is built.

pub mod extract;
pub mod portfolio;
pub mod production;
pub mod registry;
pub mod shape;
pub mod staffing;

pub use portfolio::PortfolioRecipe;
pub use production::ProductionPlanningRecipe;
pub use registry::{RecipeRegistry, RegistryBuilder};
pub use shape::{ConstraintShape, ExpectedShape, REQUIRED_FIELDS};
pub use staffing::StaffingRecipe;

use crate::conformance::Violation;
use crate::model::{
    estimate_complexity, ConstraintSpec, ObjectiveSpec, ProblemCategory, ProblemDescription,
    Provenance, StructuredModel, VariableSpec,
};

/// Why a recipe could not extract a model
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionFailure {
    /// A required entity was not found in text or hints
    MissingEntity { entity: String },
    /// Several candidate values for one entity and no rule to pick one
    Ambiguous {
        entity: String,
        candidates: Vec<String>,
    },
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionFailure::MissingEntity { entity } => {
                write!(f, "Missing required entity: {}", entity)
            }
            ExtractionFailure::Ambiguous { entity, candidates } => {
                write!(
                    f,
                    "Ambiguous {}: candidates [{}]",
                    entity,
                    candidates.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for ExtractionFailure {}

/// Variables, objective and constraints produced by a recipe, before the
/// assembler stamps category, complexity and provenance on them
#[derive(Debug, Clone, PartialEq)]
pub struct PartialModel {
    pub variables: Vec<VariableSpec>,
    pub objective: ObjectiveSpec,
    pub constraints: Vec<ConstraintSpec>,
}

impl PartialModel {
    /// Complete into a StructuredModel
    pub fn into_model(self, category: ProblemCategory, provenance: Provenance) -> StructuredModel {
        let complexity = estimate_complexity(&self.variables, &self.constraints);
        StructuredModel {
            category,
            variables: self.variables,
            objective: self.objective,
            constraints: self.constraints,
            complexity,
            provenance,
        }
    }
}

/// A deterministic model-construction recipe
pub trait Recipe: Send + Sync {
    /// Category this recipe builds models for
    fn category(&self) -> ProblemCategory;

    /// Expected variable roles and constraint families
    fn shape(&self) -> &ExpectedShape;

    /// Read the category's entities out of text and hints
    fn extract(&self, description: &ProblemDescription) -> Result<PartialModel, ExtractionFailure>;

    /// Category-specific checks applied on top of the generic conformance
    /// rules; runs for both deterministic and generated models
    fn validate(&self, _model: &StructuredModel) -> Vec<Violation> {
        Vec::new()
    }

    /// Short human-readable summary for listings
    fn summary(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Complexity, Term};

    #[test]
    fn test_failure_display() {
        let missing = ExtractionFailure::MissingEntity {
            entity: "demand".to_string(),
        };
        assert_eq!(missing.to_string(), "Missing required entity: demand");

        let ambiguous = ExtractionFailure::Ambiguous {
            entity: "line count".to_string(),
            candidates: vec!["3".to_string(), "4".to_string()],
        };
        assert_eq!(ambiguous.to_string(), "Ambiguous line count: candidates [3, 4]");
    }

    #[test]
    fn test_partial_into_model() {
        let partial = PartialModel {
            variables: vec![VariableSpec::new("x", "r")],
            objective: ObjectiveSpec::minimize(vec![Term::new(1.0, "x")]),
            constraints: Vec::new(),
        };
        let model = partial.into_model(ProblemCategory::Staffing, Provenance::Deterministic);
        assert_eq!(model.category, ProblemCategory::Staffing);
        assert_eq!(model.complexity, Complexity::Low);
        assert_eq!(model.provenance, Provenance::Deterministic);
    }
}
