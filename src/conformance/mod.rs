//! Conformance Checker
//!
//! Validates a candidate model against the shape its category expects.
//! Used for deterministic and generated models alike; holds no state.

use std::collections::HashSet;

use crate::model::StructuredModel;
use crate::recipe::{ExpectedShape, Recipe};

/// One failed expectation. Each renders to a single line, which is what
/// repair prompts quote back to the language model.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Expected variable role has no variable
    MissingRole(String),
    /// Two variables share a name
    DuplicateVariable(String),
    /// Variable or constraint name that LP files cannot carry
    InvalidName { kind: &'static str, name: String },
    /// Constraint references an undeclared variable
    DanglingReference { constraint: String, variable: String },
    /// Objective has no terms over declared variables
    ObjectiveEmpty,
    /// Objective references an undeclared variable
    ObjectiveDangling(String),
    /// lower > upper
    InvertedBounds { variable: String, lower: f64, upper: f64 },
    /// No constraint realises an expected constraint family
    MissingConstraintShape { shape: String, relation: String, role: String },
    /// NaN or infinite coefficient, bound or right-hand side
    NonFinite(String),
    /// Category-specific rule
    RecipeRule(String),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::MissingRole(role) => {
                write!(f, "No variable with expected role '{}'", role)
            }
            Violation::DuplicateVariable(name) => {
                write!(f, "Duplicate variable name: '{}'", name)
            }
            Violation::InvalidName { kind, name } => {
                write!(
                    f,
                    "Invalid {} name '{}': start with a letter or '_', then letters, digits, '_' or '.'",
                    kind, name
                )
            }
            Violation::DanglingReference {
                constraint,
                variable,
            } => {
                write!(
                    f,
                    "Constraint '{}' references undeclared variable '{}'",
                    constraint, variable
                )
            }
            Violation::ObjectiveEmpty => {
                write!(f, "Objective references no declared variable")
            }
            Violation::ObjectiveDangling(variable) => {
                write!(f, "Objective references undeclared variable '{}'", variable)
            }
            Violation::InvertedBounds {
                variable,
                lower,
                upper,
            } => {
                write!(
                    f,
                    "Variable '{}' has lower bound {} above upper bound {}",
                    variable, lower, upper
                )
            }
            Violation::MissingConstraintShape {
                shape,
                relation,
                role,
            } => {
                write!(
                    f,
                    "Missing '{}' constraint: need a '{}' constraint over '{}' variables",
                    shape, relation, role
                )
            }
            Violation::NonFinite(context) => write!(f, "Non-finite number in {}", context),
            Violation::RecipeRule(rule) => write!(f, "{}", rule),
        }
    }
}

/// Stateless shape checker
#[derive(Debug, Clone, Copy, Default)]
pub struct ConformanceChecker;

impl ConformanceChecker {
    /// Check a model; `Err` carries every violation found, in check order
    pub fn check(
        model: &StructuredModel,
        shape: &ExpectedShape,
        recipe: Option<&dyn Recipe>,
    ) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();

        Self::check_variables(model, shape, &mut violations);
        Self::check_names(model, &mut violations);
        Self::check_references(model, &mut violations);
        Self::check_bounds(model, &mut violations);
        Self::check_constraint_shapes(model, shape, &mut violations);
        Self::check_finite(model, &mut violations);
        if let Some(recipe) = recipe {
            violations.extend(recipe.validate(model));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    fn check_variables(model: &StructuredModel, shape: &ExpectedShape, out: &mut Vec<Violation>) {
        for role in &shape.variable_roles {
            if model.variables_with_role(role).next().is_none() {
                out.push(Violation::MissingRole(role.clone()));
            }
        }

        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for v in &model.variables {
            if !seen.insert(v.name.as_str()) && reported.insert(v.name.as_str()) {
                out.push(Violation::DuplicateVariable(v.name.clone()));
            }
        }
    }

    /// Constraint names may be empty; `to_lp` numbers those
    fn check_names(model: &StructuredModel, out: &mut Vec<Violation>) {
        for v in &model.variables {
            if !is_identifier(&v.name) {
                out.push(Violation::InvalidName {
                    kind: "variable",
                    name: v.name.clone(),
                });
            }
        }
        for c in &model.constraints {
            if !c.name.is_empty() && !is_identifier(&c.name) {
                out.push(Violation::InvalidName {
                    kind: "constraint",
                    name: c.name.clone(),
                });
            }
        }
    }

    fn check_references(model: &StructuredModel, out: &mut Vec<Violation>) {
        let declared = model.variable_names();

        for (i, c) in model.constraints.iter().enumerate() {
            let label = if c.name.is_empty() {
                format!("#{}", i + 1)
            } else {
                c.name.clone()
            };
            for var in c.variables() {
                if !declared.contains(var) {
                    out.push(Violation::DanglingReference {
                        constraint: label.clone(),
                        variable: var.to_string(),
                    });
                }
            }
        }

        let mut any_declared = false;
        for t in &model.objective.terms {
            if declared.contains(t.variable.as_str()) {
                any_declared = true;
            } else {
                out.push(Violation::ObjectiveDangling(t.variable.clone()));
            }
        }
        if !any_declared {
            out.push(Violation::ObjectiveEmpty);
        }
    }

    fn check_bounds(model: &StructuredModel, out: &mut Vec<Violation>) {
        for v in &model.variables {
            if let (Some(lower), Some(upper)) = (v.lower, v.upper) {
                if lower > upper {
                    out.push(Violation::InvertedBounds {
                        variable: v.name.clone(),
                        lower,
                        upper,
                    });
                }
            }
        }
    }

    /// Each family needs one constraint with its relation whose variables
    /// all carry the family's role
    fn check_constraint_shapes(
        model: &StructuredModel,
        shape: &ExpectedShape,
        out: &mut Vec<Violation>,
    ) {
        for family in &shape.constraint_shapes {
            let realised = model.constraints.iter().any(|c| {
                c.relation == family.relation
                    && !c.terms.is_empty()
                    && c.variables().all(|name| {
                        model
                            .variable(name)
                            .is_some_and(|v| v.role == family.role)
                    })
            });
            if !realised {
                out.push(Violation::MissingConstraintShape {
                    shape: family.name.clone(),
                    relation: family.relation.symbol().to_string(),
                    role: family.role.clone(),
                });
            }
        }
    }

    fn check_finite(model: &StructuredModel, out: &mut Vec<Violation>) {
        for v in &model.variables {
            let bad = [v.lower, v.upper].iter().flatten().any(|b| !b.is_finite());
            if bad {
                out.push(Violation::NonFinite(format!("bounds of '{}'", v.name)));
            }
        }
        for c in &model.constraints {
            if !c.rhs.is_finite() || c.terms.iter().any(|t| !t.coefficient.is_finite()) {
                out.push(Violation::NonFinite(format!("constraint '{}'", c.name)));
            }
        }
        if model.objective.terms.iter().any(|t| !t.coefficient.is_finite()) {
            out.push(Violation::NonFinite("objective".to_string()));
        }
    }
}

/// A letter or '_', then letters, digits, '_' or '.'
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ConstraintSpec, ObjectiveSpec, ProblemCategory, ProblemDescription, Provenance, Relation,
        Source, Term, VariableSpec,
    };
    use crate::recipe::{ProductionPlanningRecipe, RecipeRegistry};

    fn production_model() -> StructuredModel {
        ProductionPlanningRecipe::new()
            .extract(&ProblemDescription::new(
                "2 production lines at 20 and 30 units/hour; demand of 400 units.",
            ))
            .unwrap()
            .into_model(ProblemCategory::ProductionPlanning, Provenance::Deterministic)
    }

    fn check(model: &StructuredModel) -> Result<(), Vec<Violation>> {
        let registry = RecipeRegistry::with_builtin();
        let recipe = registry.lookup(model.category);
        ConformanceChecker::check(model, &registry.shape_for(model.category), recipe)
    }

    #[test]
    fn test_recipe_output_conforms() {
        assert_eq!(check(&production_model()), Ok(()));
    }

    #[test]
    fn test_dangling_reference() {
        let mut model = production_model();
        model.constraints[0].terms.push(Term::new(1.0, "ghost"));
        let violations = check(&model).unwrap_err();
        assert!(violations.contains(&Violation::DanglingReference {
            constraint: "demand_product".to_string(),
            variable: "ghost".to_string(),
        }));
    }

    #[test]
    fn test_duplicate_and_missing_role() {
        let mut model = production_model();
        model.variables[1].name = model.variables[0].name.clone();
        for v in &mut model.variables {
            v.role = "time".to_string();
        }
        let violations = check(&model).unwrap_err();
        assert!(violations.contains(&Violation::MissingRole("operating_time".to_string())));
        assert!(violations.contains(&Violation::DuplicateVariable("hours_line_1".to_string())));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::MissingConstraintShape { .. })));
    }

    #[test]
    fn test_objective_rules() {
        let mut model = production_model();
        model.objective = ObjectiveSpec::minimize(vec![Term::new(1.0, "nowhere")]);
        let violations = check(&model).unwrap_err();
        assert!(violations.contains(&Violation::ObjectiveDangling("nowhere".to_string())));
        assert!(violations.contains(&Violation::ObjectiveEmpty));
    }

    #[test]
    fn test_names_must_be_identifiers() {
        let mut model = production_model();
        model.variables[0].name = "hours line 1".to_string();
        model.constraints[0].name = "demand>=".to_string();
        let violations = check(&model).unwrap_err();
        assert!(violations.contains(&Violation::InvalidName {
            kind: "variable",
            name: "hours line 1".to_string(),
        }));
        assert!(violations.contains(&Violation::InvalidName {
            kind: "constraint",
            name: "demand>=".to_string(),
        }));

        assert!(is_identifier("alloc_s_p_500"));
        assert!(is_identifier("_x.1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_bounds_and_finite() {
        let mut model = production_model();
        model.variables[0].lower = Some(5.0);
        model.variables[0].upper = Some(1.0);
        model.constraints[0].rhs = f64::NAN;
        let violations = check(&model).unwrap_err();
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::InvertedBounds { .. })));
        assert!(violations.iter().any(|v| matches!(v, Violation::NonFinite(_))));
    }

    #[test]
    fn test_generic_shape_without_recipe() {
        let model = StructuredModel {
            category: ProblemCategory::Unknown,
            variables: vec![VariableSpec::new("angle", "pointing")],
            objective: ObjectiveSpec::maximize(vec![Term::new(1.0, "angle")]),
            constraints: vec![ConstraintSpec::new(
                "limit",
                vec![Term::new(1.0, "angle")],
                Relation::LessEq,
                90.0,
                Source::Generative,
            )],
            complexity: crate::model::Complexity::Low,
            provenance: Provenance::Generative,
        };
        assert_eq!(check(&model), Ok(()));
    }

    #[test]
    fn test_violation_lines() {
        let v = Violation::DanglingReference {
            constraint: "c1".to_string(),
            variable: "x".to_string(),
        };
        assert_eq!(v.to_string(), "Constraint 'c1' references undeclared variable 'x'");
        assert!(!Violation::ObjectiveEmpty.to_string().contains('\n'));
    }
}
