//! Staffing recipe: integer headcount per shift covering minimum requirements

use lazy_static::lazy_static;
use regex::Regex;

use super::extract::{
    broadcast, hint_list, hint_numbers, hint_pairs, ident, merge_keyed, parse_number, single_value,
};
use super::shape::ExpectedShape;
use super::{ExtractionFailure, PartialModel, Recipe};
use crate::conformance::Violation;
use crate::model::{
    ConstraintSpec, ObjectiveSpec, ProblemCategory, ProblemDescription, Relation, Source,
    StructuredModel, Term, VarDomain, VariableSpec,
};

pub const ROLE: &str = "staff_count";

lazy_static! {
    static ref NEED_FOR_SHIFT: Regex = Regex::new(
        r"(?i)\b(\d+|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s+(?:nurses?|staff|employees?|workers?|agents?|people|persons?|guards?|doctors?|operators?|cashiers?)\s+(?:for|during|on|in)\s+(?:the\s+|each\s+)?([a-z][a-z0-9-]*)\s+shifts?\b"
    )
    .unwrap();
    static ref SHIFT_NEEDS: Regex = Regex::new(
        r"(?i)\b([a-z][a-z0-9-]*)\s+shift\s+(?:needs|requires|must\s+have)\s+(?:at\s+least\s+)?(\d+|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\b"
    )
    .unwrap();
    static ref COST: Regex = Regex::new(
        r"(?i)\$\s*(\d[\d,]*(?:\.\d+)?)\s*(?:per|/|a|an|for\s+each)\s*(?:shift|worker|nurse|employee|staff|person)"
    )
    .unwrap();
    static ref AVAILABLE: Regex = Regex::new(
        r"(?i)\b(\d+|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s+(?:nurses?|staff|employees?|workers?|agents?|people|guards?|doctors?|operators?|cashiers?)\s+(?:are\s+|is\s+)?(?:available|on\s+the\s+roster|in\s+total)"
    )
    .unwrap();
}

const NOT_A_SHIFT: [&str; 7] = ["the", "each", "every", "a", "any", "per", "one"];

pub struct StaffingRecipe {
    shape: ExpectedShape,
}

impl StaffingRecipe {
    pub fn new() -> Self {
        StaffingRecipe {
            shape: ExpectedShape::generic(ProblemCategory::Staffing)
                .with_role(ROLE)
                .with_constraint(
                    "shift_coverage",
                    Relation::GreaterEq,
                    ROLE,
                    "staff_count >= required staff for the shift",
                ),
        }
    }

    /// Text mentions of (shift, required), in position order
    fn text_requirements(&self, text: &str) -> Vec<(String, f64)> {
        let mut found: Vec<(usize, String, f64)> = Vec::new();
        for caps in NEED_FOR_SHIFT.captures_iter(text) {
            if let (Some(m), Some(n)) = (caps.get(0), parse_number(&caps[1])) {
                found.push((m.start(), caps[2].to_ascii_lowercase(), n));
            }
        }
        for caps in SHIFT_NEEDS.captures_iter(text) {
            if let (Some(m), Some(n)) = (caps.get(0), parse_number(&caps[2])) {
                found.push((m.start(), caps[1].to_ascii_lowercase(), n));
            }
        }
        found.sort_by_key(|(pos, _, _)| *pos);
        found
            .into_iter()
            .filter(|(_, shift, _)| !NOT_A_SHIFT.contains(&shift.as_str()))
            .map(|(_, shift, n)| (shift, n))
            .collect()
    }

    fn requirements(
        &self,
        description: &ProblemDescription,
    ) -> Result<Vec<(String, f64)>, ExtractionFailure> {
        if let Some(shifts) = hint_list(description, "shifts") {
            let required = match hint_numbers(description, "required")? {
                Some(values) => broadcast(&values, shifts.len(), "required staff per shift")?,
                None => {
                    let mentioned = merge_keyed(
                        self.text_requirements(description.text()),
                        "required staff",
                    )?;
                    shifts
                        .iter()
                        .map(|shift| {
                            mentioned
                                .iter()
                                .find(|(s, _)| ident(s) == ident(shift))
                                .map(|(_, n)| *n)
                                .ok_or_else(|| ExtractionFailure::MissingEntity {
                                    entity: format!("required staff for '{}'", shift),
                                })
                        })
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            return merge_keyed(shifts.into_iter().zip(required).collect(), "required staff");
        }

        if description.hint("required").is_some_and(|v| v.contains(['=', ':'])) {
            if let Some(pairs) = hint_pairs(description, "required", "shift")? {
                return merge_keyed(pairs, "required staff");
            }
        }

        let mentions = self.text_requirements(description.text());
        if mentions.is_empty() {
            return Err(ExtractionFailure::MissingEntity {
                entity: "shift requirements".to_string(),
            });
        }
        merge_keyed(mentions, "required staff")
    }

    fn costs(
        &self,
        description: &ProblemDescription,
        shifts: usize,
    ) -> Result<Vec<f64>, ExtractionFailure> {
        if let Some(values) = hint_numbers(description, "cost")? {
            return broadcast(&values, shifts, "cost per shift");
        }
        let values: Vec<f64> = COST
            .captures_iter(description.text())
            .filter_map(|c| parse_number(&c[1]))
            .collect();
        let cost = single_value(&values, "cost per shift")?.unwrap_or(1.0);
        Ok(vec![cost; shifts])
    }

    fn available(
        &self,
        description: &ProblemDescription,
    ) -> Result<Option<f64>, ExtractionFailure> {
        if let Some(raw) = description.hint("available") {
            return parse_number(raw).map(Some).ok_or_else(|| ExtractionFailure::MissingEntity {
                entity: format!("numeric value for hint 'available' (got '{}')", raw),
            });
        }
        let values: Vec<f64> = AVAILABLE
            .captures_iter(description.text())
            .filter_map(|c| parse_number(&c[1]))
            .collect();
        single_value(&values, "available staff")
    }
}

impl Default for StaffingRecipe {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for StaffingRecipe {
    fn category(&self) -> ProblemCategory {
        ProblemCategory::Staffing
    }

    fn shape(&self) -> &ExpectedShape {
        &self.shape
    }

    fn summary(&self) -> &str {
        "integer staff per shift meeting minimum coverage at minimum cost"
    }

    fn extract(&self, description: &ProblemDescription) -> Result<PartialModel, ExtractionFailure> {
        let requirements = self.requirements(description)?;
        let costs = self.costs(description, requirements.len())?;
        let available = self.available(description)?;

        let names: Vec<String> = requirements
            .iter()
            .map(|(shift, _)| format!("staff_{}", ident(shift)))
            .collect();

        let variables = requirements
            .iter()
            .zip(&names)
            .map(|((shift, _), name)| {
                VariableSpec::new(name.clone(), ROLE)
                    .with_domain(VarDomain::Integer)
                    .with_bounds(Some(0.0), None)
                    .with_description(format!("Staff assigned to the {} shift", shift))
            })
            .collect();

        let mut constraints: Vec<ConstraintSpec> = requirements
            .iter()
            .zip(&names)
            .map(|((shift, required), name)| {
                ConstraintSpec::new(
                    format!("cover_{}", ident(shift)),
                    vec![Term::new(1.0, name.clone())],
                    Relation::GreaterEq,
                    *required,
                    Source::Deterministic,
                )
                .with_description(format!("At least {} staff on the {} shift", required, shift))
            })
            .collect();

        if let Some(limit) = available {
            constraints.push(
                ConstraintSpec::new(
                    "headcount",
                    names.iter().map(|n| Term::new(1.0, n.clone())).collect(),
                    Relation::LessEq,
                    limit,
                    Source::Deterministic,
                )
                .with_description(format!("No more than {} staff in total", limit)),
            );
        }

        let objective = ObjectiveSpec::minimize(
            costs
                .iter()
                .zip(&names)
                .map(|(cost, name)| Term::new(*cost, name.clone()))
                .collect(),
        );

        Ok(PartialModel {
            variables,
            objective,
            constraints,
        })
    }

    fn validate(&self, model: &StructuredModel) -> Vec<Violation> {
        model
            .variables
            .iter()
            .filter(|v| v.role == ROLE && v.domain != VarDomain::Integer)
            .map(|v| {
                Violation::RecipeRule(format!(
                    "staff count variable '{}' must be integer",
                    v.name
                ))
            })
            .collect()
    }
}
