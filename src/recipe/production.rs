//! Production planning recipe
//!
//! Lines run for some number of hours; each line produces each product at a
//! fixed rate; every product's demand must be covered at minimum cost.
//!
//! ```text
//! minimize   sum_l cost_l * hours_l
//! subject to sum_l rate_lp * hours_l >= demand_p     for every product p
//!            0 <= hours_l <= available_l
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use super::extract::{
    broadcast, hint_list, hint_numbers, hint_pairs, ident, merge_keyed, numbers_in, parse_number,
    single_value,
};
use super::shape::ExpectedShape;
use super::{ExtractionFailure, PartialModel, Recipe};
use crate::conformance::Violation;
use crate::model::{
    ConstraintSpec, ObjectiveSpec, ProblemCategory, ProblemDescription, Relation, Source,
    StructuredModel, Term, VarDomain, VariableSpec,
};

pub const ROLE: &str = "operating_time";

const DEFAULT_PRODUCT: &str = "product";

/// Largest line count accepted from a hint or the text
const MAX_LINES: usize = 1000;

lazy_static! {
    static ref LINE_COUNT: Regex = Regex::new(
        r"(?i)\b(\d+|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s+(?:production\s+|assembly\s+|manufacturing\s+)?lines\b"
    )
    .unwrap();
    static ref NAMED_LINE: Regex = Regex::new(r"\b[Ll]ine\s+([A-Z0-9][A-Za-z0-9]*)\b").unwrap();
    static ref RATE_LIST: Regex = Regex::new(
        r"(?i)(\d+(?:\.\d+)?(?:\s*,\s*(?:and\s+)?\d+(?:\.\d+)?|\s+and\s+\d+(?:\.\d+)?)*)\s*units?\s*(?:/\s*|per\s+)(?:hour|hr)\b(?:\s+of\s+([a-z][a-z0-9_]*))?"
    )
    .unwrap();
    static ref COST_LIST: Regex = Regex::new(
        r"(?i)(\$\s*\d[\d,]*(?:\.\d+)?(?:\s*,\s*(?:and\s+)?\$\s*\d[\d,]*(?:\.\d+)?|\s+and\s+\$\s*\d[\d,]*(?:\.\d+)?)*)\s*(?:/\s*|per\s+)(?:hour|hr|line-hour|operating\s+hour)\b"
    )
    .unwrap();
    static ref MONEY: Regex = Regex::new(r"\$\s*(\d[\d,]*(?:\.\d+)?)").unwrap();
    static ref HOURS: Regex = Regex::new(
        r"(?i)(?:(\d[\d,]*(?:\.\d+)?)\s*hours?\s+(?:available|of\s+capacity)|(?:up\s+to|at\s+most|no\s+more\s+than|a\s+maximum\s+of)\s+(\d[\d,]*(?:\.\d+)?)\s*hours?)"
    )
    .unwrap();
    static ref SENTENCE: Regex = Regex::new(r"[.;!?](?:\s+|$)").unwrap();
    static ref DEMAND_WORD: Regex = Regex::new(
        r"(?i)\b(?:demand|demands|deliver|produce|order|orders|require|requires|need|needs)\b"
    )
    .unwrap();
    static ref UNITS: Regex = Regex::new(
        r"(?i)(\d[\d,]*(?:\.\d+)?)\s*units?\b(?:\s+of\s+([a-z][a-z0-9_]*))?"
    )
    .unwrap();
    static ref PER_FOLLOWS: Regex = Regex::new(r"(?i)^\s*(?:/|per\b)").unwrap();
}

const NOT_A_PRODUCT: [&str; 8] = [
    "the", "a", "an", "each", "every", "product", "products", "output",
];

fn product_label(raw: Option<regex::Match<'_>>) -> String {
    match raw.map(|m| m.as_str().to_ascii_lowercase()) {
        Some(p) if !NOT_A_PRODUCT.contains(&p.as_str()) => p,
        _ => DEFAULT_PRODUCT.to_string(),
    }
}

/// Builds line-hour models from rate, demand, cost and capacity mentions
pub struct ProductionPlanningRecipe {
    shape: ExpectedShape,
}

impl ProductionPlanningRecipe {
    pub fn new() -> Self {
        ProductionPlanningRecipe {
            shape: ExpectedShape::generic(ProblemCategory::ProductionPlanning)
                .with_role(ROLE)
                .with_constraint(
                    "demand_coverage",
                    Relation::GreaterEq,
                    ROLE,
                    "sum of rate * operating_time >= demand",
                ),
        }
    }

    fn lines(&self, description: &ProblemDescription) -> Result<Vec<String>, ExtractionFailure> {
        if let Some(names) = hint_list(description, "lines") {
            let lines = dedup_labels(names);
            if lines.is_empty() {
                return Err(ExtractionFailure::MissingEntity {
                    entity: "usable names in hint 'lines'".to_string(),
                });
            }
            return Ok(lines);
        }
        if let Some(count) = description.hint("line_count") {
            let n = parse_number(count).ok_or_else(|| ExtractionFailure::MissingEntity {
                entity: format!("numeric value for hint 'line_count' (got '{}')", count),
            })?;
            return numbered_lines(n);
        }

        let text = description.text();
        let counts: Vec<f64> = LINE_COUNT
            .captures_iter(text)
            .filter_map(|c| parse_number(&c[1]))
            .collect();
        let count = single_value(&counts, "production line count")?;
        let named = dedup_labels(
            NAMED_LINE
                .captures_iter(text)
                .map(|c| format!("Line {}", &c[1]))
                .collect(),
        );

        match (count, named.is_empty()) {
            (Some(n), false) if n as usize != named.len() => Err(ExtractionFailure::Ambiguous {
                entity: "production line count".to_string(),
                candidates: vec![n.to_string(), named.len().to_string()],
            }),
            (_, false) => Ok(named),
            (Some(n), true) => numbered_lines(n),
            (None, true) => Err(ExtractionFailure::MissingEntity {
                entity: "production lines".to_string(),
            }),
        }
    }

    /// Demand per product, in first-mention order
    fn demand(
        &self,
        description: &ProblemDescription,
    ) -> Result<Vec<(String, f64)>, ExtractionFailure> {
        if let Some(pairs) = hint_pairs(description, "demand", DEFAULT_PRODUCT)? {
            return merge_keyed(pairs, "demand");
        }

        let text = description.text();
        let mut mentions = Vec::new();
        for sentence in SENTENCE.split(text) {
            if !DEMAND_WORD.is_match(sentence) {
                continue;
            }
            for caps in UNITS.captures_iter(sentence) {
                let Some(whole) = caps.get(0) else { continue };
                // rates, not quantities
                if PER_FOLLOWS.is_match(&sentence[whole.end()..]) {
                    continue;
                }
                if let Some(value) = parse_number(&caps[1]) {
                    mentions.push((product_label(caps.get(2)), value));
                }
            }
        }
        if mentions.is_empty() {
            return Err(ExtractionFailure::MissingEntity {
                entity: "demand".to_string(),
            });
        }
        merge_keyed(mentions, "demand")
    }

    /// Rate per line for one product; product-specific mentions beat generic ones
    fn rates(
        &self,
        description: &ProblemDescription,
        product: &str,
        lines: usize,
    ) -> Result<Vec<f64>, ExtractionFailure> {
        let entity = format!("production rates for '{}'", product);
        let specific_key = format!("rates_{}", ident(product));
        if let Some(values) = hint_numbers(description, &specific_key)? {
            return broadcast(&values, lines, &entity);
        }
        if let Some(values) = hint_numbers(description, "rates")? {
            return broadcast(&values, lines, &entity);
        }

        let mut specific: Vec<Vec<f64>> = Vec::new();
        let mut generic: Vec<Vec<f64>> = Vec::new();
        for caps in RATE_LIST.captures_iter(description.text()) {
            let values = numbers_in(&caps[1]);
            let label = product_label(caps.get(2));
            if label == DEFAULT_PRODUCT {
                push_distinct(&mut generic, values);
            } else if ident(&label) == ident(product) {
                push_distinct(&mut specific, values);
            }
        }
        let chosen = if specific.is_empty() { generic } else { specific };
        match chosen.len() {
            0 => Err(ExtractionFailure::MissingEntity { entity }),
            1 => broadcast(&chosen[0], lines, &entity),
            _ => Err(ExtractionFailure::Ambiguous {
                entity,
                candidates: chosen.iter().map(|v| format!("{:?}", v)).collect(),
            }),
        }
    }

    fn costs(
        &self,
        description: &ProblemDescription,
        lines: usize,
    ) -> Result<Vec<f64>, ExtractionFailure> {
        if let Some(values) = hint_numbers(description, "costs")? {
            return broadcast(&values, lines, "cost per line-hour");
        }
        let mut found: Vec<Vec<f64>> = Vec::new();
        for caps in COST_LIST.captures_iter(description.text()) {
            let values = MONEY
                .captures_iter(&caps[1])
                .filter_map(|m| parse_number(&m[1]))
                .collect();
            push_distinct(&mut found, values);
        }
        match found.len() {
            0 => Ok(vec![1.0; lines]),
            1 => broadcast(&found[0], lines, "cost per line-hour"),
            _ => Err(ExtractionFailure::Ambiguous {
                entity: "cost per line-hour".to_string(),
                candidates: found.iter().map(|v| format!("{:?}", v)).collect(),
            }),
        }
    }

    fn hours(
        &self,
        description: &ProblemDescription,
        lines: usize,
    ) -> Result<Vec<Option<f64>>, ExtractionFailure> {
        if let Some(values) = hint_numbers(description, "hours")? {
            return Ok(broadcast(&values, lines, "available hours")?
                .into_iter()
                .map(Some)
                .collect());
        }
        let values: Vec<f64> = HOURS
            .captures_iter(description.text())
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .filter_map(|m| parse_number(m.as_str()))
            .collect();
        if values.is_empty() {
            return Ok(vec![None; lines]);
        }
        let values = match single_value(&values, "available hours") {
            Ok(Some(one)) => vec![one],
            _ => values,
        };
        Ok(broadcast(&values, lines, "available hours")?
            .into_iter()
            .map(Some)
            .collect())
    }
}

impl Default for ProductionPlanningRecipe {
    fn default() -> Self {
        Self::new()
    }
}

/// "Line 1" ..= "Line n"; counts outside 1..=MAX_LINES are unusable
fn numbered_lines(n: f64) -> Result<Vec<String>, ExtractionFailure> {
    if !(1.0..=MAX_LINES as f64).contains(&n) {
        return Err(ExtractionFailure::MissingEntity {
            entity: format!("production line count between 1 and {} (got {})", MAX_LINES, n),
        });
    }
    Ok((1..=n as usize).map(|i| format!("Line {}", i)).collect())
}

fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        if !ident(&label).is_empty() && !out.iter().any(|l| ident(l) == ident(&label)) {
            out.push(label);
        }
    }
    out
}

fn push_distinct(lists: &mut Vec<Vec<f64>>, values: Vec<f64>) {
    if !values.is_empty() && !lists.contains(&values) {
        lists.push(values);
    }
}

impl Recipe for ProductionPlanningRecipe {
    fn category(&self) -> ProblemCategory {
        ProblemCategory::ProductionPlanning
    }

    fn shape(&self) -> &ExpectedShape {
        &self.shape
    }

    fn summary(&self) -> &str {
        "line operating hours covering product demand at minimum cost"
    }

    fn extract(&self, description: &ProblemDescription) -> Result<PartialModel, ExtractionFailure> {
        let lines = self.lines(description)?;
        let demand = self.demand(description)?;
        let costs = self.costs(description, lines.len())?;
        let hours = self.hours(description, lines.len())?;

        let names: Vec<String> = lines
            .iter()
            .map(|l| format!("hours_{}", ident(l)))
            .collect();
        let variables = lines
            .iter()
            .zip(&names)
            .zip(&hours)
            .map(|((line, name), upper)| {
                VariableSpec::new(name.clone(), ROLE)
                    .with_domain(VarDomain::Continuous)
                    .with_bounds(Some(0.0), *upper)
                    .with_description(format!("Operating hours of {}", line))
            })
            .collect();

        let mut constraints = Vec::with_capacity(demand.len());
        for (product, required) in &demand {
            let rates = self.rates(description, product, lines.len())?;
            let terms = rates
                .iter()
                .zip(&names)
                .map(|(rate, name)| Term::new(*rate, name.clone()))
                .collect();
            constraints.push(
                ConstraintSpec::new(
                    format!("demand_{}", ident(product)),
                    terms,
                    Relation::GreaterEq,
                    *required,
                    Source::Deterministic,
                )
                .with_description(format!("Meet demand of {} units of {}", required, product)),
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
            .filter(|v| v.role == ROLE)
            .filter(|v| !matches!(v.lower, Some(lb) if lb >= 0.0))
            .map(|v| {
                Violation::RecipeRule(format!(
                    "operating time variable '{}' must have a non-negative lower bound",
                    v.name
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn desc(text: &str) -> ProblemDescription {
        ProblemDescription::new(text)
    }

    fn hinted(text: &str, hints: &[(&str, &str)]) -> ProblemDescription {
        let map: BTreeMap<String, String> = hints
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProblemDescription::with_hints(text, map)
    }

    #[test]
    fn test_three_lines_single_product() {
        let recipe = ProductionPlanningRecipe::new();
        let partial = recipe
            .extract(&desc(
                "We run 3 production lines producing 20, 30 and 25 units/hour. \
                 Operating costs are $50, $60 and $55 per hour. \
                 We must meet monthly demand of 500 units.",
            ))
            .unwrap();

        let names: Vec<&str> = partial.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["hours_line_1", "hours_line_2", "hours_line_3"]);
        assert!(partial.variables.iter().all(|v| v.role == ROLE));

        assert_eq!(partial.constraints.len(), 1);
        let demand = &partial.constraints[0];
        assert_eq!(demand.name, "demand_product");
        assert_eq!(demand.relation, Relation::GreaterEq);
        assert_eq!(demand.rhs, 500.0);
        let coefficients: Vec<f64> = demand.terms.iter().map(|t| t.coefficient).collect();
        assert_eq!(coefficients, vec![20.0, 30.0, 25.0]);

        let costs: Vec<f64> = partial.objective.terms.iter().map(|t| t.coefficient).collect();
        assert_eq!(costs, vec![50.0, 60.0, 55.0]);
    }

    #[test]
    fn test_named_lines_and_hours() {
        let recipe = ProductionPlanningRecipe::new();
        let partial = recipe
            .extract(&desc(
                "Line A and Line B each make 40 units per hour. Each line can run up to 160 hours. \
                 Customers order 4,000 units of widgets.",
            ))
            .unwrap();
        assert_eq!(partial.variables[0].name, "hours_line_a");
        assert_eq!(partial.variables[1].upper, Some(160.0));
        assert_eq!(partial.constraints[0].name, "demand_widgets");
        assert_eq!(partial.constraints[0].rhs, 4000.0);
        // no cost mention
        assert!(partial.objective.terms.iter().all(|t| t.coefficient == 1.0));
    }

    #[test]
    fn test_hints_override_text() {
        let recipe = ProductionPlanningRecipe::new();
        let partial = recipe
            .extract(&hinted(
                "3 production lines at 10 units/hour, demand of 100 units",
                &[("lines", "north, south"), ("rates", "5, 7"), ("demand", "gears=70")],
            ))
            .unwrap();
        assert_eq!(partial.variables.len(), 2);
        assert_eq!(partial.variables[0].name, "hours_north");
        assert_eq!(partial.constraints[0].name, "demand_gears");
        assert_eq!(partial.constraints[0].terms[1].coefficient, 7.0);
    }

    #[test]
    fn test_unusable_line_hints() {
        let recipe = ProductionPlanningRecipe::new();
        let text = "Production lines at 10 units/hour must meet demand of 50 units.";
        for hints in [
            [("line_count", "0")],
            [("line_count", "1 billion")],
            [("lines", "--, ??")],
        ] {
            let result = recipe.extract(&hinted(text, &hints));
            assert!(
                matches!(result, Err(ExtractionFailure::MissingEntity { .. })),
                "{:?} gave {:?}",
                hints,
                result
            );
        }
    }

    #[test]
    fn test_count_disagrees_with_named_lines() {
        let recipe = ProductionPlanningRecipe::new();
        let result = recipe.extract(&desc(
            "Our 3 production lines (Line A and Line B) make 10 units/hour; demand of 50 units.",
        ));
        assert!(matches!(result, Err(ExtractionFailure::Ambiguous { .. })));
    }

    #[test]
    fn test_rate_count_mismatch_is_ambiguous() {
        let recipe = ProductionPlanningRecipe::new();
        let result = recipe.extract(&desc(
            "3 production lines producing 20 and 30 units/hour must meet demand of 500 units.",
        ));
        assert!(matches!(result, Err(ExtractionFailure::Ambiguous { .. })));
    }

    #[test]
    fn test_missing_demand() {
        let recipe = ProductionPlanningRecipe::new();
        let result = recipe.extract(&desc("2 production lines producing 20 units/hour."));
        assert_eq!(
            result.unwrap_err(),
            ExtractionFailure::MissingEntity {
                entity: "demand".to_string()
            }
        );
    }

    #[test]
    fn test_validate_requires_lower_bound() {
        let recipe = ProductionPlanningRecipe::new();
        let partial = recipe
            .extract(&desc("2 production lines at 20 units/hour; demand of 100 units."))
            .unwrap();
        let mut model = partial.into_model(
            ProblemCategory::ProductionPlanning,
            crate::model::Provenance::Deterministic,
        );
        assert!(recipe.validate(&model).is_empty());
        model.variables[0].lower = None;
        assert_eq!(recipe.validate(&model).len(), 1);
    }
}
