//! Portfolio allocation recipe
//!
//! Splits a budget across assets to maximize expected return, optionally
//! capping the share held in any single asset.

use lazy_static::lazy_static;
use regex::Regex;

use super::extract::{
    broadcast, hint_list, hint_numbers, hint_pairs, ident, merge_keyed, parse_number, single_value,
};
use super::shape::ExpectedShape;
use super::{ExtractionFailure, PartialModel, Recipe};
use crate::conformance::Violation;
use crate::model::{
    ConstraintSpec, Direction, ObjectiveSpec, ProblemCategory, ProblemDescription, Relation,
    Source, StructuredModel, Term, VarDomain, VariableSpec,
};

pub const ROLE: &str = "allocation";

lazy_static! {
    static ref ASSET_RETURN: Regex = Regex::new(
        r"(?i)\b([a-z][a-z0-9&-]*(?:\s+[a-z][a-z0-9&-]*)?)\s+(?:returns?|yields?|earns?|(?:has|have|with)\s+an?\s+(?:expected\s+|annual\s+)?(?:return|yield)\s+of)\s+(?:about\s+|around\s+)?(\d+(?:\.\d+)?)\s*%"
    )
    .unwrap();
    static ref BUDGET: Regex = Regex::new(
        r"(?i)\b(?:budget\s+(?:of\s+|is\s+)?|invest\s+)\$?\s*(\d[\d,]*(?:\.\d+)?\s*(?:million|thousand|billion|mm|bn|k|m|b)?)\b"
    )
    .unwrap();
    static ref CAPITAL: Regex = Regex::new(
        r"(?i)\$\s*(\d[\d,]*(?:\.\d+)?\s*(?:million|thousand|billion|mm|bn|k|m|b)?)\s+(?:to\s+invest|of\s+capital|budget)\b"
    )
    .unwrap();
    static ref CAP: Regex = Regex::new(
        r"(?i)(?:no\s+more\s+than|at\s+most|up\s+to|a\s+maximum\s+of|capped\s+at)\s+(\d+(?:\.\d+)?)\s*%\s+(?:of\s+the\s+(?:budget|portfolio|capital)\s+)?(?:in|into|per|on)\s+(?:any|each|a\s+single|one)\s+(?:single\s+)?(?:asset|holding|investment|instrument)"
    )
    .unwrap();
}

const STOPWORDS: [&str; 16] = [
    "and", "or", "the", "while", "whereas", "but", "with", "an", "a", "each", "which", "that",
    "expected", "annual", "asset", "portfolio",
];

/// Strip leading filler words from a captured asset name
fn asset_name(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw
        .split_whitespace()
        .skip_while(|w| STOPWORDS.contains(&w.to_ascii_lowercase().as_str()))
        .collect();
    if words.is_empty()
        || words
            .iter()
            .any(|w| STOPWORDS.contains(&w.to_ascii_lowercase().as_str()))
    {
        return None;
    }
    Some(words.join(" ").to_ascii_lowercase())
}

/// Percent-or-fraction: 8 -> 0.08, 0.08 -> 0.08
fn as_fraction(value: f64) -> f64 {
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

pub struct PortfolioRecipe {
    shape: ExpectedShape,
}

impl PortfolioRecipe {
    pub fn new() -> Self {
        PortfolioRecipe {
            shape: ExpectedShape::generic(ProblemCategory::PortfolioAllocation)
                .with_role(ROLE)
                .with_constraint("budget", Relation::Equal, ROLE, "sum of allocation = budget"),
        }
    }

    fn text_returns(&self, text: &str) -> Result<Vec<(String, f64)>, ExtractionFailure> {
        let mentions = ASSET_RETURN
            .captures_iter(text)
            .filter_map(|c| {
                let name = asset_name(&c[1])?;
                let pct: f64 = c[2].parse().ok()?;
                Some((name, pct / 100.0))
            })
            .collect();
        merge_keyed(mentions, "expected return")
    }

    /// (asset, expected return as a fraction)
    fn returns(
        &self,
        description: &ProblemDescription,
    ) -> Result<Vec<(String, f64)>, ExtractionFailure> {
        if let Some(assets) = hint_list(description, "assets") {
            let values = match hint_numbers(description, "returns")? {
                Some(values) => broadcast(&values, assets.len(), "expected returns")?
                    .into_iter()
                    .map(as_fraction)
                    .collect(),
                None => {
                    let mentioned = self.text_returns(description.text())?;
                    assets
                        .iter()
                        .map(|asset| {
                            mentioned
                                .iter()
                                .find(|(a, _)| ident(a) == ident(asset))
                                .map(|(_, r)| *r)
                                .ok_or_else(|| ExtractionFailure::MissingEntity {
                                    entity: format!("expected return for '{}'", asset),
                                })
                        })
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            return merge_keyed(assets.into_iter().zip(values).collect(), "expected return");
        }

        if description.hint("returns").is_some_and(|v| v.contains(['=', ':'])) {
            if let Some(pairs) = hint_pairs(description, "returns", "asset")? {
                let pairs = pairs.into_iter().map(|(a, r)| (a, as_fraction(r))).collect();
                return merge_keyed(pairs, "expected return");
            }
        }

        let returns = self.text_returns(description.text())?;
        if returns.is_empty() {
            return Err(ExtractionFailure::MissingEntity {
                entity: "assets with expected returns".to_string(),
            });
        }
        Ok(returns)
    }

    fn budget(&self, description: &ProblemDescription) -> Result<f64, ExtractionFailure> {
        if let Some(raw) = description.hint("budget") {
            return parse_number(raw).ok_or_else(|| ExtractionFailure::MissingEntity {
                entity: format!("numeric value for hint 'budget' (got '{}')", raw),
            });
        }
        let text = description.text();
        let values: Vec<f64> = BUDGET
            .captures_iter(text)
            .chain(CAPITAL.captures_iter(text))
            .filter_map(|c| parse_number(&c[1]))
            .collect();
        Ok(single_value(&values, "budget")?.unwrap_or(1.0))
    }

    fn cap(&self, description: &ProblemDescription) -> Result<Option<f64>, ExtractionFailure> {
        if let Some(raw) = description.hint("max_share") {
            return parse_number(raw.trim_end_matches('%'))
                .map(|v| Some(as_fraction(v)))
                .ok_or_else(|| ExtractionFailure::MissingEntity {
                    entity: format!("numeric value for hint 'max_share' (got '{}')", raw),
                });
        }
        let values: Vec<f64> = CAP
            .captures_iter(description.text())
            .filter_map(|c| c[1].parse::<f64>().ok())
            .map(|pct| pct / 100.0)
            .collect();
        single_value(&values, "maximum share per asset")
    }
}

impl Default for PortfolioRecipe {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for PortfolioRecipe {
    fn category(&self) -> ProblemCategory {
        ProblemCategory::PortfolioAllocation
    }

    fn shape(&self) -> &ExpectedShape {
        &self.shape
    }

    fn summary(&self) -> &str {
        "budget split across assets maximizing expected return"
    }

    fn extract(&self, description: &ProblemDescription) -> Result<PartialModel, ExtractionFailure> {
        let returns = self.returns(description)?;
        let budget = self.budget(description)?;
        let upper = self.cap(description)?.map(|share| share * budget);

        let names: Vec<String> = returns
            .iter()
            .map(|(asset, _)| format!("alloc_{}", ident(asset)))
            .collect();

        let variables = returns
            .iter()
            .zip(&names)
            .map(|((asset, _), name)| {
                VariableSpec::new(name.clone(), ROLE)
                    .with_domain(VarDomain::Continuous)
                    .with_bounds(Some(0.0), upper)
                    .with_description(format!("Amount allocated to {}", asset))
            })
            .collect();

        let constraints = vec![ConstraintSpec::new(
            "budget",
            names.iter().map(|n| Term::new(1.0, n.clone())).collect(),
            Relation::Equal,
            budget,
            Source::Deterministic,
        )
        .with_description(format!("Allocate the full budget of {}", budget))];

        let objective = ObjectiveSpec::maximize(
            returns
                .iter()
                .zip(&names)
                .map(|((_, r), name)| Term::new(*r, name.clone()))
                .collect(),
        );

        Ok(PartialModel {
            variables,
            objective,
            constraints,
        })
    }

    fn validate(&self, model: &StructuredModel) -> Vec<Violation> {
        if model.objective.direction == Direction::Maximize {
            Vec::new()
        } else {
            vec![Violation::RecipeRule(
                "portfolio objective must maximize expected return".to_string(),
            )]
        }
    }
}
