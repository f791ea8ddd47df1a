//! Problem Classifier
//!
//! Rule-based classifier that maps a free-text problem description onto the
//! closed set of problem categories.
//!
//! # Algorithm
//!
//! 1. Normalize the text and every hint value into one padded haystack
//! 2. For each row of the signal table, count how many signals fire
//! 3. Confidence = fired / total signals for that row (capped at 1.0)
//! 4. Highest confidence wins; ties go to the row declared first
//! 5. Best confidence below the threshold yields `unknown` with confidence 0
//!
//! The classifier is a pure function of its input and the table.

pub mod signals;

pub use signals::{normalize, Signal, SignalRule, SignalTable};

use tracing::debug;

use crate::model::{Classification, ProblemCategory, ProblemDescription};

/// Default minimum confidence for a non-`unknown` answer
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Per-category score for one description
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub category: ProblemCategory,
    pub confidence: f32,
    pub matched: Vec<String>,
}

/// Lexical signal classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    table: SignalTable,
    threshold: f32,
}

impl Classifier {
    /// Create a classifier over a custom table
    pub fn new(table: SignalTable, threshold: f32) -> Self {
        Classifier {
            table,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Built-in table with the default threshold
    pub fn with_defaults() -> Self {
        Self::new(SignalTable::builtin(), DEFAULT_THRESHOLD)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn table(&self) -> &SignalTable {
        &self.table
    }

    /// Build the padded haystack from text and hint values
    fn haystack(description: &ProblemDescription) -> String {
        let mut corpus = normalize(description.text());
        for value in description.hints().values() {
            corpus.push(' ');
            corpus.push_str(&normalize(value));
        }
        format!(" {} ", corpus)
    }

    /// Score every row of the table, in declaration order
    pub fn scores(&self, description: &ProblemDescription) -> Vec<CategoryScore> {
        let haystack = Self::haystack(description);

        self.table
            .rules()
            .iter()
            .map(|rule| {
                let matched: Vec<String> = rule
                    .signals
                    .iter()
                    .filter(|s| s.matches(&haystack))
                    .map(|s| s.name.clone())
                    .collect();
                let confidence = if rule.signals.is_empty() {
                    0.0
                } else {
                    (matched.len() as f32 / rule.signals.len() as f32).min(1.0)
                };
                CategoryScore {
                    category: rule.category,
                    confidence,
                    matched,
                }
            })
            .collect()
    }

    /// Classify a description
    pub fn classify(&self, description: &ProblemDescription) -> Classification {
        let mut best: Option<CategoryScore> = None;

        for score in self.scores(description) {
            // Strictly greater: earlier rows win ties
            let better = best
                .as_ref()
                .map(|b| score.confidence > b.confidence)
                .unwrap_or(true);
            if better {
                best = Some(score);
            }
        }

        match best {
            Some(score) if score.confidence >= self.threshold && score.confidence > 0.0 => {
                debug!(
                    category = %score.category,
                    confidence = score.confidence,
                    signals = ?score.matched,
                    "classified problem"
                );
                Classification {
                    category: score.category,
                    confidence: score.confidence,
                    matched_signals: score.matched,
                }
            }
            _ => {
                debug!("no category reached threshold {:.2}", self.threshold);
                Classification::unknown()
            }
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn classify(text: &str) -> Classification {
        Classifier::with_defaults().classify(&ProblemDescription::new(text))
    }

    #[test]
    fn test_production_planning() {
        let c = classify(
            "We run 3 production lines at 20, 30 and 25 units/hour and must meet \
             monthly demand of 500 units.",
        );
        assert_eq!(c.category, ProblemCategory::ProductionPlanning);
        assert_eq!(c.confidence, 1.0);
        assert_eq!(c.matched_signals, vec!["rate", "resources", "demand"]);
    }

    #[test]
    fn test_staffing() {
        let c = classify("Schedule nurses so every shift has the required coverage");
        assert_eq!(c.category, ProblemCategory::Staffing);
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn test_portfolio() {
        let c = classify("Allocate a $1M budget across stocks and bonds to maximize return");
        assert_eq!(c.category, ProblemCategory::PortfolioAllocation);
    }

    #[test]
    fn test_unknown_below_threshold() {
        let c = classify("optimize telescope pointing schedule");
        assert_eq!(c.category, ProblemCategory::Unknown);
        assert_eq!(c.confidence, 0.0);
        assert!(c.matched_signals.is_empty());
    }

    #[test]
    fn test_hints_contribute_signals() {
        let mut hints = BTreeMap::new();
        hints.insert("industry".to_string(), "factory with two machines".to_string());
        let desc = ProblemDescription::with_hints("Meet the weekly demand at minimum cost", hints);

        let c = Classifier::with_defaults().classify(&desc);
        assert_eq!(c.category, ProblemCategory::ProductionPlanning);
        assert!((c.confidence - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_tie_goes_to_first_declared_row() {
        let table = SignalTable::new()
            .row(ProblemCategory::Staffing, vec![Signal::new("a", &["alpha"])])
            .row(ProblemCategory::ProductionPlanning, vec![Signal::new("b", &["beta"])]);
        let classifier = Classifier::new(table, 0.5);

        let c = classifier.classify(&ProblemDescription::new("beta alpha"));
        assert_eq!(c.category, ProblemCategory::Staffing);
    }

    #[test]
    fn test_confidence_monotonic_in_matched_signals() {
        let table = SignalTable::new().row(
            ProblemCategory::ProductionPlanning,
            vec![
                Signal::new("a", &["alpha"]),
                Signal::new("b", &["beta"]),
                Signal::new("c", &["gamma"]),
                Signal::new("d", &["delta"]),
            ],
        );
        let classifier = Classifier::new(table, 0.0);
        let texts = [
            "nothing",
            "alpha",
            "alpha beta",
            "alpha beta gamma",
            "alpha beta gamma delta",
        ];

        let mut previous = -1.0f32;
        for text in texts {
            let score = classifier.scores(&ProblemDescription::new(text))[0].confidence;
            assert!(score >= previous, "{} dropped confidence", text);
            previous = score;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn test_threshold_is_clamped() {
        let classifier = Classifier::new(SignalTable::builtin(), 7.0);
        assert_eq!(classifier.threshold(), 1.0);
    }
}
