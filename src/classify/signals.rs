//! Declarative signal table
//!
//! Each row maps a category to named signals; each signal fires when any of
//! its trigger phrases appears in the description. Adding a category is a
//! matter of adding a row.

use crate::model::ProblemCategory;

/// Lower-case the input and turn punctuation into word breaks.
///
/// `/` reads as "per" so "units/hour" and "units per hour" normalize alike.
pub fn normalize(input: &str) -> String {
    let spaced = input
        .to_lowercase()
        .replace('/', " per ")
        .replace(
            ['-', '_', '.', ',', ';', ':', '(', ')', '!', '?', '"', '\''],
            " ",
        );
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One named signal and its trigger phrases (already normalized)
#[derive(Debug, Clone)]
pub struct Signal {
    pub name: String,
    pub phrases: Vec<String>,
}

impl Signal {
    pub fn new(name: impl Into<String>, phrases: &[&str]) -> Self {
        Signal {
            name: name.into(),
            phrases: phrases.iter().map(|p| normalize(p)).collect(),
        }
    }

    /// Whether any phrase occurs on word boundaries in `haystack`.
    ///
    /// `haystack` must be normalized and padded with a space on both ends.
    pub fn matches(&self, haystack: &str) -> bool {
        self.phrases
            .iter()
            .filter(|p| !p.is_empty())
            .any(|p| haystack.contains(&format!(" {} ", p)))
    }
}

/// A category and the signals that support it
#[derive(Debug, Clone)]
pub struct SignalRule {
    pub category: ProblemCategory,
    pub signals: Vec<Signal>,
}

/// Ordered list of rules; order is the tie-break
#[derive(Debug, Clone, Default)]
pub struct SignalTable {
    rules: Vec<SignalRule>,
}

impl SignalTable {
    /// An empty table
    pub fn new() -> Self {
        SignalTable { rules: Vec::new() }
    }

    /// Append a row
    pub fn row(mut self, category: ProblemCategory, signals: Vec<Signal>) -> Self {
        self.push(SignalRule { category, signals });
        self
    }

    pub fn push(&mut self, rule: SignalRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[SignalRule] {
        &self.rules
    }

    /// The built-in table covering every registered recipe category
    pub fn builtin() -> Self {
        SignalTable::new()
            .row(
                ProblemCategory::ProductionPlanning,
                vec![
                    Signal::new(
                        "rate",
                        &[
                            "units/hour",
                            "units/day",
                            "per hour",
                            "throughput",
                            "production rate",
                            "rate",
                            "rates",
                        ],
                    ),
                    Signal::new(
                        "resources",
                        &[
                            "production line",
                            "production lines",
                            "assembly line",
                            "line",
                            "lines",
                            "machine",
                            "machines",
                            "plant",
                            "plants",
                            "factory",
                        ],
                    ),
                    Signal::new("demand", &["demand", "demands", "order", "orders", "quota"]),
                ],
            )
            .row(
                ProblemCategory::Staffing,
                vec![
                    Signal::new(
                        "workforce",
                        &[
                            "staff",
                            "staffing",
                            "employee",
                            "employees",
                            "worker",
                            "workers",
                            "nurse",
                            "nurses",
                            "agents",
                            "personnel",
                        ],
                    ),
                    Signal::new("shifts", &["shift", "shifts", "roster", "rota"]),
                    Signal::new(
                        "coverage",
                        &["coverage", "cover", "required", "minimum", "at least", "need", "needs"],
                    ),
                ],
            )
            .row(
                ProblemCategory::PortfolioAllocation,
                vec![
                    Signal::new(
                        "assets",
                        &[
                            "portfolio",
                            "asset",
                            "assets",
                            "stock",
                            "stocks",
                            "bond",
                            "bonds",
                            "fund",
                            "funds",
                            "securities",
                        ],
                    ),
                    Signal::new(
                        "returns",
                        &["return", "returns", "expected return", "yield", "yields"],
                    ),
                    Signal::new(
                        "capital",
                        &["budget", "invest", "investment", "capital", "allocate", "allocation"],
                    ),
                ],
            )
    }
}
