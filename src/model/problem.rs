//! Problem descriptions and categories

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A free-text problem description plus caller-supplied hints.
///
/// Immutable once created: fields are private and only readable through
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDescription {
    text: String,
    hints: BTreeMap<String, String>,
}

impl ProblemDescription {
    /// Create a description with no hints
    pub fn new(text: impl Into<String>) -> Self {
        ProblemDescription {
            text: text.into(),
            hints: BTreeMap::new(),
        }
    }

    /// Create a description with hints
    pub fn with_hints(text: impl Into<String>, hints: BTreeMap<String, String>) -> Self {
        ProblemDescription {
            text: text.into(),
            hints,
        }
    }

    /// The raw text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All hints, in key order
    pub fn hints(&self) -> &BTreeMap<String, String> {
        &self.hints
    }

    /// Look up a single hint (keys are matched case-insensitively)
    pub fn hint(&self, key: &str) -> Option<&str> {
        self.hints
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

/// Closed set of problem categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCategory {
    ProductionPlanning,
    Staffing,
    PortfolioAllocation,
    #[serde(other)]
    Unknown,
}

impl ProblemCategory {
    /// Every category, in declaration order
    pub const ALL: [ProblemCategory; 4] = [
        ProblemCategory::ProductionPlanning,
        ProblemCategory::Staffing,
        ProblemCategory::PortfolioAllocation,
        ProblemCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemCategory::ProductionPlanning => "production_planning",
            ProblemCategory::Staffing => "staffing",
            ProblemCategory::PortfolioAllocation => "portfolio_allocation",
            ProblemCategory::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != ProblemCategory::Unknown
    }
}

impl fmt::Display for ProblemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        ProblemCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| format!("unknown problem category '{}'", s))
    }
}

/// Classifier output: a category and how strongly the text supports it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub category: ProblemCategory,
    /// Fraction of the category's signals that matched (0.0 - 1.0)
    pub confidence: f32,
    /// Names of the signals that matched
    pub matched_signals: Vec<String>,
}

impl Classification {
    pub fn unknown() -> Self {
        Classification {
            category: ProblemCategory::Unknown,
            confidence: 0.0,
            matched_signals: Vec::new(),
        }
    }

    /// A classification forced by the caller
    pub fn forced(category: ProblemCategory) -> Self {
        Classification {
            category,
            confidence: 1.0,
            matched_signals: vec!["category_hint".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in ProblemCategory::ALL {
            assert_eq!(category.as_str().parse::<ProblemCategory>(), Ok(category));
        }
        assert_eq!(
            "Production-Planning".parse::<ProblemCategory>(),
            Ok(ProblemCategory::ProductionPlanning)
        );
        assert!("telescopes".parse::<ProblemCategory>().is_err());
    }

    #[test]
    fn test_unrecognised_category_deserializes_as_unknown() {
        let category: ProblemCategory = serde_json::from_str("\"scheduling\"").unwrap();
        assert_eq!(category, ProblemCategory::Unknown);
    }

    #[test]
    fn test_hint_lookup_ignores_case_and_blank_values() {
        let mut hints = BTreeMap::new();
        hints.insert("Industry".to_string(), "automotive".to_string());
        hints.insert("lines".to_string(), "  ".to_string());
        let desc = ProblemDescription::with_hints("text", hints);

        assert_eq!(desc.hint("industry"), Some("automotive"));
        assert_eq!(desc.hint("lines"), None);
        assert_eq!(desc.hint("missing"), None);
    }
}
