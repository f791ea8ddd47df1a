//! Diagnostic trail and failure reports

use serde::Serialize;
use thiserror::Error;

use crate::model::{ProblemCategory, Provenance};

/// Terminal failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// Transport failure or timeout talking to the language model
    GenerationUnavailable,
    /// Generative path still non-conformant after its one repair
    UnresolvableModel,
    /// A registered recipe produced a non-conformant model
    RecipeDefect,
    /// Deterministic extraction found competing values for one entity
    ExtractionAmbiguous,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureReason::GenerationUnavailable => "generation-unavailable",
            FailureReason::UnresolvableModel => "unresolvable-model",
            FailureReason::RecipeDefect => "recipe-defect",
            FailureReason::ExtractionAmbiguous => "extraction-ambiguous",
        };
        f.write_str(s)
    }
}

/// One step of a build, in the order it happened
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Classified {
        category: ProblemCategory,
        confidence: f32,
        forced: bool,
    },
    CategoryHintIgnored {
        hint: String,
    },
    UnknownCategory,
    DeterministicAttempt {
        category: ProblemCategory,
    },
    ExtractionFailed {
        reason: String,
    },
    GenerativeAttempt {
        attempt: u8,
        repair: bool,
    },
    GenerationFailed {
        error: String,
    },
    Normalized {
        strategy: String,
    },
    NormalizationFailed {
        missing: Vec<String>,
    },
    Rejected {
        violations: usize,
    },
    Validated,
    Done {
        provenance: Provenance,
    },
    Failed {
        reason: FailureReason,
    },
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Classified {
                category,
                confidence,
                forced,
            } => {
                if *forced {
                    write!(f, "classified as {} (category hint)", category)
                } else {
                    write!(f, "classified as {} ({:.2})", category, confidence)
                }
            }
            Stage::CategoryHintIgnored { hint } => {
                write!(f, "ignored unrecognised category hint '{}'", hint)
            }
            Stage::UnknownCategory => write!(f, "unknown category, using generative path"),
            Stage::DeterministicAttempt { category } => {
                write!(f, "deterministic extraction with the {} recipe", category)
            }
            Stage::ExtractionFailed { reason } => write!(f, "extraction failed: {}", reason),
            Stage::GenerativeAttempt { attempt, repair } => {
                if *repair {
                    write!(f, "generative attempt {} (repair)", attempt)
                } else {
                    write!(f, "generative attempt {}", attempt)
                }
            }
            Stage::GenerationFailed { error } => write!(f, "generation failed: {}", error),
            Stage::Normalized { strategy } => write!(f, "normalized via {}", strategy),
            Stage::NormalizationFailed { missing } => {
                write!(f, "normalization failed, missing [{}]", missing.join(", "))
            }
            Stage::Rejected { violations } => {
                write!(f, "conformance check rejected the model ({} violations)", violations)
            }
            Stage::Validated => write!(f, "conformance check passed"),
            Stage::Done { provenance } => write!(f, "done ({})", provenance),
            Stage::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Why a request produced no model
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{reason}: {message}")]
pub struct FailureReport {
    pub reason: FailureReason,
    pub message: String,
    /// Path taken up to the failure
    pub trail: Vec<Stage>,
    /// Last violation list, one line each (empty when not applicable)
    pub violations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_spelling() {
        assert_eq!(FailureReason::RecipeDefect.to_string(), "recipe-defect");
        assert_eq!(
            serde_json::to_string(&FailureReason::ExtractionAmbiguous).unwrap(),
            "\"extraction-ambiguous\""
        );
    }

    #[test]
    fn test_report_display() {
        let report = FailureReport {
            reason: FailureReason::GenerationUnavailable,
            message: "timed out".to_string(),
            trail: vec![Stage::UnknownCategory],
            violations: Vec::new(),
        };
        assert_eq!(report.to_string(), "generation-unavailable: timed out");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["trail"][0]["stage"], "unknown_category");
    }
}
