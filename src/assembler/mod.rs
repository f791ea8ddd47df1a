//! Model Assembler
//!
//! Orchestrates classification, the deterministic recipe path, the generative
//! fallback and conformance checking.
//!
//! ```text
//! Classified ──► DeterministicAttempt ──► Validated ──► Done
//!     │                 │ missing entity       │ violation: recipe-defect
//!     │                 ▼                      ▼
//!     └───────► GenerativeAttempt ──► Validated ──► Done
//!                 │ violation / unparsable
//!                 ▼
//!               one repair ──► Validated | Failed(unresolvable-model)
//! ```
//!
//! Requests share nothing mutable: the registry sits behind an `Arc` and the
//! only suspension point is the language-model call. Dropping a `build`
//! future abandons the pending completion and no partial model escapes.

pub mod report;

pub use report::{FailureReason, FailureReport, Stage};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::classify::{Classifier, SignalTable, DEFAULT_THRESHOLD};
use crate::conformance::ConformanceChecker;
use crate::generate::{GenerativeAdapter, LanguageModel, DEFAULT_TIMEOUT};
use crate::model::{
    Classification, ProblemCategory, ProblemDescription, Provenance, Source, StructuredModel,
};
use crate::normalize::Normalizer;
use crate::recipe::{ExpectedShape, ExtractionFailure, RecipeRegistry};

/// Generative attempts per request: the first try plus one repair
const MAX_GENERATIVE_ATTEMPTS: u8 = 2;

/// Which path a classification leads to
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// A registered recipe will build the model
    Deterministic {
        category: ProblemCategory,
        confidence: f32,
    },
    /// The language model will be asked
    Generative {
        category: ProblemCategory,
        reason: String,
    },
}

impl RouteDecision {
    pub fn is_deterministic(&self) -> bool {
        matches!(self, RouteDecision::Deterministic { .. })
    }
}

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Minimum classifier confidence for the deterministic path
    pub threshold: f32,
    /// Default timeout for one language-model call
    pub timeout: Duration,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        AssemblerConfig {
            threshold: DEFAULT_THRESHOLD,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// One model-building request
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub description: ProblemDescription,
    /// Overrides classification when it names a known category
    pub category_hint: Option<String>,
    /// Per-request language-model timeout
    pub timeout: Option<Duration>,
}

impl BuildRequest {
    pub fn new(text: impl Into<String>) -> Self {
        BuildRequest {
            description: ProblemDescription::new(text),
            category_hint: None,
            timeout: None,
        }
    }

    pub fn with_hints(text: impl Into<String>, hints: BTreeMap<String, String>) -> Self {
        BuildRequest {
            description: ProblemDescription::with_hints(text, hints),
            category_hint: None,
            timeout: None,
        }
    }

    pub fn category_hint(mut self, hint: impl Into<String>) -> Self {
        self.category_hint = Some(hint.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A conformant model and the path that produced it
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub model: StructuredModel,
    pub trail: Vec<Stage>,
}

/// Classify, build, validate
pub struct ModelAssembler {
    classifier: Classifier,
    registry: Arc<RecipeRegistry>,
    adapter: Option<GenerativeAdapter>,
    normalizer: Normalizer,
    config: AssemblerConfig,
}

impl ModelAssembler {
    /// `language_model = None` disables the generative path; requests that
    /// need it fail with `generation-unavailable`
    pub fn new(
        config: AssemblerConfig,
        registry: Arc<RecipeRegistry>,
        language_model: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        let adapter = language_model.map(|m| GenerativeAdapter::with_timeout(m, config.timeout));
        ModelAssembler {
            classifier: Classifier::new(SignalTable::builtin(), config.threshold),
            registry,
            adapter,
            normalizer: Normalizer::new(),
            config,
        }
    }

    /// Built-in recipes and default config
    pub fn with_defaults(language_model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self::new(
            AssemblerConfig::default(),
            Arc::new(RecipeRegistry::with_builtin()),
            language_model,
        )
    }

    /// Replace the signal table; the configured threshold is kept
    pub fn with_signal_table(mut self, table: SignalTable) -> Self {
        self.classifier = Classifier::new(table, self.config.threshold);
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn registry(&self) -> &RecipeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Decide deterministic vs generative for a classification
    pub fn route(&self, classification: &Classification) -> RouteDecision {
        let category = classification.category;
        if !category.is_known() {
            return RouteDecision::Generative {
                category,
                reason: "unknown category".to_string(),
            };
        }
        if classification.confidence < self.config.threshold {
            return RouteDecision::Generative {
                category,
                reason: format!(
                    "confidence {:.2} below threshold {:.2}",
                    classification.confidence, self.config.threshold
                ),
            };
        }
        if self.registry.lookup(category).is_none() {
            return RouteDecision::Generative {
                category,
                reason: format!("no recipe registered for {}", category),
            };
        }
        RouteDecision::Deterministic {
            category,
            confidence: classification.confidence,
        }
    }

    /// Classification, honouring a category hint that names a known category
    pub fn classify(
        &self,
        description: &ProblemDescription,
        category_hint: Option<&str>,
        trail: &mut Vec<Stage>,
    ) -> Classification {
        if let Some(hint) = category_hint.map(str::trim).filter(|h| !h.is_empty()) {
            match hint.parse::<ProblemCategory>() {
                Ok(category) if category.is_known() => {
                    trail.push(Stage::Classified {
                        category,
                        confidence: 1.0,
                        forced: true,
                    });
                    return Classification::forced(category);
                }
                _ => {
                    warn!(hint, "ignoring unrecognised category hint");
                    trail.push(Stage::CategoryHintIgnored {
                        hint: hint.to_string(),
                    });
                }
            }
        }

        let classification = self.classifier.classify(description);
        trail.push(Stage::Classified {
            category: classification.category,
            confidence: classification.confidence,
            forced: false,
        });
        if !classification.category.is_known() {
            trail.push(Stage::UnknownCategory);
        }
        classification
    }

    /// Build a model and report the path taken
    #[instrument(skip_all, fields(category_hint = ?request.category_hint))]
    pub async fn build(&self, request: &BuildRequest) -> Result<BuildOutcome, FailureReport> {
        let mut trail = Vec::new();
        let description = &request.description;

        let category_hint = request.category_hint.as_deref();
        let classification = self.classify(description, category_hint, &mut trail);
        let decision = self.route(&classification);
        info!(?decision, "routed request");

        let shape = self.registry.shape_for(classification.category);

        if let RouteDecision::Deterministic { category, .. } = decision {
            if let Some(recipe) = self.registry.lookup(category) {
                trail.push(Stage::DeterministicAttempt { category });
                match recipe.extract(description) {
                    Ok(partial) => {
                        let model = partial.into_model(category, Provenance::Deterministic);
                        return match ConformanceChecker::check(&model, &shape, Some(recipe)) {
                            Ok(()) => Ok(finish(model, trail)),
                            Err(violations) => {
                                error!(
                                    %category,
                                    ?violations,
                                    "registered recipe produced a non-conformant model"
                                );
                                trail.push(Stage::Rejected {
                                    violations: violations.len(),
                                });
                                Err(fail(
                                    FailureReason::RecipeDefect,
                                    format!(
                                        "the {} recipe produced a non-conformant model",
                                        category
                                    ),
                                    trail,
                                    violations.iter().map(|v| v.to_string()).collect(),
                                ))
                            }
                        };
                    }
                    Err(ambiguous @ ExtractionFailure::Ambiguous { .. }) => {
                        return Err(fail(
                            FailureReason::ExtractionAmbiguous,
                            ambiguous.to_string(),
                            trail,
                            Vec::new(),
                        ));
                    }
                    Err(missing) => {
                        info!(reason = %missing, "deterministic extraction failed, falling back");
                        trail.push(Stage::ExtractionFailed {
                            reason: missing.to_string(),
                        });
                    }
                }
            }
        }

        self.generate(description, &shape, request.timeout, trail).await
    }

    /// Caller-facing entry point
    pub async fn build_model(
        &self,
        text: &str,
        hints: BTreeMap<String, String>,
        category_hint: Option<&str>,
    ) -> Result<StructuredModel, FailureReport> {
        let mut request = BuildRequest::with_hints(text, hints);
        request.category_hint = category_hint.map(str::to_string);
        self.build(&request).await.map(|outcome| outcome.model)
    }

    async fn generate(
        &self,
        description: &ProblemDescription,
        shape: &ExpectedShape,
        timeout: Option<Duration>,
        mut trail: Vec<Stage>,
    ) -> Result<BuildOutcome, FailureReport> {
        let Some(adapter) = &self.adapter else {
            trail.push(Stage::GenerationFailed {
                error: "no language model configured".to_string(),
            });
            return Err(fail(
                FailureReason::GenerationUnavailable,
                "no language model configured".to_string(),
                trail,
                Vec::new(),
            ));
        };
        let recipe = self.registry.lookup(shape.category);
        let mut repair: Option<Vec<String>> = None;

        for attempt in 1..=MAX_GENERATIVE_ATTEMPTS {
            trail.push(Stage::GenerativeAttempt {
                attempt,
                repair: repair.is_some(),
            });

            let raw = match adapter.generate(shape, description, repair.as_deref(), timeout).await {
                Ok(raw) => raw,
                Err(e) => {
                    trail.push(Stage::GenerationFailed {
                        error: e.to_string(),
                    });
                    return Err(fail(
                        FailureReason::GenerationUnavailable,
                        e.to_string(),
                        trail,
                        Vec::new(),
                    ));
                }
            };

            let problems = match self.normalizer.normalize(&raw, shape) {
                Ok(normalized) => {
                    trail.push(Stage::Normalized {
                        strategy: normalized.strategy.to_string(),
                    });
                    let mut model = normalized.model;
                    model.stamp_source(Source::Generative);
                    model.provenance = if repair.is_some() {
                        Provenance::GenerativeRepaired
                    } else {
                        Provenance::Generative
                    };
                    let claimed;
                    let (expected, rules) = if model.category == shape.category {
                        (shape, recipe)
                    } else {
                        // unknown request, but the reply names a category: hold it to that shape
                        claimed = self.registry.shape_for(model.category);
                        (&claimed, self.registry.lookup(model.category))
                    };
                    match ConformanceChecker::check(&model, expected, rules) {
                        Ok(()) => return Ok(finish(model, trail)),
                        Err(violations) => {
                            trail.push(Stage::Rejected {
                                violations: violations.len(),
                            });
                            violations.iter().map(|v| v.to_string()).collect::<Vec<_>>()
                        }
                    }
                }
                Err(failure) => {
                    trail.push(Stage::NormalizationFailed {
                        missing: failure.missing.clone(),
                    });
                    failure.reasons()
                }
            };

            if attempt < MAX_GENERATIVE_ATTEMPTS {
                warn!(problems = ?problems, "generated model rejected, requesting repair");
            }
            repair = Some(problems);
        }

        Err(fail(
            FailureReason::UnresolvableModel,
            "generated model still non-conformant after repair".to_string(),
            trail,
            repair.unwrap_or_default(),
        ))
    }
}

fn finish(model: StructuredModel, mut trail: Vec<Stage>) -> BuildOutcome {
    trail.push(Stage::Validated);
    trail.push(Stage::Done {
        provenance: model.provenance,
    });
    info!(
        category = %model.category,
        provenance = %model.provenance,
        variables = model.variables.len(),
        constraints = model.constraints.len(),
        "model built"
    );
    BuildOutcome { model, trail }
}

fn fail(
    reason: FailureReason,
    message: String,
    mut trail: Vec<Stage>,
    violations: Vec<String>,
) -> FailureReport {
    trail.push(Stage::Failed { reason });
    debug!(%reason, %message, "request failed");
    FailureReport {
        reason,
        message,
        trail,
        violations,
    }
}
