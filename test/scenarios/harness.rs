//! Scenario Runner
//!
//! Runs a [`ScenarioCase`] through a fresh assembler and reports how the
//! outcome compares with the case's expectation.

use super::cases::{Expect, ScenarioCase};
use dcision::recipe::RecipeRegistry;
use dcision::{
    AssemblerConfig, BuildRequest, FailureReport, LanguageModel, ModelAssembler, ScriptedModel,
    StructuredModel,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Result of running one scenario
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub outcome: Result<StructuredModel, FailureReport>,
    #[allow(dead_code)]
    pub calls: usize,
    pub error: Option<String>,
}

/// Builds assemblers and drives them on a private runtime
pub struct ScenarioRunner {
    runtime: tokio::runtime::Runtime,
    timeout: Duration,
}

impl ScenarioRunner {
    pub fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("failed to build runtime");
        Self {
            runtime,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn request(case: &ScenarioCase) -> BuildRequest {
        let hints: BTreeMap<String, String> = case
            .hints
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut request = BuildRequest::with_hints(case.text, hints);
        request.category_hint = case.category_hint.map(str::to_string);
        request
    }

    /// Run any request against a given assembler
    pub fn build(
        &self,
        assembler: &ModelAssembler,
        request: &BuildRequest,
    ) -> Result<StructuredModel, FailureReport> {
        self.runtime
            .block_on(assembler.build(request))
            .map(|outcome| outcome.model)
    }

    /// Run a single scenario with its scripted language model
    pub fn run(&self, case: &ScenarioCase) -> ScenarioResult {
        let scripted = case
            .replies
            .map(|replies| {
                Arc::new(ScriptedModel::new(
                    replies.iter().map(|r| r.to_string()).collect(),
                ))
            });
        let model = scripted.clone().map(|m| m as Arc<dyn LanguageModel>);
        let config = AssemblerConfig {
            timeout: self.timeout,
            ..AssemblerConfig::default()
        };
        let assembler =
            ModelAssembler::new(config, Arc::new(RecipeRegistry::with_builtin()), model);

        let outcome = self.build(&assembler, &Self::request(case));
        let calls = scripted.as_ref().map(|m| m.calls()).unwrap_or(0);
        let error = check_expectation(case, &outcome, calls, assembler.registry());

        ScenarioResult {
            name: case.name.to_string(),
            passed: error.is_none(),
            outcome,
            calls,
            error,
        }
    }
}

fn check_expectation(
    case: &ScenarioCase,
    outcome: &Result<StructuredModel, FailureReport>,
    calls: usize,
    registry: &RecipeRegistry,
) -> Option<String> {
    if calls != case.expected_calls {
        return Some(format!(
            "expected {} language model calls, saw {}",
            case.expected_calls, calls
        ));
    }

    match (case.expect, outcome) {
        (
            Expect::Model {
                category,
                provenance,
                role_variables,
                constraints,
            },
            Ok(model),
        ) => {
            if model.category != category {
                return Some(format!("category {} != {}", model.category, category));
            }
            if model.provenance != provenance {
                return Some(format!("provenance {} != {}", model.provenance, provenance));
            }
            let shape = registry.shape_for(category);
            let with_role: usize = shape
                .variable_roles
                .iter()
                .map(|role| model.variables_with_role(role).count())
                .sum();
            if with_role != role_variables {
                return Some(format!("{} role variables, expected {}", with_role, role_variables));
            }
            if model.constraints.len() != constraints {
                return Some(format!(
                    "{} constraints, expected {}",
                    model.constraints.len(),
                    constraints
                ));
            }
            structural_problem(model)
        }
        (Expect::Failure(reason), Err(report)) if report.reason == reason => None,
        (Expect::Failure(reason), Err(report)) => {
            Some(format!("failed with {} instead of {}", report.reason, reason))
        }
        (Expect::Failure(reason), Ok(model)) => Some(format!(
            "expected {} but built a {} model",
            reason, model.category
        )),
        (Expect::Model { .. }, Err(report)) => Some(format!("unexpected failure: {}", report)),
    }
}

/// Unique variable names and no reference to an undeclared variable
pub fn structural_problem(model: &StructuredModel) -> Option<String> {
    let mut seen = HashSet::new();
    for v in &model.variables {
        if !seen.insert(v.name.as_str()) {
            return Some(format!("duplicate variable '{}'", v.name));
        }
    }
    let referenced = model
        .objective
        .terms
        .iter()
        .map(|t| t.variable.as_str())
        .chain(model.constraints.iter().flat_map(|c| c.variables()));
    for name in referenced {
        if !seen.contains(name) {
            return Some(format!("dangling reference to '{}'", name));
        }
    }
    None
}
