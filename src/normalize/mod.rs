//! Response Normalizer
//!
//! Best-effort extraction of a [`StructuredModel`] from noisy language-model
//! output. Strategies run in a fixed order and the first one that yields every
//! required field and a well-typed model wins:
//!
//! 1. `StrictParse`: the whole text is one JSON document
//! 2. `EmbeddedFragment`: the largest balanced `{...}` fragment that parses
//! 3. `FieldExtraction`: each expected field located on its own
//!    (`"objective": {...}` anywhere in prose) and its JSON value parsed
//!
//! Fields the response leaves out are filled in: category from the expected
//! shape, complexity by estimate, provenance `generative`. A known expected
//! category always wins over the category the response claims.

pub mod fragment;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{
    estimate_complexity, Complexity, ConstraintSpec, ObjectiveSpec, ProblemCategory, Provenance,
    StructuredModel, VariableSpec,
};
use crate::recipe::ExpectedShape;

/// Optional top-level fields located by field extraction besides the required ones
const OPTIONAL_FIELDS: [&str; 5] = [
    "category",
    "model_type",
    "problem_type",
    "complexity",
    "provenance",
];

/// Keys a model is sometimes wrapped under
const ENVELOPES: [&str; 4] = ["model", "structured_model", "result", "data"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    StrictParse,
    EmbeddedFragment,
    FieldExtraction,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::StrictParse,
        Strategy::EmbeddedFragment,
        Strategy::FieldExtraction,
    ];
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::StrictParse => write!(f, "strict-parse"),
            Strategy::EmbeddedFragment => write!(f, "embedded-fragment"),
            Strategy::FieldExtraction => write!(f, "field-extraction"),
        }
    }
}

/// No strategy produced a usable model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("could not normalize response (missing fields: [{}])", .missing.join(", "))]
pub struct NormalizationFailure {
    /// Required fields still missing after the most complete attempt
    pub missing: Vec<String>,
    /// One note per strategy explaining why it gave up
    pub notes: Vec<String>,
}

impl NormalizationFailure {
    /// Lines suitable for a repair prompt
    pub fn reasons(&self) -> Vec<String> {
        let mut reasons: Vec<String> = self
            .missing
            .iter()
            .map(|f| format!("Response is missing required field '{}'", f))
            .collect();
        if reasons.is_empty() {
            reasons.extend(self.notes.iter().cloned());
        }
        reasons
    }
}

/// A successfully normalized model and the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub model: StructuredModel,
    pub strategy: Strategy,
}

/// Loosely-typed intermediate: everything but the three required fields is optional
#[derive(Deserialize)]
struct ModelDraft {
    #[serde(default, alias = "model_type", alias = "problem_type")]
    category: Option<ProblemCategory>,
    variables: Vec<VariableSpec>,
    objective: ObjectiveSpec,
    constraints: Vec<ConstraintSpec>,
    #[serde(default)]
    complexity: Option<Complexity>,
    #[serde(default)]
    provenance: Option<Provenance>,
}

impl ModelDraft {
    fn complete(self, shape: &ExpectedShape) -> StructuredModel {
        let category = match self.category {
            Some(c) if c.is_known() && !shape.category.is_known() => c,
            _ => shape.category,
        };
        let complexity = self
            .complexity
            .unwrap_or_else(|| estimate_complexity(&self.variables, &self.constraints));
        StructuredModel {
            category,
            variables: self.variables,
            objective: self.objective,
            constraints: self.constraints,
            complexity,
            provenance: self.provenance.unwrap_or(Provenance::Generative),
        }
    }
}

/// Why one attempt failed
enum Attempt {
    /// Nothing object-shaped to work with
    NotFound(String),
    /// An object, but without some required fields
    Missing(Vec<String>),
    /// Every required field present, but not well-typed
    Invalid(String),
}

/// Ordered-strategy normalizer
#[derive(Debug, Clone)]
pub struct Normalizer {
    strategies: Vec<Strategy>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer {
            strategies: Strategy::ALL.to_vec(),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict or reorder strategies
    pub fn with_strategies(strategies: Vec<Strategy>) -> Self {
        Normalizer { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn normalize(
        &self,
        raw: &str,
        shape: &ExpectedShape,
    ) -> Result<Normalized, NormalizationFailure> {
        let mut notes = Vec::new();
        let mut missing: Option<Vec<String>> = None;

        for &strategy in &self.strategies {
            let attempt = match strategy {
                Strategy::StrictParse => strict_parse(raw, shape),
                Strategy::EmbeddedFragment => embedded_fragment(raw, shape),
                Strategy::FieldExtraction => field_extraction(raw, shape),
            };
            match attempt {
                Ok(model) => {
                    debug!(%strategy, "normalized response");
                    return Ok(Normalized { model, strategy });
                }
                Err(Attempt::NotFound(reason)) => {
                    notes.push(format!("{}: {}", strategy, reason));
                }
                Err(Attempt::Missing(fields)) => {
                    notes.push(format!("{}: missing [{}]", strategy, fields.join(", ")));
                    if missing.as_ref().map_or(true, |m| fields.len() < m.len()) {
                        missing = Some(fields);
                    }
                }
                Err(Attempt::Invalid(reason)) => {
                    notes.push(format!("{}: {}", strategy, reason));
                    missing = Some(Vec::new());
                }
            }
        }

        debug!(?notes, "normalization failed");
        Err(NormalizationFailure {
            missing: missing.unwrap_or_else(|| shape.required_fields.clone()),
            notes,
        })
    }
}

fn missing_fields(object: &Map<String, Value>, shape: &ExpectedShape) -> Vec<String> {
    shape
        .required_fields
        .iter()
        .filter(|f| !object.contains_key(f.as_str()))
        .cloned()
        .collect()
}

/// Unwrap `{"model": {...}}` style envelopes
fn unwrap_envelope(value: Value, shape: &ExpectedShape) -> Value {
    let Some(object) = value.as_object() else {
        return value;
    };
    if missing_fields(object, shape).is_empty() {
        return value;
    }
    for key in ENVELOPES {
        if let Some(inner) = object.get(key) {
            if inner
                .as_object()
                .is_some_and(|o| missing_fields(o, shape).is_empty())
            {
                return inner.clone();
            }
        }
    }
    value
}

fn from_value(value: Value, shape: &ExpectedShape) -> Result<StructuredModel, Attempt> {
    let value = unwrap_envelope(value, shape);
    let Value::Object(object) = &value else {
        return Err(Attempt::NotFound("top-level value is not an object".to_string()));
    };
    let missing = missing_fields(object, shape);
    if !missing.is_empty() {
        return Err(Attempt::Missing(missing));
    }
    serde_json::from_value::<ModelDraft>(value)
        .map(|draft| draft.complete(shape))
        .map_err(|e| Attempt::Invalid(e.to_string()))
}

fn strict_parse(raw: &str, shape: &ExpectedShape) -> Result<StructuredModel, Attempt> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| Attempt::NotFound(format!("not JSON: {}", e)))?;
    from_value(value, shape)
}

fn embedded_fragment(raw: &str, shape: &ExpectedShape) -> Result<StructuredModel, Attempt> {
    let mut best: Option<Attempt> = None;
    for candidate in fragment::object_fragments(raw) {
        let Ok(value) = serde_json::from_str::<Value>(candidate) else {
            continue;
        };
        match from_value(value, shape) {
            Ok(model) => return Ok(model),
            Err(Attempt::Missing(fields)) => {
                let better = match &best {
                    Some(Attempt::Missing(prev)) => fields.len() < prev.len(),
                    Some(Attempt::Invalid(_)) => false,
                    _ => true,
                };
                if better {
                    best = Some(Attempt::Missing(fields));
                }
            }
            Err(Attempt::Invalid(reason)) => {
                if !matches!(best, Some(Attempt::Invalid(_))) {
                    best = Some(Attempt::Invalid(reason));
                }
            }
            Err(Attempt::NotFound(_)) => {}
        }
    }
    Err(best.unwrap_or_else(|| Attempt::NotFound("no JSON object fragment found".to_string())))
}

/// The first JSON value following `"field":` (or `field =`) anywhere in the text
fn locate_field(raw: &str, field: &str) -> Option<Value> {
    let pattern = format!(r#"(?i)"?\b{}\b"?\s*[:=]\s*"#, regex::escape(field));
    let re = regex::Regex::new(&pattern).ok()?;
    // bound first so the match iterator's borrow of `re` ends before `re` drops
    let found = re.find_iter(raw).find_map(|m| {
        serde_json::Deserializer::from_str(&raw[m.end()..])
            .into_iter::<Value>()
            .next()
            .and_then(Result::ok)
    });
    found
}

fn field_extraction(raw: &str, shape: &ExpectedShape) -> Result<StructuredModel, Attempt> {
    let mut object = Map::new();
    let fields = shape
        .required_fields
        .iter()
        .map(String::as_str)
        .chain(OPTIONAL_FIELDS);
    for field in fields {
        if object.contains_key(field) {
            continue;
        }
        if let Some(value) = locate_field(raw, field) {
            object.insert(field.to_string(), value);
        }
    }
    if object.contains_key("category") {
        object.remove("model_type");
        object.remove("problem_type");
    } else if object.contains_key("model_type") {
        object.remove("problem_type");
    }
    from_value(Value::Object(object), shape)
}
