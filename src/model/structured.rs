//! StructuredModel Definition
//!
//! The solver-ready mathematical program that both the deterministic recipe
//! path and the generative path produce.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::problem::ProblemCategory;

/// Value domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VarDomain {
    #[default]
    Continuous,
    Integer,
    Binary,
}

/// A decision variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Symbolic name, unique within a model
    pub name: String,

    /// Role tag from the owning recipe's vocabulary (e.g. "operating_time")
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub domain: VarDomain,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,

    #[serde(default)]
    pub description: String,
}

impl VariableSpec {
    /// Create a continuous, unbounded variable
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        VariableSpec {
            name: name.into(),
            role: role.into(),
            domain: VarDomain::Continuous,
            lower: None,
            upper: None,
            description: String::new(),
        }
    }

    pub fn with_domain(mut self, domain: VarDomain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// One `coefficient * variable` term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub coefficient: f64,
    pub variable: String,
}

impl Term {
    pub fn new(coefficient: f64, variable: impl Into<String>) -> Self {
        Term {
            coefficient,
            variable: variable.into(),
        }
    }
}

/// Relational operator of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "<=", alias = "le")]
    LessEq,
    #[serde(rename = ">=", alias = "ge")]
    GreaterEq,
    #[serde(rename = "=", alias = "==", alias = "eq")]
    Equal,
}

impl Relation {
    pub fn symbol(&self) -> &'static str {
        match self {
            Relation::LessEq => "<=",
            Relation::GreaterEq => ">=",
            Relation::Equal => "=",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Which path produced a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Deterministic,
    #[default]
    Generative,
}

/// A linear constraint `Σ terms <relation> rhs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    #[serde(default)]
    pub name: String,
    pub terms: Vec<Term>,
    pub relation: Relation,
    pub rhs: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: Source,
}

impl ConstraintSpec {
    pub fn new(
        name: impl Into<String>,
        terms: Vec<Term>,
        relation: Relation,
        rhs: f64,
        source: Source,
    ) -> Self {
        ConstraintSpec {
            name: name.into(),
            terms,
            relation,
            rhs,
            description: String::new(),
            source,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Names of the variables this constraint references
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.variable.as_str())
    }
}

/// Optimization direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "min")]
    Minimize,
    #[serde(alias = "max")]
    Maximize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    pub direction: Direction,
    pub terms: Vec<Term>,
}

impl ObjectiveSpec {
    pub fn minimize(terms: Vec<Term>) -> Self {
        ObjectiveSpec {
            direction: Direction::Minimize,
            terms,
        }
    }

    pub fn maximize(terms: Vec<Term>) -> Self {
        ObjectiveSpec {
            direction: Direction::Maximize,
            terms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Where a model's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Deterministic,
    Generative,
    GenerativeRepaired,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Deterministic => write!(f, "deterministic"),
            Provenance::Generative => write!(f, "generative"),
            Provenance::GenerativeRepaired => write!(f, "generative_repaired"),
        }
    }
}

/// Solver-ready mathematical program
///
/// Variable order is presentation order. The JSON form produced by
/// `serde_json::to_string` is exactly what the normalizer's strict parse
/// accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredModel {
    #[serde(alias = "model_type")]
    pub category: ProblemCategory,
    pub variables: Vec<VariableSpec>,
    pub objective: ObjectiveSpec,
    pub constraints: Vec<ConstraintSpec>,
    pub complexity: Complexity,
    pub provenance: Provenance,
}

impl StructuredModel {
    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Set of declared variable names
    pub fn variable_names(&self) -> HashSet<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Names of variables with the given role, in presentation order
    pub fn variables_with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a str> {
        self.variables
            .iter()
            .filter(move |v| v.role == role)
            .map(|v| v.name.as_str())
    }

    /// Mark every constraint as coming from `source`
    pub fn stamp_source(&mut self, source: Source) {
        for c in &mut self.constraints {
            c.source = source;
        }
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Estimate how hard a model is for a solver
pub fn estimate_complexity(
    variables: &[VariableSpec],
    constraints: &[ConstraintSpec],
) -> Complexity {
    let discrete = variables
        .iter()
        .any(|v| v.domain != VarDomain::Continuous);

    if variables.len() > 20 || constraints.len() > 20 {
        Complexity::High
    } else if variables.len() > 5 || constraints.len() > 5 || discrete {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}
