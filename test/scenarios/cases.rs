//! Scenario Definitions
//!
//! Each case is a request plus what the language model would answer and what
//! the assembler must produce.

use dcision::{FailureReason, ProblemCategory, Provenance};

/// What a scenario must end in
#[derive(Debug, Clone, Copy)]
pub enum Expect {
    /// A conformant model
    Model {
        category: ProblemCategory,
        provenance: Provenance,
        /// Variables carrying the category's role
        role_variables: usize,
        constraints: usize,
    },
    /// A failure report with this reason
    Failure(FailureReason),
}

/// A single end-to-end request
#[derive(Debug, Clone)]
pub struct ScenarioCase {
    pub name: &'static str,
    pub text: &'static str,
    pub hints: &'static [(&'static str, &'static str)],
    pub category_hint: Option<&'static str>,
    /// Scripted language-model replies; `None` means no model is configured
    pub replies: Option<&'static [&'static str]>,
    /// Language-model calls the request must make
    pub expected_calls: usize,
    pub expect: Expect,
}

pub const GENERIC_REPLY: &str = r#"{"variables": [{"name": "slot_a", "role": "pointing"}, {"name": "slot_b", "role": "pointing"}],
    "objective": {"direction": "maximize", "terms": [{"coefficient": 3, "variable": "slot_a"}, {"coefficient": 2, "variable": "slot_b"}]},
    "constraints": [{"name": "night_hours", "terms": [{"coefficient": 1, "variable": "slot_a"}, {"coefficient": 1, "variable": "slot_b"}], "relation": "<=", "rhs": 8}]}"#;

pub const CHATTY_REPLY: &str = r#"Here is the model you asked for:

```json
{"variables": [{"name": "slot_a", "role": "pointing"}],
 "objective": {"direction": "maximize", "terms": [{"coefficient": 1, "variable": "slot_a"}]},
 "constraints": [{"name": "night_hours", "terms": [{"coefficient": 1, "variable": "slot_a"}], "relation": "<=", "rhs": 8}]}
```

Let me know if you need anything else."#;

pub const MALFORMED_REPLY: &str =
    "I would point the telescope at the brightest targets first and then fill gaps.";

pub const SCENARIOS: &[ScenarioCase] = &[
    ScenarioCase {
        name: "production_three_lines",
        text: "We run 3 production lines producing 20, 30 and 25 units/hour. \
               Operating costs are $50, $60 and $55 per hour. \
               We must meet monthly demand of 500 units.",
        hints: &[],
        category_hint: Some("production_planning"),
        replies: Some(&[]),
        expected_calls: 0,
        expect: Expect::Model {
            category: ProblemCategory::ProductionPlanning,
            provenance: Provenance::Deterministic,
            role_variables: 3,
            constraints: 1,
        },
    },
    ScenarioCase {
        name: "production_two_products_by_hint",
        text: "A plant with 2 production lines must cover its orders at least cost.",
        hints: &[
            ("rates_bolts", "10, 12"),
            ("rates_nuts", "30, 25"),
            ("demand", "bolts=400, nuts=900"),
        ],
        category_hint: None,
        replies: None,
        expected_calls: 0,
        expect: Expect::Model {
            category: ProblemCategory::ProductionPlanning,
            provenance: Provenance::Deterministic,
            role_variables: 2,
            constraints: 2,
        },
    },
    ScenarioCase {
        name: "staffing_three_shifts",
        text: "Roster nurses: we need 4 nurses for the morning shift, 3 nurses for the evening shift \
               and 2 nurses for the night shift. Each nurse costs $200 per shift and 12 nurses are available.",
        hints: &[],
        category_hint: None,
        replies: None,
        expected_calls: 0,
        expect: Expect::Model {
            category: ProblemCategory::Staffing,
            provenance: Provenance::Deterministic,
            role_variables: 3,
            constraints: 4,
        },
    },
    ScenarioCase {
        name: "portfolio_capped",
        text: "Allocate a budget of $1 million. Stocks return 8%, bonds return 4% and real estate \
               returns 6%, with at most 50% in any single asset.",
        hints: &[],
        category_hint: None,
        replies: None,
        expected_calls: 0,
        expect: Expect::Model {
            category: ProblemCategory::PortfolioAllocation,
            provenance: Provenance::Deterministic,
            role_variables: 3,
            constraints: 1,
        },
    },
    ScenarioCase {
        name: "unknown_category_generates",
        text: "optimize telescope pointing schedule",
        hints: &[],
        category_hint: None,
        replies: Some(&[GENERIC_REPLY]),
        expected_calls: 1,
        expect: Expect::Model {
            category: ProblemCategory::Unknown,
            provenance: Provenance::Generative,
            role_variables: 0,
            constraints: 1,
        },
    },
    ScenarioCase {
        name: "unknown_category_chatty_reply",
        text: "optimize telescope pointing schedule",
        hints: &[],
        category_hint: None,
        replies: Some(&[CHATTY_REPLY]),
        expected_calls: 1,
        expect: Expect::Model {
            category: ProblemCategory::Unknown,
            provenance: Provenance::Generative,
            role_variables: 0,
            constraints: 1,
        },
    },
    ScenarioCase {
        name: "malformed_then_repaired",
        text: "optimize telescope pointing schedule",
        hints: &[],
        category_hint: None,
        replies: Some(&[MALFORMED_REPLY, GENERIC_REPLY]),
        expected_calls: 2,
        expect: Expect::Model {
            category: ProblemCategory::Unknown,
            provenance: Provenance::GenerativeRepaired,
            role_variables: 0,
            constraints: 1,
        },
    },
    ScenarioCase {
        name: "malformed_twice",
        text: "optimize telescope pointing schedule",
        hints: &[],
        category_hint: None,
        replies: Some(&[MALFORMED_REPLY, MALFORMED_REPLY]),
        expected_calls: 2,
        expect: Expect::Failure(FailureReason::UnresolvableModel),
    },
    ScenarioCase {
        name: "no_language_model",
        text: "optimize telescope pointing schedule",
        hints: &[],
        category_hint: None,
        replies: None,
        expected_calls: 0,
        expect: Expect::Failure(FailureReason::GenerationUnavailable),
    },
    ScenarioCase {
        name: "conflicting_shift_requirement",
        text: "We need 2 guards for the night shift. The night shift requires 3.",
        hints: &[],
        category_hint: None,
        replies: Some(&[GENERIC_REPLY]),
        expected_calls: 0,
        expect: Expect::Failure(FailureReason::ExtractionAmbiguous),
    },
];

/// Look up a scenario by name
pub fn scenario(name: &str) -> Option<&'static ScenarioCase> {
    SCENARIOS.iter().find(|s| s.name == name)
}
