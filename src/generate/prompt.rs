//! Instruction templates

use crate::model::{ProblemCategory, ProblemDescription};
use crate::recipe::ExpectedShape;

const LAYOUT: &str = r#"{
  "category": "<category>",
  "variables": [
    {"name": "x1", "role": "<role>", "domain": "continuous|integer|binary", "lower": 0, "upper": 100, "description": "..."}
  ],
  "objective": {"direction": "minimize|maximize", "terms": [{"coefficient": 1.0, "variable": "x1"}]},
  "constraints": [
    {"name": "c1", "terms": [{"coefficient": 1.0, "variable": "x1"}], "relation": "<=|>=|=", "rhs": 10, "description": "..."}
  ]
}"#;

fn category_guidance(category: ProblemCategory) -> &'static str {
    match category {
        ProblemCategory::ProductionPlanning => {
            "This is a production planning problem. Use one operating-time variable per \
             production line or resource (role \"operating_time\", lower bound 0). For every \
             product add a constraint summing rate * operating_time >= demand. Minimize \
             total operating cost."
        }
        ProblemCategory::Staffing => {
            "This is a staffing problem. Use one integer variable per shift (role \
             \"staff_count\", lower bound 0). For every shift add a constraint staff >= \
             required staff. Minimize total staffing cost."
        }
        ProblemCategory::PortfolioAllocation => {
            "This is a portfolio allocation problem. Use one allocation variable per asset \
             (role \"allocation\", lower bound 0). Add a constraint with relation \"=\" \
             making the allocations sum to the budget. Maximize expected return."
        }
        ProblemCategory::Unknown => {
            "Identify the decision variables, the objective and the constraints of this \
             optimization problem. Give every variable a short snake_case role tag."
        }
    }
}

fn hint_block(description: &ProblemDescription) -> String {
    if description.hints().is_empty() {
        return "None".to_string();
    }
    description
        .hints()
        .iter()
        .map(|(k, v)| format!("- {}: {}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

fn expectations(shape: &ExpectedShape) -> String {
    let mut lines = Vec::new();
    for role in &shape.variable_roles {
        lines.push(format!("- at least one variable with role \"{}\"", role));
    }
    for family in &shape.constraint_shapes {
        lines.push(format!(
            "- a \"{}\" constraint ({}) with relation \"{}\" over \"{}\" variables",
            family.name,
            family.description,
            family.relation.symbol(),
            family.role
        ));
    }
    if lines.is_empty() {
        "- every constraint and the objective reference only declared variables".to_string()
    } else {
        lines.join("\n")
    }
}

/// First-attempt instruction for a category
pub fn instruction(shape: &ExpectedShape, description: &ProblemDescription) -> String {
    format!(
        r#"You are an operations research modeling assistant. Turn the problem below into a linear or mixed-integer optimization model.

{guidance}

Problem:
{text}

Hints:
{hints}

The model must contain:
{expectations}

Respond with a single JSON object in exactly this layout (category "{category}"):
{layout}

Variable names must be unique. Only output JSON."#,
        guidance = category_guidance(shape.category),
        text = description.text(),
        hints = hint_block(description),
        expectations = expectations(shape),
        category = shape.category,
        layout = LAYOUT,
    )
}

/// Retry instruction listing what the previous answer got wrong
pub fn repair_prompt(
    shape: &ExpectedShape,
    description: &ProblemDescription,
    violations: &[String],
) -> String {
    let listed = violations
        .iter()
        .map(|v| format!("- {}", v))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{}\n\nYour previous answer was rejected for these reasons:\n{}\n\nFix every one of them and answer again.",
        instruction(shape, description),
        listed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{RecipeRegistry, StaffingRecipe};
    use crate::recipe::Recipe;
    use std::collections::BTreeMap;

    #[test]
    fn test_instruction_mentions_shape() {
        let recipe = StaffingRecipe::new();
        let prompt = instruction(recipe.shape(), &ProblemDescription::new("cover the night shift"));
        assert!(prompt.contains("staff_count"));
        assert!(prompt.contains("cover the night shift"));
        assert!(prompt.contains("\"staffing\""));
    }

    #[test]
    fn test_unknown_category_uses_generic_instruction() {
        let registry = RecipeRegistry::with_builtin();
        let shape = registry.shape_for(ProblemCategory::Unknown);
        let prompt = instruction(&shape, &ProblemDescription::new("point a telescope"));
        assert!(prompt.contains("Identify the decision variables"));
        assert!(prompt.contains("Hints:\nNone"));
    }

    #[test]
    fn test_hints_listed() {
        let mut hints = BTreeMap::new();
        hints.insert("industry".to_string(), "astronomy".to_string());
        let shape = ExpectedShape::generic(ProblemCategory::Unknown);
        let prompt = instruction(&shape, &ProblemDescription::with_hints("x", hints));
        assert!(prompt.contains("- industry: astronomy"));
    }

    #[test]
    fn test_repair_lists_violations_verbatim() {
        let shape = ExpectedShape::generic(ProblemCategory::Unknown);
        let prompt = repair_prompt(
            &shape,
            &ProblemDescription::new("x"),
            &["Duplicate variable name: 'a'".to_string()],
        );
        assert!(prompt.contains("- Duplicate variable name: 'a'"));
    }
}
