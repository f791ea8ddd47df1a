//! CPLEX-LP text rendering
//!
//! Solvers that read model files (CBC, GLPK, HiGHS, Gurobi) accept this
//! format, so it is the hand-off format for file-based solver integrations.

use std::fmt::Write;

use super::structured::{Direction, StructuredModel, Term, VarDomain};

fn write_terms(out: &mut String, terms: &[Term]) {
    if terms.is_empty() {
        out.push_str(" 0");
        return;
    }
    for (i, term) in terms.iter().enumerate() {
        let sign = if term.coefficient < 0.0 { "-" } else { "+" };
        let magnitude = term.coefficient.abs();
        if i == 0 && sign == "+" {
            let _ = write!(out, " {} {}", magnitude, term.variable);
        } else {
            let _ = write!(out, " {} {} {}", sign, magnitude, term.variable);
        }
    }
}

impl StructuredModel {
    /// Render the model in CPLEX-LP format. Names are written as they are, so
    /// only conformant models give a readable file.
    pub fn to_lp(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\\ category: {}", self.category);
        let _ = writeln!(out, "\\ provenance: {}", self.provenance);

        out.push_str(match self.objective.direction {
            Direction::Minimize => "Minimize\n",
            Direction::Maximize => "Maximize\n",
        });
        out.push_str(" obj:");
        write_terms(&mut out, &self.objective.terms);
        out.push('\n');

        out.push_str("Subject To\n");
        for (i, c) in self.constraints.iter().enumerate() {
            let name = if c.name.is_empty() {
                format!("c{}", i + 1)
            } else {
                c.name.clone()
            };
            let _ = write!(out, " {}:", name);
            write_terms(&mut out, &c.terms);
            let _ = writeln!(out, " {} {}", c.relation.symbol(), c.rhs);
        }

        out.push_str("Bounds\n");
        for v in &self.variables {
            if v.domain == VarDomain::Binary {
                continue;
            }
            match (v.lower, v.upper) {
                (Some(lo), Some(hi)) => {
                    let _ = writeln!(out, " {} <= {} <= {}", lo, v.name, hi);
                }
                (Some(lo), None) => {
                    let _ = writeln!(out, " {} >= {}", v.name, lo);
                }
                (None, Some(hi)) => {
                    let _ = writeln!(out, " -inf <= {} <= {}", v.name, hi);
                }
                (None, None) => {
                    let _ = writeln!(out, " {} free", v.name);
                }
            }
        }

        let integers: Vec<&str> = self
            .variables
            .iter()
            .filter(|v| v.domain == VarDomain::Integer)
            .map(|v| v.name.as_str())
            .collect();
        if !integers.is_empty() {
            let _ = writeln!(out, "General\n {}", integers.join(" "));
        }

        let binaries: Vec<&str> = self
            .variables
            .iter()
            .filter(|v| v.domain == VarDomain::Binary)
            .map(|v| v.name.as_str())
            .collect();
        if !binaries.is_empty() {
            let _ = writeln!(out, "Binary\n {}", binaries.join(" "));
        }

        out.push_str("End\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Complexity, ConstraintSpec, ObjectiveSpec, ProblemCategory, Provenance, Relation, Source,
        StructuredModel, Term, VarDomain, VariableSpec,
    };

    #[test]
    fn test_lp_rendering() {
        let model = StructuredModel {
            category: ProblemCategory::Staffing,
            variables: vec![
                VariableSpec::new("staff_day", "staff_count")
                    .with_domain(VarDomain::Integer)
                    .with_bounds(Some(0.0), None),
                VariableSpec::new("slack", "slack").with_bounds(None, Some(4.0)),
            ],
            objective: ObjectiveSpec::minimize(vec![
                Term::new(120.0, "staff_day"),
                Term::new(-1.5, "slack"),
            ]),
            constraints: vec![ConstraintSpec::new(
                "",
                vec![Term::new(1.0, "staff_day")],
                Relation::GreaterEq,
                5.0,
                Source::Deterministic,
            )],
            complexity: Complexity::Medium,
            provenance: Provenance::Deterministic,
        };

        let lp = model.to_lp();
        assert!(lp.contains("Minimize\n obj: 120 staff_day - 1.5 slack\n"));
        assert!(lp.contains(" c1: 1 staff_day >= 5\n"));
        assert!(lp.contains(" staff_day >= 0\n"));
        assert!(lp.contains(" -inf <= slack <= 4\n"));
        assert!(lp.contains("General\n staff_day\n"));
        assert!(lp.ends_with("End\n"));
    }
}
