use crate::predict::PathStep;
use crate::record::Value;

/// Render a decision path as a one-line justification.
///
/// Uses the deepest attribute test on the path, e.g.
/// `"accept because ipk > 3.35"` or `"reject because penghasilan = tinggi"`.
/// A path with no attribute test (the tree is a single leaf) yields
/// `"<decision> by majority rule"`.
#[must_use]
pub fn explain(path: &[PathStep]) -> String {
    let decision = path.iter().rev().find_map(|step| match step {
        PathStep::Decision { decision } => Some(decision.as_str()),
        PathStep::Test { .. } => None,
    });
    let last_test = path.iter().rev().find_map(|step| match step {
        PathStep::Test {
            attribute,
            value,
            threshold,
        } => Some((attribute, value.as_ref(), *threshold)),
        PathStep::Decision { .. } => None,
    });

    let decision = decision.unwrap_or("undecided");
    match last_test {
        None => format!("{decision} by majority rule"),
        Some((attribute, value, threshold)) => {
            format!("{decision} because {attribute} {}", condition(value, threshold))
        }
    }
}

fn condition(value: Option<&Value>, threshold: Option<f64>) -> String {
    let Some(value) = value else {
        return "is missing".to_string();
    };
    match (threshold, value.as_number()) {
        (Some(t), Some(x)) if x <= t => format!("<= {t}"),
        (Some(t), Some(_)) => format!("> {t}"),
        _ => format!("= {value}"),
    }
}
