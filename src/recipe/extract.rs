//! Shared helpers for deterministic entity extraction

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::ExtractionFailure;
use crate::model::ProblemDescription;

lazy_static! {
    static ref NUMBER: Regex = Regex::new(
        r"(?i)^\$?\s*(\d[\d,]*(?:\.\d+)?|\.\d+)\s*(k|thousand|m|mm|million|b|bn|billion)?$"
    )
    .unwrap();
    static ref LIST_ITEM: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
}

const WORD_NUMBERS: [(&str, f64); 12] = [
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
    ("eleven", 11.0),
    ("twelve", 12.0),
];

/// Parse "1,500", "$2.5k", "1M", "seven" into a number
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    if let Some((_, n)) = WORD_NUMBERS.iter().find(|(w, _)| *w == lower) {
        return Some(*n);
    }

    let caps = NUMBER.captures(trimmed)?;
    let base: f64 = caps[1].replace(',', "").parse().ok()?;
    let scale = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(s) if s == "k" || s == "thousand" => 1e3,
        Some(s) if s == "m" || s == "mm" || s == "million" => 1e6,
        Some(s) if s == "b" || s == "bn" || s == "billion" => 1e9,
        _ => 1.0,
    };
    Some(base * scale)
}

/// Every number in a list such as "20, 30 and 25"
pub fn numbers_in(list: &str) -> Vec<f64> {
    LIST_ITEM
        .find_iter(list)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Turn a label into a variable-name fragment ("Line A" -> "line_a")
pub fn ident(label: &str) -> String {
    let mut out = String::new();
    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Split a list hint ("a, b; c") into trimmed items
pub fn hint_list(description: &ProblemDescription, key: &str) -> Option<Vec<String>> {
    let raw = description.hint(key)?;
    let items: Vec<String> = raw
        .split([',', ';', '|'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Parse a numeric list hint; an unparsable item makes the hint unusable
pub fn hint_numbers(
    description: &ProblemDescription,
    key: &str,
) -> Result<Option<Vec<f64>>, ExtractionFailure> {
    let Some(items) = hint_list(description, key) else {
        return Ok(None);
    };
    items
        .iter()
        .map(|item| {
            parse_number(item).ok_or_else(|| ExtractionFailure::MissingEntity {
                entity: format!("numeric value for hint '{}' (got '{}')", key, item),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Parse "name=value" pairs from a hint; a bare value gets `default_name`
pub fn hint_pairs(
    description: &ProblemDescription,
    key: &str,
    default_name: &str,
) -> Result<Option<Vec<(String, f64)>>, ExtractionFailure> {
    let Some(items) = hint_list(description, key) else {
        return Ok(None);
    };
    let mut pairs = Vec::new();
    for item in items {
        let (name, value) = match item.split_once(['=', ':']) {
            Some((n, v)) => (n.trim().to_string(), v.trim().to_string()),
            None => (default_name.to_string(), item.clone()),
        };
        let parsed = parse_number(&value).ok_or_else(|| ExtractionFailure::MissingEntity {
            entity: format!("numeric value for hint '{}' (got '{}')", key, item),
        })?;
        pairs.push((name, parsed));
    }
    Ok(Some(pairs))
}

/// Expand `values` to one per item: either exactly `n` values or a single
/// value broadcast to all `n`
pub fn broadcast(values: &[f64], n: usize, entity: &str) -> Result<Vec<f64>, ExtractionFailure> {
    match values.len() {
        0 => Err(ExtractionFailure::MissingEntity {
            entity: entity.to_string(),
        }),
        1 => Ok(vec![values[0]; n]),
        len if len == n => Ok(values.to_vec()),
        _ => Err(ExtractionFailure::Ambiguous {
            entity: format!("{} (expected 1 or {} values)", entity, n),
            candidates: values.iter().map(|v| v.to_string()).collect(),
        }),
    }
}

/// Collapse repeated mentions of one quantity; conflicting values are ambiguous
pub fn single_value(values: &[f64], entity: &str) -> Result<Option<f64>, ExtractionFailure> {
    let mut distinct: Vec<f64> = Vec::new();
    for v in values {
        if !distinct.iter().any(|d| (d - v).abs() < 1e-9) {
            distinct.push(*v);
        }
    }
    match distinct.len() {
        0 => Ok(None),
        1 => Ok(Some(distinct[0])),
        _ => Err(ExtractionFailure::Ambiguous {
            entity: entity.to_string(),
            candidates: distinct.iter().map(|v| v.to_string()).collect(),
        }),
    }
}

/// Merge keyed mentions ("night" -> 2, "night" -> 3) keeping first-seen order;
/// the same key with two different values is ambiguous
pub fn merge_keyed(
    entries: Vec<(String, f64)>,
    entity: &str,
) -> Result<Vec<(String, f64)>, ExtractionFailure> {
    let mut order: Vec<String> = Vec::new();
    let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (key, value) in entries {
        let id = ident(&key);
        if !values.contains_key(&id) {
            order.push(key.clone());
        }
        values.entry(id).or_default().push(value);
    }

    order
        .into_iter()
        .map(|key| {
            let id = ident(&key);
            let mentions = values.get(&id).map(Vec::as_slice).unwrap_or(&[]);
            let value = single_value(mentions, &format!("{} for '{}'", entity, key))?
                .ok_or_else(|| ExtractionFailure::MissingEntity {
                    entity: format!("{} for '{}'", entity, key),
                })?;
            Ok((key, value))
        })
        .collect()
}
