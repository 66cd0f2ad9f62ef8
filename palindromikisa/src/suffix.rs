//! Filename suffixes derived from model options.
//!
//! `{"temperature": 0.3, "top_p": 0.9}` becomes `-t03-tp09`: every option
//! contributes a short abbreviation of its name followed by a compact
//! rendering of its value. Abbreviations are resolved over the whole set of
//! names so that two options never share one.

use std::collections::{BTreeMap, BTreeSet};

use crate::options::{OptionSet, OptionValue};

/// Generate the filename suffix for the given options, `""` if there are none
pub fn generate_suffix(options: &OptionSet) -> String {
    if options.is_empty() {
        return String::new();
    }

    let abbreviations = resolve_abbreviations(options.names());
    options
        .iter()
        .map(|(name, value)| format!("-{}{}", abbreviations[name], format_value(value)))
        .collect()
}

/// Render an option value as a filename-safe token. Path separators in
/// strings become `-`, as they do in model names.
pub fn format_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(b) => b.to_string(),
        OptionValue::Int(i) => i.to_string(),
        OptionValue::Float(f) => format_float(*f),
        OptionValue::Str(s) => s.replace('/', "-"),
    }
}

fn format_float(value: f64) -> String {
    let (sign, magnitude) = if value < 0.0 {
        ("-", -value)
    } else {
        ("", value)
    };

    let fixed = format!("{magnitude:.10}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    let digits = match trimmed.split_once('.') {
        Some(("0", fraction)) => format!("0{fraction}"),
        Some((whole, fraction)) => format!("{whole}{fraction}"),
        None => trimmed.to_string(),
    };

    format!("{sign}{digits}")
}

/// Assign each option name a unique short token.
///
/// The initial token is the first letter of every alphabetic part of the name
/// (`top_p` -> `tp`). On collisions the lexicographically first name keeps the
/// token and later names grow theirs, last part first (`top_prob` -> `tpr`).
pub fn resolve_abbreviations<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> BTreeMap<String, String> {
    let sorted: BTreeSet<&str> = names.into_iter().collect();

    let parts: BTreeMap<&str, Vec<&str>> = sorted
        .iter()
        .map(|name| (*name, split_parts(name)))
        .collect();

    let mut abbreviations: BTreeMap<String, String> = sorted
        .iter()
        .map(|name| (name.to_string(), initial_abbreviation(name, &parts[name])))
        .collect();

    // groups in order of their first (sorted) member
    let mut groups: Vec<(String, Vec<&str>)> = vec![];
    for name in &sorted {
        let abbrev = &abbreviations[*name];
        match groups.iter_mut().find(|(a, _)| a == abbrev) {
            Some((_, members)) => members.push(*name),
            None => groups.push((abbrev.clone(), vec![*name])),
        }
    }

    for (abbrev, members) in groups {
        // an empty token is never acceptable, so nobody keeps it
        let keep = if abbrev.is_empty() { 0 } else { 1 };
        for name in members.into_iter().skip(keep) {
            let used: BTreeSet<&str> = abbreviations.values().map(String::as_str).collect();
            let expanded = expand_abbreviation(&parts[name], &abbrev, &used);
            abbreviations.insert(name.to_string(), expanded);
        }
    }

    abbreviations
}

/// Alphabetic runs of the name; anything else separates them
fn split_parts(name: &str) -> Vec<&str> {
    name.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|p| !p.is_empty())
        .collect()
}

fn initial_abbreviation(name: &str, parts: &[&str]) -> String {
    if parts.is_empty() {
        name.chars().next().map(String::from).unwrap_or_default()
    } else {
        parts.iter().filter_map(|p| p.chars().next()).collect()
    }
}

fn expand_abbreviation(parts: &[&str], current: &str, used: &BTreeSet<&str>) -> String {
    if parts.is_empty() {
        return numbered(current, 1, used);
    }

    // parts are ASCII, so byte prefixes are character prefixes
    let mut taken = vec![1; parts.len()];
    loop {
        let mut grew = false;
        for idx in (0..parts.len()).rev() {
            if taken[idx] < parts[idx].len() {
                taken[idx] += 1;
                grew = true;
                let candidate: String = parts
                    .iter()
                    .zip(&taken)
                    .map(|(part, &n)| &part[..n])
                    .collect();
                if !used.contains(candidate.as_str()) {
                    return candidate;
                }
            }
        }
        if !grew {
            break;
        }
    }

    numbered(current, 2, used)
}

fn numbered(base: &str, start: usize, used: &BTreeSet<&str>) -> String {
    (start..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !used.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}
