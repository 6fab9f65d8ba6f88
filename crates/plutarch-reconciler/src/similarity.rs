//! Case-insensitive token-based string similarity

use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

/// Similarity of two mentions on a 0-100 scale
///
/// Token-set ratio: both strings are lowercased and split into word tokens,
/// then the shared tokens are compared against each side's full token list.
/// Word order and repeated words do not matter, and a mention whose tokens
/// are a subset of the other's scores 100.
///
/// # Examples
///
/// ```
/// use plutarch_reconciler::similarity;
///
/// assert_eq!(similarity("World Bank", "The World Bank Group"), 100);
/// assert_eq!(similarity("WHO", "who"), 100);
/// assert!(similarity("World Bank", "World Health Organization") < 85);
/// ```
pub fn similarity(a: &str, b: &str) -> u8 {
    let left = tokens(a);
    let right = tokens(b);

    if left.is_empty() || right.is_empty() {
        return if left == right { 100 } else { 0 };
    }

    let shared: Vec<&str> = left.intersection(&right).map(String::as_str).collect();
    let only_left: Vec<&str> = left.difference(&right).map(String::as_str).collect();
    let only_right: Vec<&str> = right.difference(&left).map(String::as_str).collect();

    let base = shared.join(" ");
    let with_left = join_parts(&base, &only_left);
    let with_right = join_parts(&base, &only_right);

    ratio(&base, &with_left)
        .max(ratio(&base, &with_right))
        .max(ratio(&with_left, &with_right))
}

fn tokens(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_parts(base: &str, rest: &[&str]) -> String {
    let rest = rest.join(" ");
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest,
        (_, true) => base.to_string(),
        _ => format!("{} {}", base, rest),
    }
}

fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (normalized_levenshtein(a, b) * 100.0).round() as u8
}
