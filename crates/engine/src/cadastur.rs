//! Name matching against the Cadastur guide registry.
//!
//! Registry entries are typed by hand, so names are compared after removing
//! accents, punctuation and Portuguese connectives ("de", "da", ...). A
//! *loose* match accepts one name containing the other, one name's core tokens
//! all present in the other, or at least 60% token overlap.

use std::collections::HashSet;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

const STOP_WORDS: [&str; 6] = ["de", "da", "do", "dos", "das", "e"];

/// Minimum share of shared tokens (over the shorter name) for a loose match.
const MIN_OVERLAP_PERCENT: usize = 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameComparison {
    pub exact_match: bool,
    pub loose_match: bool,
    pub normalized_input: String,
    pub normalized_candidate: String,
}

/// Lowercases, strips diacritics and keeps only `a-z` words separated by a
/// single space.
#[must_use]
pub fn normalize_name(input: &str) -> String {
    let folded: String = input
        .trim_start_matches('\u{feff}')
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_ascii_lowercase() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn core_tokens<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    tokens
        .iter()
        .copied()
        .filter(|t| !STOP_WORDS.contains(t))
        .collect()
}

/// Loose comparison of two already normalized names.
#[must_use]
pub fn is_loose_match(input: &str, candidate: &str) -> bool {
    if input.is_empty() || candidate.is_empty() {
        return false;
    }
    if input == candidate || input.contains(candidate) || candidate.contains(input) {
        return true;
    }

    let input_tokens: Vec<&str> = input.split(' ').collect();
    let candidate_tokens: Vec<&str> = candidate.split(' ').collect();
    let input_set: HashSet<&str> = input_tokens.iter().copied().collect();
    let candidate_set: HashSet<&str> = candidate_tokens.iter().copied().collect();

    let candidate_core = core_tokens(&candidate_tokens);
    if !candidate_core.is_empty() && candidate_core.iter().all(|t| input_set.contains(t)) {
        return true;
    }
    let input_core = core_tokens(&input_tokens);
    if !input_core.is_empty() && input_core.iter().all(|t| candidate_set.contains(t)) {
        return true;
    }

    let overlap = candidate_tokens
        .iter()
        .filter(|t| input_set.contains(*t))
        .count();
    let shorter = input_tokens.len().min(candidate_tokens.len());
    overlap * 100 >= shorter * MIN_OVERLAP_PERCENT
}

/// Compares a name typed by a user with the one found in the registry.
#[must_use]
pub fn compare_names(input: &str, candidate: &str) -> NameComparison {
    let normalized_input = normalize_name(input);
    let normalized_candidate = normalize_name(candidate);
    NameComparison {
        exact_match: !normalized_input.is_empty() && normalized_input == normalized_candidate,
        loose_match: is_loose_match(&normalized_input, &normalized_candidate),
        normalized_input,
        normalized_candidate,
    }
}
