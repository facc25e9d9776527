//! Query expansion hints for press-release vocabulary
//!
//! Claims are written in everyday language while the corpus uses formal
//! government wording. These expansions are surfaced to callers as hints; they
//! never influence ranking.

use std::collections::BTreeSet;

/// (trigger keywords, expansion terms)
const EXPANSIONS: &[(&[&str], &[&str])] = &[
    (
        &["railway", "train"],
        &["railways", "locomotive", "heritage", "tourism"],
    ),
    (
        &["rural", "development"],
        &["rural development", "drinking water", "sanitation", "funds"],
    ),
    (&["steel"], &["steel plant", "investment", "crore", "upgradation"]),
    (
        &["fund", "money", "rs."],
        &["allocation", "released", "lakh", "crore"],
    ),
];

/// Expanded query terms for `claim`, de-duplicated and sorted.
pub fn expand_query_terms(claim: &str) -> Vec<String> {
    let lowered = claim.to_lowercase();

    EXPANSIONS
        .iter()
        .filter(|(triggers, _)| triggers.iter().any(|t| lowered.contains(t)))
        .flat_map(|(_, terms)| terms.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
