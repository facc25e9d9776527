//! Plain-text rendering of check and search results

use std::collections::BTreeSet;
use std::fmt::Write;
use std::time::Duration;

use factcheck_core::{AggregatedResult, RetrievalCandidate};

const RULE: &str = "============================================================";
const MAX_SOURCES: usize = 3;

/// Human-readable report for one checked input.
pub fn render_result(result: &AggregatedResult, elapsed: Option<Duration>) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Verdict:     {}", result.verdict);
    if let Some(elapsed) = elapsed {
        let _ = writeln!(out, "Processed:   {:.2}s", elapsed.as_secs_f64());
    }
    let _ = writeln!(out, "Confidence:  {}", result.confidence.as_str().to_uppercase());
    let _ = writeln!(out, "Claims:      {}", result.claims_analyzed.len());
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Reasoning:\n  {}", result.reasoning);

    if !result.key_evidence.is_empty() {
        let _ = writeln!(out, "Key evidence:");
        for evidence in &result.key_evidence {
            let _ = writeln!(out, "  - {}", evidence);
        }
    }

    if !result.entities_found.is_empty() {
        let entities: Vec<String> = result
            .entities_found
            .iter()
            .map(|e| format!("{} ({})", e.text, e.label))
            .collect();
        let _ = writeln!(out, "Entities:    {}", entities.join(", "));
    }

    let _ = writeln!(out, "Documents:   {}", result.retrieved_facts_count);
    let sources: BTreeSet<&str> = result
        .per_claim_results
        .iter()
        .flat_map(|claim| claim.retrieved_candidates.iter())
        .map(|candidate| candidate.source.as_str())
        .collect();
    if !sources.is_empty() {
        let shown: Vec<&str> = sources.into_iter().take(MAX_SOURCES).collect();
        let _ = writeln!(out, "Sources:     {}", shown.join(", "));
    }

    out
}

/// One line per candidate, most similar first.
pub fn render_candidates(candidates: &[RetrievalCandidate]) -> String {
    if candidates.is_empty() {
        return "No matching documents.\n".to_string();
    }

    let mut out = String::new();
    for (rank, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. [{:.3}] {} (#{})",
            rank + 1,
            candidate.similarity,
            candidate.source,
            candidate.document_id
        );
        let _ = writeln!(out, "    {}", preview(&candidate.content, 160));
    }
    out
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
