//! Verdict aggregation
//!
//! Combines the per-claim outcomes for one input text into a single result.
//! The first extracted claim is primary: its verdict, confidence, reasoning
//! and key evidence become the aggregate. The remaining claims are reported
//! in `per_claim_results` but do not vote.

use serde::{Deserialize, Serialize};

use crate::document::Entity;
use crate::search::RetrievalCandidate;
use crate::verifier::{Confidence, SemanticMatches, VerificationOutcome, Verdict};

pub const NO_CLAIMS_REASONING: &str =
    "No verifiable factual claims could be extracted from the input.";
pub const NO_CLAIMS_ERROR: &str = "No factual claims detected";
pub const NO_REASONING: &str = "No reasoning provided";

/// Verification outcome for one extracted claim.
///
/// Outcome fields are optional so results assembled outside the engine can
/// omit them; the aggregator fills defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerClaimResult {
    pub claim_text: String,
    #[serde(default)]
    pub verdict: Option<Verdict>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub key_evidence: Option<Vec<String>>,
    #[serde(default)]
    pub retrieved_candidates: Vec<RetrievalCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_matches: Option<SemanticMatches>,
}

impl PerClaimResult {
    pub fn from_outcome(
        claim_text: impl Into<String>,
        outcome: VerificationOutcome,
        retrieved_candidates: Vec<RetrievalCandidate>,
    ) -> Self {
        Self {
            claim_text: claim_text.into(),
            verdict: Some(outcome.verdict),
            confidence: Some(outcome.confidence),
            reasoning: Some(outcome.reasoning),
            key_evidence: Some(outcome.key_evidence),
            retrieved_candidates,
            semantic_matches: outcome.semantic_matches,
        }
    }
}

/// Final result of checking one input text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub original_text: String,
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub reasoning: String,
    pub key_evidence: Vec<String>,
    pub claims_analyzed: Vec<String>,
    pub per_claim_results: Vec<PerClaimResult>,
    pub entities_found: Vec<Entity>,
    pub retrieved_facts_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Folds per-claim results into an [`AggregatedResult`]
#[derive(Debug, Clone, Copy, Default)]
pub struct VerdictAggregator;

impl VerdictAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate results listed in claim-extraction order.
    ///
    /// An empty `per_claim_results` is the no-claims outcome: `UNVERIFIABLE`
    /// with `low` confidence, not an error.
    pub fn aggregate(
        &self,
        original_text: &str,
        per_claim_results: Vec<PerClaimResult>,
        entities: Vec<Entity>,
    ) -> AggregatedResult {
        let Some(primary) = per_claim_results.first() else {
            return AggregatedResult {
                original_text: original_text.to_string(),
                verdict: Verdict::Unverifiable,
                confidence: Confidence::Low,
                reasoning: NO_CLAIMS_REASONING.to_string(),
                key_evidence: Vec::new(),
                claims_analyzed: Vec::new(),
                per_claim_results: Vec::new(),
                entities_found: entities,
                retrieved_facts_count: 0,
                error: Some(NO_CLAIMS_ERROR.to_string()),
            };
        };

        let verdict = primary.verdict.unwrap_or(Verdict::Unverifiable);
        let confidence = primary.confidence.unwrap_or(Confidence::Low);
        let reasoning = primary
            .reasoning
            .clone()
            .unwrap_or_else(|| NO_REASONING.to_string());
        let key_evidence = primary.key_evidence.clone().unwrap_or_default();
        let retrieved_facts_count = primary.retrieved_candidates.len();

        let claims_analyzed = per_claim_results
            .iter()
            .map(|result| result.claim_text.clone())
            .collect();

        AggregatedResult {
            original_text: original_text.to_string(),
            verdict,
            confidence,
            reasoning,
            key_evidence,
            claims_analyzed,
            per_claim_results,
            entities_found: entities,
            retrieved_facts_count,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(claim: &str, verdict: Verdict, candidates: usize) -> PerClaimResult {
        let outcome = VerificationOutcome::new(verdict, Confidence::High, format!("{} checked", claim))
            .with_evidence(vec![format!("evidence for {}", claim)]);
        let candidates = (0..candidates)
            .map(|i| RetrievalCandidate {
                document_id: i as u64 + 1,
                content: format!("doc {}", i),
                source: "Ministry of Steel".to_string(),
                similarity: 0.8,
            })
            .collect();
        PerClaimResult::from_outcome(claim, outcome, candidates)
    }

    #[test]
    fn test_no_claims_is_unverifiable() {
        let entities = vec![Entity {
            text: "Assam".to_string(),
            label: "GPE".to_string(),
        }];
        let aggregated = VerdictAggregator::new().aggregate("???", Vec::new(), entities.clone());

        assert_eq!(aggregated.verdict, Verdict::Unverifiable);
        assert_eq!(aggregated.confidence, Confidence::Low);
        assert_eq!(aggregated.reasoning, NO_CLAIMS_REASONING);
        assert!(aggregated.claims_analyzed.is_empty());
        assert!(aggregated.key_evidence.is_empty());
        assert_eq!(aggregated.retrieved_facts_count, 0);
        assert_eq!(aggregated.entities_found, entities);
        assert_eq!(aggregated.error.as_deref(), Some(NO_CLAIMS_ERROR));
    }

    #[test]
    fn test_first_claim_is_primary() {
        let aggregated = VerdictAggregator::new().aggregate(
            "input",
            vec![result("first", Verdict::True, 3), result("second", Verdict::False, 5)],
            Vec::new(),
        );

        assert_eq!(aggregated.verdict, Verdict::True);
        assert_eq!(aggregated.confidence, Confidence::High);
        assert_eq!(aggregated.reasoning, "first checked");
        assert_eq!(aggregated.key_evidence, vec!["evidence for first".to_string()]);
        assert_eq!(aggregated.claims_analyzed, vec!["first", "second"]);
        assert_eq!(aggregated.per_claim_results.len(), 2);
        assert_eq!(aggregated.per_claim_results[1].verdict, Some(Verdict::False));
        assert_eq!(aggregated.retrieved_facts_count, 3);
        assert!(aggregated.error.is_none());
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let sparse = PerClaimResult {
            claim_text: "bare claim".to_string(),
            ..Default::default()
        };
        let aggregated = VerdictAggregator::new().aggregate("bare claim", vec![sparse], Vec::new());

        assert_eq!(aggregated.verdict, Verdict::Unverifiable);
        assert_eq!(aggregated.confidence, Confidence::Low);
        assert_eq!(aggregated.reasoning, NO_REASONING);
        assert!(aggregated.key_evidence.is_empty());
        assert_eq!(aggregated.claims_analyzed, vec!["bare claim"]);
    }

    #[test]
    fn test_sparse_json_result_deserializes() {
        let parsed: PerClaimResult =
            serde_json::from_str(r#"{"claim_text": "x", "verdict": "LIKELY_FALSE"}"#).unwrap();
        assert_eq!(parsed.verdict, Some(Verdict::LikelyFalse));
        assert!(parsed.confidence.is_none());
        assert!(parsed.retrieved_candidates.is_empty());
    }
}
