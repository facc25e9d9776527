//! Reasoning service client
//!
//! [`LlmVerifier`] sends a claim and its evidence to an OpenAI-compatible chat
//! completion endpoint and parses the JSON verdict out of the reply.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{FactCheckConfig, LlmConfig};
use crate::error::{FactCheckError, Result};
use crate::search::RetrievalCandidate;
use crate::verifier::{
    ClaimVerifier, Confidence, SemanticMatches, VerificationOutcome, Verdict, VerifierError,
};

const NO_EVIDENCE: &str = "No closely matching documents found.";

/// Chat-completion backed [`ClaimVerifier`]
pub struct LlmVerifier {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: String,
    max_content_length: usize,
    timeout: Duration,
}

impl LlmVerifier {
    pub fn new(config: LlmConfig, max_content_length: usize, timeout: Duration) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            FactCheckError::Config("LLM_API_KEY (or GROQ_API_KEY) is not set".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FactCheckError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key,
            max_content_length,
            timeout,
        })
    }

    pub fn from_config(config: &FactCheckConfig) -> Result<Self> {
        Self::new(
            config.llm.clone(),
            config.max_content_length,
            config.verifier_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: String) -> std::result::Result<String, VerifierError> {
        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "top_p": self.config.top_p,
        });

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VerifierError::Timeout(self.timeout)
                } else {
                    VerifierError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VerifierError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| VerifierError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| VerifierError::Parse("response contained no choices".to_string()))
    }
}

#[async_trait]
impl ClaimVerifier for LlmVerifier {
    async fn verify(
        &self,
        claim: &str,
        candidates: &[RetrievalCandidate],
    ) -> std::result::Result<VerificationOutcome, VerifierError> {
        tracing::debug!(
            "Verifying claim against {} documents: {}",
            candidates.len(),
            claim
        );

        let prompt = build_prompt(claim, candidates, self.max_content_length);
        let reply = self.complete(prompt).await?;

        tracing::debug!("Model reply: {}", truncate_chars(&reply, 200));

        let outcome = parse_response(&reply);
        tracing::info!("Verdict: {} (confidence: {})", outcome.verdict, outcome.confidence);
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "llm"
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Render the verification prompt for `claim` and its evidence.
pub fn build_prompt(
    claim: &str,
    candidates: &[RetrievalCandidate],
    max_content_length: usize,
) -> String {
    let mut evidence = String::from("## RELEVANT GOVERNMENT DOCUMENTS:\n");
    if candidates.is_empty() {
        evidence.push_str(NO_EVIDENCE);
        evidence.push('\n');
    } else {
        evidence.push('\n');
        for (i, candidate) in candidates.iter().enumerate() {
            evidence.push_str(&format!(
                "**Document {}** (Similarity: {:.3})\n**Source**: {}\n**Content**: {}\n\n",
                i + 1,
                candidate.similarity,
                candidate.source,
                truncate_chars(&candidate.content, max_content_length),
            ));
        }
    }

    format!(
        r#"# GOVERNMENT FACT-CHECKING TASK

## CLAIM TO VERIFY:
"{claim}"

{evidence}
## ANALYSIS INSTRUCTIONS:

You are a government fact-checker. Decide whether the claim is supported by the evidence.
Look for matching entities (ministries, organisations, locations, schemes), matching themes
(policy area, timeframe, type of announcement) and semantic equivalence: government documents
use formal language while claims use everyday wording.

- TRUE: evidence directly supports the claim
- LIKELY TRUE: strong conceptual alignment with supporting evidence
- FALSE: evidence clearly contradicts the claim
- LIKELY FALSE: evidence suggests the claim is incorrect
- UNVERIFIABLE: no relevant evidence

Return ONLY JSON:

{{
    "verdict": "TRUE|LIKELY TRUE|FALSE|LIKELY FALSE|UNVERIFIABLE",
    "confidence": "high|medium|low",
    "reasoning": "Which entities match? Which concepts align?",
    "key_evidence": ["Specific matching evidence from documents"],
    "semantic_matches": {{
        "entity_matches": ["Matching entities"],
        "conceptual_alignment": "Thematic alignment",
        "wording_differences": "Terminology differences"
    }}
}}"#
    )
}

/// Parse a model reply into an outcome.
///
/// The JSON object spanning the first `{` to the last `}` is decoded; unknown
/// or missing fields fall back to defaults. A reply without a decodable
/// object yields `UNVERIFIABLE`/`low` with an "Analysis error" reasoning.
pub fn parse_response(reply: &str) -> VerificationOutcome {
    match extract_json(reply) {
        Ok(value) => outcome_from_json(&value),
        Err(error) => {
            tracing::warn!("Could not parse verifier reply: {}", error);
            VerificationOutcome::new(
                Verdict::Unverifiable,
                Confidence::Low,
                format!("Analysis error: {}", error),
            )
        }
    }
}

fn extract_json(reply: &str) -> std::result::Result<Value, String> {
    let start = reply.find('{');
    let end = reply.rfind('}');

    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str(&reply[start..=end]).map_err(|e| e.to_string())
        }
        _ => Err("No JSON found in response".to_string()),
    }
}

fn outcome_from_json(value: &Value) -> VerificationOutcome {
    let verdict = value
        .get("verdict")
        .and_then(Value::as_str)
        .and_then(Verdict::from_label)
        .unwrap_or_default();

    let confidence = value
        .get("confidence")
        .and_then(Value::as_str)
        .and_then(Confidence::from_label)
        .unwrap_or_default();

    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| crate::aggregator::NO_REASONING.to_string());

    let key_evidence = value
        .get("key_evidence")
        .map(string_list)
        .unwrap_or_default();

    let semantic_matches = value
        .get("semantic_matches")
        .and_then(|v| serde_json::from_value::<SemanticMatches>(v.clone()).ok());

    VerificationOutcome {
        verdict,
        confidence,
        reasoning,
        key_evidence,
        semantic_matches,
    }
}

/// Accept either a list of strings or a single string.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(content: &str, similarity: f32) -> RetrievalCandidate {
        RetrievalCandidate {
            document_id: 1,
            content: content.to_string(),
            source: "Ministry of Railways".to_string(),
            similarity,
        }
    }

    #[test]
    fn test_prompt_lists_evidence() {
        let prompt = build_prompt(
            "Railways have steam locomotives",
            &[candidate("Railways earmarked heritage tourism", 0.7312)],
            1500,
        );
        assert!(prompt.contains("\"Railways have steam locomotives\""));
        assert!(prompt.contains("**Document 1** (Similarity: 0.731)"));
        assert!(prompt.contains("**Source**: Ministry of Railways"));
        assert!(!prompt.contains(NO_EVIDENCE));
    }

    #[test]
    fn test_prompt_without_evidence() {
        let prompt = build_prompt("Some claim", &[], 1500);
        assert!(prompt.contains(NO_EVIDENCE));
    }

    #[test]
    fn test_prompt_truncates_content() {
        let long = "x".repeat(40);
        let prompt = build_prompt("claim", &[candidate(&long, 0.9)], 10);
        assert!(prompt.contains(&format!("**Content**: {}\n", "x".repeat(10))));
        assert!(!prompt.contains(&"x".repeat(11)));
    }

    #[test]
    fn test_parse_wrapped_json() {
        let reply = r#"Here is my analysis:
{
  "verdict": "LIKELY TRUE",
  "confidence": "medium",
  "reasoning": "Same ministry and theme.",
  "key_evidence": ["heritage tourism by steam locomotive"],
  "semantic_matches": {
    "entity_matches": ["Ministry of Railways"],
    "conceptual_alignment": "tourism",
    "wording_differences": "steam locomotives vs steam locomotive"
  }
}
Hope this helps."#;

        let outcome = parse_response(reply);
        assert_eq!(outcome.verdict, Verdict::LikelyTrue);
        assert_eq!(outcome.confidence, Confidence::Medium);
        assert_eq!(outcome.reasoning, "Same ministry and theme.");
        assert_eq!(
            outcome.key_evidence,
            vec!["heritage tourism by steam locomotive".to_string()]
        );
        assert_eq!(
            outcome.semantic_matches.unwrap().entity_matches,
            vec!["Ministry of Railways".to_string()]
        );
    }

    #[test]
    fn test_parse_fills_missing_fields() {
        let outcome = parse_response(r#"{"verdict": "FALSE"}"#);
        assert_eq!(outcome.verdict, Verdict::False);
        assert_eq!(outcome.confidence, Confidence::Low);
        assert_eq!(outcome.reasoning, crate::aggregator::NO_REASONING);
        assert!(outcome.key_evidence.is_empty());
        assert!(outcome.semantic_matches.is_none());
    }

    #[test]
    fn test_unknown_labels_default() {
        let outcome = parse_response(r#"{"verdict": "MOSTLY TRUE", "confidence": "certain"}"#);
        assert_eq!(outcome.verdict, Verdict::Unverifiable);
        assert_eq!(outcome.confidence, Confidence::Low);
    }

    #[test]
    fn test_parse_failure_is_analysis_error() {
        let outcome = parse_response("I cannot answer that.");
        assert_eq!(outcome.verdict, Verdict::Unverifiable);
        assert_eq!(outcome.confidence, Confidence::Low);
        assert!(outcome.reasoning.starts_with("Analysis error: "));

        let broken = parse_response("{ \"verdict\": TRUE }");
        assert!(broken.reasoning.starts_with("Analysis error: "));
    }

    #[test]
    fn test_key_evidence_as_string() {
        let outcome = parse_response(r#"{"verdict": "TRUE", "key_evidence": "one line"}"#);
        assert_eq!(outcome.key_evidence, vec!["one line".to_string()]);
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = LlmVerifier::new(LlmConfig::default(), 1500, Duration::from_secs(1));
        assert!(matches!(result, Err(FactCheckError::Config(_))));

        let config = LlmConfig {
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        };
        let verifier = LlmVerifier::new(config, 1500, Duration::from_secs(1)).unwrap();
        assert_eq!(verifier.model(), "llama-3.3-70b-versatile");
        assert_eq!(verifier.name(), "llm");
    }
}
