//! Claim verification contract
//!
//! A [`ClaimVerifier`] judges one claim against its retrieved evidence. The
//! engine only depends on the input/output shape defined here; any failure is
//! reported as a [`VerifierError`] and folded into a degraded outcome by the
//! caller.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::search::RetrievalCandidate;

/// Categorical outcome of checking a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    True,
    LikelyTrue,
    False,
    LikelyFalse,
    #[default]
    Unverifiable,
}

impl Verdict {
    pub const ALL: [Verdict; 5] = [
        Verdict::True,
        Verdict::LikelyTrue,
        Verdict::False,
        Verdict::LikelyFalse,
        Verdict::Unverifiable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "TRUE",
            Verdict::LikelyTrue => "LIKELY_TRUE",
            Verdict::False => "FALSE",
            Verdict::LikelyFalse => "LIKELY_FALSE",
            Verdict::Unverifiable => "UNVERIFIABLE",
        }
    }

    /// Parse a loosely formatted label: case-insensitive, with spaces or
    /// hyphens accepted in place of underscores ("Likely True" -> LikelyTrue).
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();

        match normalized.as_str() {
            "TRUE" => Some(Verdict::True),
            "LIKELY_TRUE" => Some(Verdict::LikelyTrue),
            "FALSE" => Some(Verdict::False),
            "LIKELY_FALSE" => Some(Verdict::LikelyFalse),
            "UNVERIFIABLE" => Some(Verdict::Unverifiable),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence attached to a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
    VeryLow,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::VeryLow => "very_low",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            "very_low" => Some(Confidence::VeryLow),
            _ => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional explanation of how the claim lines up with the evidence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SemanticMatches {
    #[serde(default)]
    pub entity_matches: Vec<String>,
    #[serde(default)]
    pub conceptual_alignment: String,
    #[serde(default)]
    pub wording_differences: String,
}

/// Structured result of verifying a single claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub reasoning: String,
    pub key_evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_matches: Option<SemanticMatches>,
}

impl VerificationOutcome {
    pub fn new(verdict: Verdict, confidence: Confidence, reasoning: impl Into<String>) -> Self {
        Self {
            verdict,
            confidence,
            reasoning: reasoning.into(),
            key_evidence: Vec::new(),
            semantic_matches: None,
        }
    }

    pub fn with_evidence(mut self, key_evidence: Vec<String>) -> Self {
        self.key_evidence = key_evidence;
        self
    }

    /// Local stand-in for a verifier that failed or timed out.
    pub fn degraded(error: &VerifierError) -> Self {
        Self::new(
            Verdict::Unverifiable,
            Confidence::VeryLow,
            format!("Service error: {}", error),
        )
    }
}

/// Failures of the reasoning service call
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed service response: {0}")]
    Parse(String),
}

/// Judges a claim against retrieved evidence
#[async_trait]
pub trait ClaimVerifier: Send + Sync {
    /// Verify `claim` given `candidates` (possibly empty)
    async fn verify(
        &self,
        claim: &str,
        candidates: &[RetrievalCandidate],
    ) -> Result<VerificationOutcome, VerifierError>;

    /// Get the name of this verifier
    fn name(&self) -> &str;
}
