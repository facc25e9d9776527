//! Fact-checking pipeline
//!
//! `text -> claims -> (retrieve, verify) per claim -> aggregate`
//!
//! Claims are processed concurrently and collected in extraction order. A
//! verifier that fails or exceeds the configured timeout produces a degraded
//! `UNVERIFIABLE` result for that claim only.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::aggregator::{AggregatedResult, PerClaimResult, VerdictAggregator};
use crate::config::FactCheckConfig;
use crate::corpus::{source_distribution, SourceCount};
use crate::embeddings::EmbeddingProvider;
use crate::error::{FactCheckError, Result};
use crate::extractor::ClaimExtractor;
use crate::search::{EvidenceRetriever, IndexStats, RetrievalCandidate, VectorIndex};
use crate::verifier::{ClaimVerifier, VerificationOutcome, VerifierError};

/// Shared, explicitly constructed fact-checking handle
pub struct FactChecker {
    config: FactCheckConfig,
    retriever: EvidenceRetriever,
    extractor: Arc<dyn ClaimExtractor>,
    verifier: Arc<dyn ClaimVerifier>,
    aggregator: VerdictAggregator,
}

impl FactChecker {
    /// Assemble the pipeline. Fails on invalid configuration or when the
    /// embedder and index disagree on dimension.
    pub fn new(
        config: FactCheckConfig,
        index: VectorIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        extractor: Arc<dyn ClaimExtractor>,
        verifier: Arc<dyn ClaimVerifier>,
    ) -> Result<Self> {
        config.validate()?;
        check_dimension(embedder.as_ref(), &index)?;

        tracing::info!(
            "Fact checker ready: {} documents, embedder {}, extractor {}, verifier {}",
            index.len(),
            embedder.name(),
            extractor.name(),
            verifier.name()
        );

        let retriever =
            EvidenceRetriever::new(Arc::new(RwLock::new(index)), embedder, config.retrieval)?;

        Ok(Self {
            config,
            retriever,
            extractor,
            verifier,
            aggregator: VerdictAggregator::new(),
        })
    }

    pub fn config(&self) -> &FactCheckConfig {
        &self.config
    }

    /// Shared handle to the underlying index
    pub fn index(&self) -> &Arc<RwLock<VectorIndex>> {
        self.retriever.index()
    }

    /// Check one input text end to end.
    ///
    /// Only embedding failures are returned as errors; verifier failures are
    /// folded into the per-claim results.
    pub async fn check_claim(&self, text: &str) -> Result<AggregatedResult> {
        let mut claims = self.extractor.extract_claims(text);
        if claims.len() > self.config.max_claims {
            tracing::debug!(
                "Keeping {} of {} extracted claims",
                self.config.max_claims,
                claims.len()
            );
            claims.truncate(self.config.max_claims);
        }
        let entities = self.extractor.extract_entities(text);

        if claims.is_empty() {
            tracing::info!("No factual claims extracted");
            return Ok(self.aggregator.aggregate(text, Vec::new(), entities));
        }

        tracing::info!("Checking {} claims", claims.len());

        // join_all yields results in input order regardless of completion order
        let per_claim = join_all(claims.iter().map(|claim| self.check_single(claim)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        let result = self.aggregator.aggregate(text, per_claim, entities);
        tracing::info!(
            "Aggregated verdict {} ({})",
            result.verdict,
            result.confidence
        );
        Ok(result)
    }

    /// Check several texts in order.
    pub async fn check_batch(&self, texts: &[String]) -> Result<Vec<AggregatedResult>> {
        let mut results = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            tracing::info!("Batch item {}/{}", i + 1, texts.len());
            results.push(self.check_claim(text).await?);
        }
        Ok(results)
    }

    async fn check_single(&self, claim: &str) -> Result<PerClaimResult> {
        let candidates = self.retriever.retrieve_for_claim(claim).await?;
        tracing::debug!("Retrieved {} candidates for: {}", candidates.len(), claim);

        let limit = self.config.verifier_timeout();
        let outcome = match timeout(limit, self.verifier.verify(claim, &candidates)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(error)) => {
                tracing::warn!("Verifier failed, degrading claim: {}", error);
                VerificationOutcome::degraded(&error)
            }
            Err(_) => {
                let error = VerifierError::Timeout(limit);
                tracing::warn!("Verifier {}, degrading claim", error);
                VerificationOutcome::degraded(&error)
            }
        };

        Ok(PerClaimResult::from_outcome(claim, outcome, candidates))
    }

    /// Retrieve evidence for free text, using the configured threshold and
    /// `top_k` unless overridden.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<RetrievalCandidate>> {
        let config = self.retriever.config();
        let embedding = self.retriever.embedder().embed(query)?;
        self.retriever
            .retrieve(
                &embedding,
                top_k.unwrap_or(config.top_k),
                config.similarity_threshold,
            )
            .await
    }

    pub async fn stats(&self) -> IndexStats {
        self.index().read().await.stats()
    }

    pub async fn source_distribution(&self) -> Vec<SourceCount> {
        source_distribution(self.index().read().await.records())
    }

    /// Replace the whole index, e.g. after an offline rebuild. In-flight
    /// retrievals finish against the old index.
    pub async fn swap_index(&self, index: VectorIndex) -> Result<()> {
        check_dimension(self.retriever.embedder().as_ref(), &index)?;

        let count = index.len();
        *self.index().write().await = index;
        tracing::info!("Swapped in index with {} documents", count);
        Ok(())
    }
}

fn check_dimension(embedder: &dyn EmbeddingProvider, index: &VectorIndex) -> Result<()> {
    if embedder.dimension() != index.dimension() {
        return Err(FactCheckError::DimensionMismatch {
            expected: index.dimension(),
            actual: embedder.dimension(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NewDocument;
    use crate::embeddings::HashingEmbedder;
    use crate::extractor::RuleBasedExtractor;
    use crate::verifier::{Confidence, Verdict};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Returns TRUE when evidence exists, UNVERIFIABLE otherwise
    struct EvidenceVerifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClaimVerifier for EvidenceVerifier {
        async fn verify(
            &self,
            _claim: &str,
            candidates: &[RetrievalCandidate],
        ) -> std::result::Result<VerificationOutcome, VerifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(if candidates.is_empty() {
                VerificationOutcome::new(Verdict::Unverifiable, Confidence::Low, "no evidence")
            } else {
                VerificationOutcome::new(Verdict::True, Confidence::High, "supported")
                    .with_evidence(vec![candidates[0].content.clone()])
            })
        }

        fn name(&self) -> &str {
            "evidence"
        }
    }

    struct FailingVerifier;

    #[async_trait]
    impl ClaimVerifier for FailingVerifier {
        async fn verify(
            &self,
            _claim: &str,
            _candidates: &[RetrievalCandidate],
        ) -> std::result::Result<VerificationOutcome, VerifierError> {
            Err(VerifierError::Status {
                status: 503,
                message: "unavailable".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct SlowVerifier;

    #[async_trait]
    impl ClaimVerifier for SlowVerifier {
        async fn verify(
            &self,
            _claim: &str,
            _candidates: &[RetrievalCandidate],
        ) -> std::result::Result<VerificationOutcome, VerifierError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(VerificationOutcome::new(Verdict::True, Confidence::High, "late"))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    /// Slow failure for the first claim, immediate support for the rest
    struct MixedVerifier;

    #[async_trait]
    impl ClaimVerifier for MixedVerifier {
        async fn verify(
            &self,
            claim: &str,
            _candidates: &[RetrievalCandidate],
        ) -> std::result::Result<VerificationOutcome, VerifierError> {
            if claim.contains("first") {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Err(VerifierError::Transport("connection reset".to_string()))
            } else {
                Ok(VerificationOutcome::new(Verdict::True, Confidence::High, "confirmed"))
            }
        }

        fn name(&self) -> &str {
            "mixed"
        }
    }

    const RAILWAYS_DOC: &str = "Railways earmarked heritage tourism by steam locomotive";

    fn railways_index(embedder: &HashingEmbedder) -> VectorIndex {
        let mut index = VectorIndex::create(embedder.dimension()).unwrap();
        index
            .insert_batch(
                vec![embedder.embed(RAILWAYS_DOC).unwrap()],
                vec![NewDocument::new(RAILWAYS_DOC).with_source("Ministry of Railways")],
            )
            .unwrap();
        index
    }

    fn checker(verifier: Arc<dyn ClaimVerifier>, config: FactCheckConfig) -> FactChecker {
        let embedder = HashingEmbedder::default();
        let index = railways_index(&embedder);
        FactChecker::new(
            config,
            index,
            Arc::new(embedder),
            Arc::new(RuleBasedExtractor::new()),
            verifier,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_check_claim_supported() {
        let checker = checker(
            Arc::new(EvidenceVerifier {
                calls: AtomicUsize::new(0),
            }),
            FactCheckConfig::default(),
        );

        let result = checker
            .check_claim("Indian Railways have steam locomotives for tourism")
            .await
            .unwrap();

        assert_eq!(result.verdict, Verdict::True);
        assert_eq!(result.retrieved_facts_count, 1);
        assert_eq!(result.key_evidence, vec![RAILWAYS_DOC.to_string()]);
        assert!(result.per_claim_results[0].retrieved_candidates[0].similarity >= 0.6);
    }

    #[tokio::test]
    async fn test_empty_input_has_no_claims() {
        let verifier = Arc::new(EvidenceVerifier {
            calls: AtomicUsize::new(0),
        });
        let checker = checker(verifier.clone(), FactCheckConfig::default());

        let result = checker.check_claim("   ").await.unwrap();
        assert_eq!(result.verdict, Verdict::Unverifiable);
        assert!(result.claims_analyzed.is_empty());
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_claims_capped_and_ordered() {
        let verifier = Arc::new(EvidenceVerifier {
            calls: AtomicUsize::new(0),
        });
        let config = FactCheckConfig {
            max_claims: 2,
            ..FactCheckConfig::default()
        };
        let checker = checker(verifier.clone(), config);

        let result = checker
            .check_claim(
                "The minister announced a rail scheme. The government will fund 10 plants. \
                 The department confirmed the 2024 budget.",
            )
            .await
            .unwrap();

        assert_eq!(
            result.claims_analyzed,
            vec![
                "The minister announced a rail scheme.",
                "The government will fund 10 plants."
            ]
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_verifier_failure_degrades() {
        let checker = checker(Arc::new(FailingVerifier), FactCheckConfig::default());

        let result = checker
            .check_claim("Indian Railways have steam locomotives for tourism")
            .await
            .unwrap();

        assert_eq!(result.verdict, Verdict::Unverifiable);
        assert_eq!(result.confidence, Confidence::VeryLow);
        assert!(result.reasoning.starts_with("Service error: "));
        assert!(result.key_evidence.is_empty());
        // Evidence was still retrieved
        assert_eq!(result.retrieved_facts_count, 1);
    }

    #[tokio::test]
    async fn test_one_claim_failure_keeps_order_and_other_claims() {
        let checker = checker(Arc::new(MixedVerifier), FactCheckConfig::default());

        let result = checker
            .check_claim(
                "The government announced the first scheme. \
                 The minister confirmed the second policy.",
            )
            .await
            .unwrap();

        // The slow first claim finishes last but stays first
        assert_eq!(
            result.claims_analyzed,
            vec![
                "The government announced the first scheme.",
                "The minister confirmed the second policy."
            ]
        );
        let verdicts: Vec<_> = result.per_claim_results.iter().map(|r| r.verdict).collect();
        assert_eq!(verdicts, vec![Some(Verdict::Unverifiable), Some(Verdict::True)]);
        assert_eq!(
            result.per_claim_results[0].confidence,
            Some(Confidence::VeryLow)
        );

        // Primary claim is the degraded one
        assert_eq!(result.verdict, Verdict::Unverifiable);
        assert_eq!(result.reasoning, "Service error: request failed: connection reset");
        assert_eq!(result.per_claim_results[1].reasoning.as_deref(), Some("confirmed"));
    }

    #[tokio::test]
    async fn test_verifier_timeout_degrades() {
        let config = FactCheckConfig {
            verifier_timeout_ms: 20,
            ..FactCheckConfig::default()
        };
        let checker = checker(Arc::new(SlowVerifier), config);

        let result = checker
            .check_claim("Indian Railways have steam locomotives for tourism")
            .await
            .unwrap();

        assert_eq!(result.confidence, Confidence::VeryLow);
        assert_eq!(result.reasoning, "Service error: timed out after 20 ms");
    }

    #[tokio::test]
    async fn test_empty_index_still_verifies() {
        let verifier = Arc::new(EvidenceVerifier {
            calls: AtomicUsize::new(0),
        });
        let embedder = HashingEmbedder::default();
        let checker = FactChecker::new(
            FactCheckConfig::default(),
            VectorIndex::create(embedder.dimension()).unwrap(),
            Arc::new(embedder),
            Arc::new(RuleBasedExtractor::new()),
            verifier.clone(),
        )
        .unwrap();

        let result = checker
            .check_claim("Indian Railways have steam locomotives for tourism")
            .await
            .unwrap();

        assert_eq!(result.verdict, Verdict::Unverifiable);
        assert_eq!(result.retrieved_facts_count, 0);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let result = FactChecker::new(
            FactCheckConfig::default(),
            VectorIndex::create(16).unwrap(),
            Arc::new(HashingEmbedder::new(32)),
            Arc::new(RuleBasedExtractor::new()),
            Arc::new(FailingVerifier),
        );
        assert!(matches!(
            result,
            Err(FactCheckError::DimensionMismatch {
                expected: 16,
                actual: 32
            })
        ));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = FactCheckConfig {
            max_claims: 0,
            ..FactCheckConfig::default()
        };
        let embedder = HashingEmbedder::new(8);
        let result = FactChecker::new(
            config,
            VectorIndex::create(8).unwrap(),
            Arc::new(embedder),
            Arc::new(RuleBasedExtractor::new()),
            Arc::new(FailingVerifier),
        );
        assert!(matches!(result, Err(FactCheckError::Config(_))));
    }

    #[tokio::test]
    async fn test_search_stats_and_swap() {
        let checker = checker(Arc::new(FailingVerifier), FactCheckConfig::default());

        let hits = checker.search("steam locomotive tourism", Some(3)).await.unwrap();
        assert_eq!(hits[0].source, "Ministry of Railways");
        assert_eq!(checker.stats().await.count, 1);

        let embedder = HashingEmbedder::default();
        let mut bigger = railways_index(&embedder);
        bigger
            .insert_batch(
                vec![embedder.embed("Released funds to Assam").unwrap()],
                vec![NewDocument::new("Released funds to Assam")],
            )
            .unwrap();
        checker.swap_index(bigger).await.unwrap();
        assert_eq!(checker.stats().await.count, 2);

        let distribution = checker.source_distribution().await;
        assert_eq!(distribution.len(), 2);

        let wrong = VectorIndex::create(7).unwrap();
        assert!(checker.swap_index(wrong).await.is_err());
        assert_eq!(checker.stats().await.count, 2);
    }
}
