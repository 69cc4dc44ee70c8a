use async_trait::async_trait;
use std::sync::Arc;

use super::Scorer;
use crate::error::{Error, Result};
use crate::llm::embeddings::EmbeddingProvider;

/// Scores documents by cosine similarity between provider embeddings.
///
/// The query is embedded on its own first, then the documents; nothing is
/// cached between calls.
pub struct EmbeddingScorer {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingScorer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Scorer for EmbeddingScorer {
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        let query_embedding = self
            .provider
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("no embedding returned for query".to_string()))?;

        let doc_embeddings = self.provider.embed(documents).await?;
        if doc_embeddings.len() != documents.len() {
            return Err(Error::Embedding(format!(
                "expected {} document embeddings, got {}",
                documents.len(),
                doc_embeddings.len()
            )));
        }

        Ok(doc_embeddings
            .iter()
            .map(|e| cosine_similarity(&query_embedding, e))
            .collect())
    }
}

/// Cosine similarity, accumulated in `f64` so large components cannot
/// overflow into `inf / inf`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        0.0
    } else {
        (dot / denom) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Maps known words to fixed directions and records every call.
    struct KeywordEmbedder {
        calls: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.lock().push(texts.len());
            Ok(texts
                .iter()
                .map(|t| {
                    vec![
                        t.matches("json").count() as f32,
                        t.matches("http").count() as f32,
                        1.0,
                    ]
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(Error::Embedding("401 Unauthorized".to_string()))
        }
    }

    #[test]
    fn test_cosine_identical() {
        let s = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_and_degenerate() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_large_components_stay_finite() {
        let big = [1e30f32, 1e30, 0.0];
        let sim = cosine_similarity(&big, &big);
        assert!((sim - 1.0).abs() < 1e-6);

        let other = [1e30f32, 0.0, 0.0];
        let sim = cosine_similarity(&big, &other);
        assert!((sim - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);

        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_scores_follow_input_order() {
        let embedder = Arc::new(KeywordEmbedder {
            calls: Mutex::new(Vec::new()),
        });
        let scorer = EmbeddingScorer::new(embedder.clone());
        let docs = vec![
            "send http request".to_string(),
            "load json json".to_string(),
        ];

        let scores = scorer.score("parse json", &docs).await.unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0]);
        // Query first, then the documents
        assert_eq!(*embedder.calls.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_provider_failure_fails_scoring() {
        let scorer = EmbeddingScorer::new(Arc::new(FailingEmbedder));
        let err = scorer
            .score("q", &["doc".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }
}
