//! Scoring strategies and the ranker that drives them.
//!
//! Every strategy maps `(query, documents)` to one score per document, in
//! input order. Strategies are looked up at runtime by [`Strategy`] in a
//! [`ScorerRegistry`].

pub mod bm25;
pub mod jaccard;
pub mod rank;
pub mod tfidf;
pub mod vector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::llm::embeddings::EmbeddingProvider;

/// Scoring strategies, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Bm25,
    Tfidf,
    #[serde(alias = "jaccard_sim")]
    Jaccard,
    #[serde(alias = "openai")]
    Embedding,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Bm25,
        Strategy::Tfidf,
        Strategy::Jaccard,
        Strategy::Embedding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Bm25 => "bm25",
            Strategy::Tfidf => "tfidf",
            Strategy::Jaccard => "jaccard",
            Strategy::Embedding => "embedding",
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "bm25" => Ok(Strategy::Bm25),
            "tfidf" => Ok(Strategy::Tfidf),
            "jaccard" | "jaccard_sim" => Ok(Strategy::Jaccard),
            "embedding" | "openai" => Ok(Strategy::Embedding),
            other => Err(Error::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scoring strategy over a corpus of document texts.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// One score per document, same order as `documents`.
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>>;
}

/// Runtime table of scorer implementations keyed by strategy.
#[derive(Clone)]
pub struct ScorerRegistry {
    scorers: HashMap<Strategy, Arc<dyn Scorer>>,
}

impl ScorerRegistry {
    /// Registry with the three lexical strategies and no embedding provider.
    pub fn lexical() -> Self {
        let mut scorers: HashMap<Strategy, Arc<dyn Scorer>> = HashMap::new();
        scorers.insert(Strategy::Bm25, Arc::new(bm25::Bm25Scorer));
        scorers.insert(Strategy::Tfidf, Arc::new(tfidf::TfidfScorer));
        scorers.insert(Strategy::Jaccard, Arc::new(jaccard::JaccardScorer));
        Self { scorers }
    }

    /// Add the embedding strategy backed by `provider`.
    pub fn with_embedding(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.scorers.insert(
            Strategy::Embedding,
            Arc::new(vector::EmbeddingScorer::new(provider)),
        );
        self
    }

    /// Register or replace the scorer for `strategy`.
    pub fn insert(&mut self, strategy: Strategy, scorer: Arc<dyn Scorer>) {
        self.scorers.insert(strategy, scorer);
    }

    pub fn get(&self, strategy: Strategy) -> Result<Arc<dyn Scorer>> {
        match self.scorers.get(&strategy) {
            Some(scorer) => Ok(scorer.clone()),
            None if strategy == Strategy::Embedding => Err(Error::EmbeddingUnavailable),
            None => Err(Error::UnsupportedStrategy(strategy.to_string())),
        }
    }

    pub fn available(&self) -> Vec<Strategy> {
        Strategy::ALL
            .into_iter()
            .filter(|s| self.scorers.contains_key(s))
            .collect()
    }
}

impl Default for ScorerRegistry {
    fn default() -> Self {
        Self::lexical()
    }
}

/// Split on whitespace with no normalization.
pub(crate) fn whitespace_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("bm25".parse::<Strategy>().unwrap(), Strategy::Bm25);
        assert_eq!("TFIDF".parse::<Strategy>().unwrap(), Strategy::Tfidf);
        assert_eq!("jaccard".parse::<Strategy>().unwrap(), Strategy::Jaccard);
        assert_eq!("jaccard_sim".parse::<Strategy>().unwrap(), Strategy::Jaccard);
        assert_eq!("embedding".parse::<Strategy>().unwrap(), Strategy::Embedding);
        assert_eq!("openai".parse::<Strategy>().unwrap(), Strategy::Embedding);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let err = "cosine".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedStrategy(ref s) if s == "cosine"));
    }

    #[test]
    fn test_strategy_display_round_trips() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_lexical_registry_has_no_embedding() {
        let registry = ScorerRegistry::lexical();
        assert_eq!(
            registry.available(),
            vec![Strategy::Bm25, Strategy::Tfidf, Strategy::Jaccard]
        );
        assert!(matches!(
            registry.get(Strategy::Embedding),
            Err(Error::EmbeddingUnavailable)
        ));
    }
}
