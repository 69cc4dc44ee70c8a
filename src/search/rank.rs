use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use super::{ScorerRegistry, Strategy};
use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::extract::TextExtractor;
use crate::llm::embeddings::HttpEmbeddingProvider;
use crate::models::FunctionBlock;

/// Options for one ranking call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankOptions {
    pub strategy: Strategy,
    /// Maximum number of blocks returned.
    pub top_n: usize,
    /// Blocks scoring strictly below this are dropped before selection.
    #[serde(default)]
    pub score_threshold: Option<f32>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Bm25,
            top_n: 2,
            score_threshold: None,
        }
    }
}

/// A selected block and the score it was ranked by.
#[derive(Debug, Clone, Copy)]
pub struct RankedBlock<'a> {
    pub block: &'a FunctionBlock,
    pub score: f32,
}

/// Scores blocks with a registered strategy and selects the best ones.
#[derive(Clone)]
pub struct Ranker {
    registry: ScorerRegistry,
    extractor: TextExtractor,
}

impl Ranker {
    pub fn new(registry: ScorerRegistry, extractor: TextExtractor) -> Self {
        Self {
            registry,
            extractor,
        }
    }

    /// Lexical strategies always; embedding only when a provider is configured.
    pub fn from_config(
        repository_root: impl Into<PathBuf>,
        llm: &LlmConfig,
        client: reqwest::Client,
    ) -> Self {
        let mut registry = ScorerRegistry::lexical();
        if llm.is_enabled() {
            registry = registry.with_embedding(Arc::new(HttpEmbeddingProvider::new(
                client,
                llm.clone(),
            )));
        }
        Self::new(registry, TextExtractor::new(repository_root))
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    pub fn registry(&self) -> &ScorerRegistry {
        &self.registry
    }

    /// One score per block, in block order, using each block's source text.
    pub async fn score(
        &self,
        query: &str,
        blocks: &[FunctionBlock],
        strategy: Strategy,
    ) -> Result<Vec<f32>> {
        let scorer = self.registry.get(strategy)?;
        let documents = self.extractor.texts(blocks);
        let scores = scorer.score(query, &documents).await?;
        if scores.len() != documents.len() {
            return Err(Error::ScoreCount {
                strategy: strategy.to_string(),
                expected: documents.len(),
                actual: scores.len(),
            });
        }
        Ok(scores)
    }

    /// Rank `blocks` against `query` and return at most `top_n` of them,
    /// best first.
    pub async fn rank<'a>(
        &self,
        query: &str,
        blocks: &'a [FunctionBlock],
        options: &RankOptions,
    ) -> Result<Vec<RankedBlock<'a>>> {
        let scores = self.score(query, blocks, options.strategy).await?;
        let selected = select_top_n(&scores, options.top_n, options.score_threshold);

        tracing::info!(
            "Ranked {} blocks with {}: selected {}",
            blocks.len(),
            options.strategy,
            selected.len()
        );

        Ok(selected
            .into_iter()
            .map(|i| RankedBlock {
                block: &blocks[i],
                score: scores[i],
            })
            .collect())
    }
}

/// Positions of the `top_n` best scores, best first.
///
/// Scores strictly below `threshold` are dropped first. Survivors are
/// stable-sorted ascending and then reversed, so among equal scores the
/// later position comes first. NaN never passes a threshold and otherwise
/// ranks below every number.
pub fn select_top_n(scores: &[f32], top_n: usize, threshold: Option<f32>) -> Vec<usize> {
    let mut survivors: Vec<usize> = match threshold {
        Some(t) => {
            let kept: Vec<usize> = (0..scores.len())
                .filter(|&i| scores[i] >= t)
                .collect();
            tracing::debug!(
                "Score threshold {t} kept {} of {} blocks",
                kept.len(),
                scores.len()
            );
            kept
        }
        None => (0..scores.len()).collect(),
    };

    if survivors.is_empty() {
        return survivors;
    }

    survivors.sort_by(|&a, &b| sort_key(scores[a]).total_cmp(&sort_key(scores[b])));
    survivors.reverse();
    survivors.truncate(top_n);
    survivors
}

/// Total-order key: NaN sinks to the bottom and -0.0 ties with 0.0.
fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else if score == 0.0 {
        0.0
    } else {
        score
    }
}
