//! TF-IDF dot-product scoring.
//!
//! The query is appended to the corpus as a final pseudo-document before the
//! vocabulary and idf weights are fitted. Each row is L2-normalised during
//! fitting; the score is the plain dot product of a document row with the
//! query row.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::Scorer;
use crate::error::Result;

/// Words of two or more word characters.
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_REGEX
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TfidfScorer;

impl TfidfScorer {
    pub fn score_documents(&self, query: &str, documents: &[String]) -> Vec<f32> {
        let mut corpus: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();
        corpus.push(tokenize(query));
        let n_docs = corpus.len() as f64;

        // Vocabulary and document frequency over documents + query
        let mut vocabulary: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();
        for tokens in &corpus {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(token.as_str()).or_insert(next_id);
                if id == doc_freq.len() {
                    doc_freq.push(0);
                }
                if !seen.contains(&id) {
                    seen.push(id);
                    doc_freq[id] += 1;
                }
            }
        }

        if vocabulary.is_empty() {
            tracing::debug!("TF-IDF vocabulary is empty; all scores are zero");
            return vec![0.0; documents.len()];
        }

        // Smoothed idf
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows: Vec<HashMap<usize, f64>> = corpus
            .iter()
            .map(|tokens| {
                let mut row: HashMap<usize, f64> = HashMap::new();
                for token in tokens {
                    if let Some(&id) = vocabulary.get(token.as_str()) {
                        *row.entry(id).or_insert(0.0) += 1.0;
                    }
                }
                for (id, weight) in row.iter_mut() {
                    *weight *= idf[*id];
                }
                let norm = row.values().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for weight in row.values_mut() {
                        *weight /= norm;
                    }
                }
                row
            })
            .collect();

        let Some((query_row, doc_rows)) = rows.split_last() else {
            return Vec::new();
        };

        doc_rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|(id, w)| query_row.get(id).map(|q| w * q))
                    .sum::<f64>() as f32
            })
            .collect()
    }
}

#[async_trait]
impl Scorer for TfidfScorer {
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        Ok(self.score_documents(query, documents))
    }
}
