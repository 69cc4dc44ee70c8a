use async_trait::async_trait;
use std::collections::HashSet;

use super::{whitespace_tokens, Scorer};
use crate::error::Result;

/// Jaccard similarity of two texts' whitespace token sets.
///
/// Two empty token sets are defined to have similarity 0.
pub fn jaccard_similarity(query: &str, document: &str) -> f32 {
    let query_set: HashSet<&str> = whitespace_tokens(query).collect();
    let document_set: HashSet<&str> = whitespace_tokens(document).collect();

    let union = query_set.union(&document_set).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = query_set.intersection(&document_set).count();
    intersection as f32 / union as f32
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JaccardScorer;

#[async_trait]
impl Scorer for JaccardScorer {
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        Ok(documents
            .iter()
            .map(|doc| jaccard_similarity(query, doc))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_is_one() {
        assert_eq!(jaccard_similarity("parse json data", "parse json data"), 1.0);
    }

    #[test]
    fn test_disjoint_is_zero() {
        assert_eq!(jaccard_similarity("parse json", "write csv"), 0.0);
        assert_eq!(jaccard_similarity("parse json", ""), 0.0);
    }

    #[test]
    fn test_both_empty_is_zero() {
        assert_eq!(jaccard_similarity("", "  \n "), 0.0);
    }

    #[test]
    fn test_sets_ignore_repeats_and_whitespace_kind() {
        // {parse, json} vs {parse, json, data}
        let s = jaccard_similarity("parse  json parse", "parse\njson\tdata");
        assert!((s - 2.0 / 3.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_scorer_keeps_order() {
        let docs = vec![
            "read file and parse json".to_string(),
            "def bar(self): baz()".to_string(),
            "parse json data".to_string(),
        ];
        let scores = JaccardScorer.score("parse json", &docs).await.unwrap();
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 0.4).abs() < 1e-6);
        assert_eq!(scores[1], 0.0);
        assert!((scores[2] - 2.0 / 3.0).abs() < 1e-6);
    }
}
