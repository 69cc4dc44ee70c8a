use async_trait::async_trait;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::*;
use tantivy::tokenizer::{RegexTokenizer, TextAnalyzer};
use tantivy::{doc, Index, IndexWriter, ReloadPolicy, Term};

use super::{whitespace_tokens, Scorer};
use crate::error::Result;

const TOKENIZER: &str = "bm25_whitespace";

/// Runs of non-whitespace. `\s` is Unicode-aware, matching `split_whitespace`
/// on the query side.
const TOKEN_PATTERN: &str = r"\S+";

/// Writer arena; tantivy's floor is 15 MB per indexing thread.
const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// BM25 relevance over a corpus indexed fresh on every call.
///
/// Documents are split on whitespace only (no lowercasing, no stemming) and
/// corpus statistics come from exactly the documents passed in.
#[derive(Debug, Default)]
pub struct Bm25Scorer;

impl Bm25Scorer {
    pub fn score_documents(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        let mut scores = vec![0.0f32; documents.len()];
        let query_tokens: Vec<&str> = whitespace_tokens(query).collect();
        if documents.is_empty() || query_tokens.is_empty() {
            return Ok(scores);
        }

        let mut schema_builder = Schema::builder();
        let text_indexing = TextFieldIndexing::default()
            .set_tokenizer(TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqs);
        let f_content = schema_builder.add_text_field(
            "content",
            TextOptions::default().set_indexing_options(text_indexing),
        );
        let f_position =
            schema_builder.add_u64_field("position", NumericOptions::default() | STORED);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        index.tokenizers().register(
            TOKENIZER,
            TextAnalyzer::builder(RegexTokenizer::new(TOKEN_PATTERN)?).build(),
        );

        let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
        for (position, text) in documents.iter().enumerate() {
            writer.add_document(doc!(
                f_content => text.as_str(),
                f_position => position as u64,
            ))?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let searcher = reader.searcher();

        // One SHOULD clause per query token: repeated tokens count repeatedly
        let clauses: Vec<(Occur, Box<dyn Query>)> = query_tokens
            .iter()
            .map(|token| {
                let term = Term::from_field_text(f_content, token);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, query)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        let top_docs = searcher.search(&query, &TopDocs::with_limit(documents.len()))?;
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let position = doc
                .get_first(f_position)
                .and_then(|v| v.as_u64())
                .map(|p| p as usize);
            if let Some(slot) = position.and_then(|p| scores.get_mut(p)) {
                *slot = score;
            }
        }

        tracing::debug!(
            "BM25 scored {} documents against {} query tokens",
            documents.len(),
            query_tokens.len()
        );
        Ok(scores)
    }
}

#[async_trait]
impl Scorer for Bm25Scorer {
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        self.score_documents(query, documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_one_score_per_document() {
        let corpus = docs(&["fn main", "", "parse json data", "unrelated words here"]);
        let scores = Bm25Scorer.score_documents("parse json", &corpus).unwrap();
        assert_eq!(scores.len(), 4);
        assert!(scores.iter().all(|s| *s >= 0.0));
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[1], 0.0);
        assert!(scores[2] > 0.0);
    }

    #[test]
    fn test_denser_match_scores_higher() {
        let corpus = docs(&[
            "parse something else entirely here",
            "parse json parse json",
            "nothing relevant",
        ]);
        let scores = Bm25Scorer.score_documents("parse json", &corpus).unwrap();
        assert!(scores[1] >= scores[0]);
        assert!(scores[0] > scores[2]);
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        let corpus = docs(&["Parse JSON", "parse json"]);
        let scores = Bm25Scorer.score_documents("parse json", &corpus).unwrap();
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.0);
    }

    #[test]
    fn test_code_punctuation_is_not_query_syntax() {
        let corpus = docs(&["self.data = json.loads(raw)", "return None"]);
        let scores = Bm25Scorer
            .score_documents("json.loads(raw) AND:(", &corpus)
            .unwrap();
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn test_unicode_whitespace_splits_documents_and_query_alike() {
        // U+3000 ideographic space and U+00A0 no-break space
        let corpus = docs(&["parse\u{3000}json", "nothing here"]);
        let scores = Bm25Scorer.score_documents("parse json", &corpus).unwrap();
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);

        let spaced = Bm25Scorer
            .score_documents("parse json", &docs(&["parse json", "nothing here"]))
            .unwrap();
        let nbsp = Bm25Scorer
            .score_documents("parse\u{a0}json", &docs(&["parse json", "nothing here"]))
            .unwrap();
        assert_eq!(nbsp, spaced);
        assert_eq!(scores, spaced);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(Bm25Scorer.score_documents("q", &[]).unwrap().is_empty());
        let scores = Bm25Scorer
            .score_documents("   ", &docs(&["a b", "c"]))
            .unwrap();
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn test_statistics_not_shared_between_calls() {
        let first = Bm25Scorer
            .score_documents("json", &docs(&["json", "a", "b", "c"]))
            .unwrap();
        let again = Bm25Scorer
            .score_documents("json", &docs(&["json", "a", "b", "c"]))
            .unwrap();
        assert_eq!(first, again);

        // Same document, but now common across the corpus: lower idf
        let common = Bm25Scorer
            .score_documents("json", &docs(&["json", "json", "json", "c"]))
            .unwrap();
        assert!(common[0] < first[0]);
    }
}
