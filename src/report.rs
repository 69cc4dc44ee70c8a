//! Retrieval report: ranked blocks plus their related code.
//!
//! Enrichment is throttled by three budgets that count down once per ranked
//! block, whether or not that block had anything to enrich.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::extract::TextExtractor;
use crate::models::FunctionBlock;
use crate::relations::RelationResolver;
use crate::search::rank::{RankOptions, Ranker};
use crate::search::Strategy;
use crate::store::BlockStore;

/// How many leading ranked blocks get each kind of enrichment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budgets {
    /// Blocks that get their sibling class methods attached
    pub relative_methods_num: usize,
    /// Blocks that get their callees attached
    pub relative_calls_num: usize,
    /// Blocks that get their file's imports listed
    pub if_tell_import: usize,
}

impl Budgets {
    pub fn is_empty(&self) -> bool {
        self.relative_methods_num == 0 && self.relative_calls_num == 0 && self.if_tell_import == 0
    }
}

/// A related block with its source text.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedSnippet {
    pub file_path: String,
    pub name: String,
    pub class: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

impl RelatedSnippet {
    fn new(block: &FunctionBlock, extractor: &TextExtractor) -> Self {
        Self {
            file_path: block.file_path.clone(),
            name: block.name.clone(),
            class: block.belonging_class.clone(),
            start_line: block.start_line,
            end_line: block.end_line,
            text: extractor.text(block),
        }
    }
}

/// One ranked block. `None` enrichment means it was not computed.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub rank: usize,
    pub score: f32,
    pub file_path: String,
    pub name: String,
    pub class: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imports: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_methods: Option<Vec<RelatedSnippet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_calls: Option<Vec<RelatedSnippet>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub total_blocks: usize,
    pub strategy: Strategy,
    pub top_n: usize,
    pub entries: Vec<ReportEntry>,
}

/// Rank the whole store once, then enrich the leading results within budget.
pub async fn build_report(
    store: &BlockStore,
    ranker: &Ranker,
    query: &str,
    options: &RankOptions,
    budgets: Budgets,
) -> Result<Report> {
    let ranked = ranker.rank(query, store.blocks(), options).await?;
    let resolver = RelationResolver::new(store);
    let extractor = ranker.extractor();
    let enrich = !budgets.is_empty();
    let mut remaining = budgets;

    let mut entries = Vec::with_capacity(ranked.len());
    for (i, hit) in ranked.iter().enumerate() {
        let block = hit.block;
        let mut entry = ReportEntry {
            rank: i + 1,
            score: hit.score,
            file_path: block.file_path.clone(),
            name: block.name.clone(),
            class: block.belonging_class.clone(),
            start_line: block.start_line,
            end_line: block.end_line,
            text: extractor.text(block),
            imports: None,
            related_methods: None,
            related_calls: None,
        };

        if enrich {
            if remaining.if_tell_import > 0 && !block.imports.is_empty() {
                entry.imports = Some(block.imports.iter().cloned().collect());
            }
            remaining.if_tell_import = remaining.if_tell_import.saturating_sub(1);

            if remaining.relative_methods_num > 0 && block.is_method() {
                let methods = resolver.related_methods(block);
                entry.related_methods = Some(
                    methods
                        .into_iter()
                        .map(|b| RelatedSnippet::new(b, extractor))
                        .collect(),
                );
            }
            remaining.relative_methods_num = remaining.relative_methods_num.saturating_sub(1);

            if remaining.relative_calls_num > 0 && !block.calls.is_empty() {
                let calls = resolver.related_calls(block);
                entry.related_calls = Some(
                    calls
                        .into_iter()
                        .map(|b| RelatedSnippet::new(b, extractor))
                        .collect(),
                );
            }
            remaining.relative_calls_num = remaining.relative_calls_num.saturating_sub(1);
        }

        entries.push(entry);
    }

    Ok(Report {
        total_blocks: store.len(),
        strategy: options.strategy,
        top_n: options.top_n,
        entries,
    })
}

const ENTRY_RULE: &str = "######################################################################";
const SECTION_RULE: &str = "--------------------------------------------------";

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "In total there are {} functions. This time you are provided with {} most similar \
             functions and related information about them.",
            self.total_blocks, self.top_n
        )?;
        writeln!(
            f,
            "You can refer to the code below; it comes from the same repository as the query.\n"
        )?;

        for entry in &self.entries {
            writeln!(f, "{ENTRY_RULE}")?;
            writeln!(
                f,
                "Number:{} most similar function (score {:.4}).\n{}",
                entry.rank, entry.score, entry.text
            )?;

            if let Some(imports) = &entry.imports {
                writeln!(f, "{SECTION_RULE}")?;
                writeln!(
                    f,
                    "The function {} is in the file {}.\nThis file imports {:?}",
                    entry.rank, entry.file_path, imports
                )?;
            }

            if let Some(methods) = &entry.related_methods {
                writeln!(f, "{SECTION_RULE}")?;
                writeln!(
                    f,
                    "The code below are the methods belonging to the class of function {}!",
                    entry.rank
                )?;
                for method in methods {
                    writeln!(f, "File: {}\ncontext:\n{}", method.file_path, method.text)?;
                }
            }

            if let Some(calls) = &entry.related_calls {
                writeln!(f, "{SECTION_RULE}")?;
                writeln!(
                    f,
                    "The code below are the functions that function {} calls!",
                    entry.rank
                )?;
                for call in calls {
                    writeln!(f, "File: {}\ncontext:\n{}", call.file_path, call.text)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budgets_empty() {
        assert!(Budgets::default().is_empty());
        let budgets = Budgets {
            if_tell_import: 1,
            ..Budgets::default()
        };
        assert!(!budgets.is_empty());
    }

    #[test]
    fn test_display_sections() {
        let report = Report {
            total_blocks: 3,
            strategy: Strategy::Jaccard,
            top_n: 1,
            entries: vec![ReportEntry {
                rank: 1,
                score: 0.5,
                file_path: "a.py".to_string(),
                name: "f".to_string(),
                class: None,
                start_line: 1,
                end_line: 2,
                text: "def f():\n    g()\n".to_string(),
                imports: Some(vec!["os".to_string()]),
                related_methods: None,
                related_calls: Some(vec![RelatedSnippet {
                    file_path: "b.py".to_string(),
                    name: "g".to_string(),
                    class: None,
                    start_line: 4,
                    end_line: 5,
                    text: "def g():\n    pass\n".to_string(),
                }]),
            }],
        };

        let text = report.to_string();
        assert!(text.starts_with("In total there are 3 functions."));
        assert!(text.contains("Number:1 most similar function"));
        assert!(text.contains("This file imports [\"os\"]"));
        assert!(!text.contains("methods belonging to the class"));
        assert!(text.contains("File: b.py\ncontext:\ndef g():"));
    }

    #[test]
    fn test_json_omits_uncomputed_enrichment() {
        let entry = ReportEntry {
            rank: 1,
            score: 1.0,
            file_path: "a.py".to_string(),
            name: "f".to_string(),
            class: None,
            start_line: 1,
            end_line: 1,
            text: String::new(),
            imports: None,
            related_methods: None,
            related_calls: Some(Vec::new()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("imports").is_none());
        assert!(json.get("related_methods").is_none());
        assert_eq!(json["related_calls"], serde_json::json!([]));
    }
}
