//! Source text lookup for function blocks.

use std::path::{Path, PathBuf};

use crate::models::FunctionBlock;

/// Reads the exact source span of a block from the repository checkout.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    root: PathBuf,
}

impl TextExtractor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lines `start_line..=end_line` of the block's file, terminators included.
    ///
    /// A missing or unreadable file is logged and yields an empty string so
    /// the block still takes part in scoring as an empty document.
    pub fn text(&self, block: &FunctionBlock) -> String {
        let full_path = self.root.join(&block.file_path);
        match std::fs::read_to_string(&full_path) {
            Ok(content) => slice_lines(&content, block.start_line, block.end_line),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("File not found: {}", full_path.display());
                String::new()
            }
            Err(e) => {
                tracing::warn!("Error reading file {}: {e}", full_path.display());
                String::new()
            }
        }
    }

    /// Texts for every block, in order.
    pub fn texts(&self, blocks: &[FunctionBlock]) -> Vec<String> {
        blocks.iter().map(|b| self.text(b)).collect()
    }
}

fn slice_lines(content: &str, start_line: usize, end_line: usize) -> String {
    let skip = start_line.saturating_sub(1);
    let take = end_line.saturating_sub(skip);
    content.split_inclusive('\n').skip(skip).take(take).collect()
}
