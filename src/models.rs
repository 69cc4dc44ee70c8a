use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::{Error, Result};

/// One indexed function or method with its source span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionBlock {
    /// Repository-relative path of the defining file.
    pub file_path: String,
    pub name: String,
    /// Enclosing class, set iff the block is a method.
    pub belonging_class: Option<String>,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    /// Call targets as written in source: `name` or `prefix.name`.
    pub calls: Vec<String>,
    /// Modules/symbols imported by the defining file.
    pub imports: BTreeSet<String>,
}

impl FunctionBlock {
    /// Build a block from one entry of the parsed index.
    pub fn from_parsed(file_path: &str, func: ParsedFunction) -> Self {
        Self {
            file_path: file_path.to_string(),
            name: func.name,
            belonging_class: func.class.filter(|c| !c.is_empty()),
            start_line: func.lineno,
            end_line: func.end_lineno,
            calls: func.calls.unwrap_or_default(),
            imports: func.import.unwrap_or_default().into_iter().collect(),
        }
    }

    pub fn is_method(&self) -> bool {
        self.belonging_class.is_some()
    }

    /// `Class.method` for methods, the bare name otherwise.
    pub fn qualified_name(&self) -> String {
        match &self.belonging_class {
            Some(class) => format!("{class}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// `file_path -> class_name -> declared method names`
pub type ClassMethodIndex = HashMap<String, HashMap<String, Vec<String>>>;

// ─── Parsed index (producer output) ──────────────────────

/// A function entry as emitted by the external parser.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedFunction {
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    pub lineno: usize,
    pub end_lineno: usize,
    #[serde(default)]
    pub calls: Option<Vec<String>>,
    #[serde(default)]
    pub import: Option<Vec<String>>,
}

/// A class entry as emitted by the external parser.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedClass {
    pub class_name: String,
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Everything the parser recorded for one source file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedFile {
    #[serde(rename = "Functions", default)]
    pub functions: Vec<ParsedFunction>,
    #[serde(rename = "Classes", default)]
    pub classes: Vec<ParsedClass>,
}

/// The whole parsed index, with files kept in document order.
#[derive(Debug, Clone, Default)]
pub struct ParsedIndex {
    pub files: Vec<(String, ParsedFile)>,
}

impl ParsedIndex {
    pub fn from_json_str(data: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(data)?;
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidIndex("top level must be an object".to_string()))?;

        let mut files = Vec::with_capacity(object.len());
        for (file_path, contents) in object {
            let parsed: ParsedFile = serde_json::from_value(contents.clone()).map_err(|e| {
                Error::InvalidIndex(format!("entry for {file_path}: {e}"))
            })?;
            files.push((file_path.clone(), parsed));
        }

        Ok(Self { files })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}

// ─── HTTP request types ──────────────────────────────────

/// Retrieve request
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    /// Falls back to the server's configured strategy
    pub strategy: Option<String>,
    pub top_n: Option<usize>,
    pub score_threshold: Option<f32>,
    #[serde(default)]
    pub relative_methods_num: usize,
    #[serde(default)]
    pub relative_calls_num: usize,
    #[serde(default)]
    pub if_tell_import: usize,
}

/// Embedding config update request
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfigUpdate {
    pub provider: Option<String>,
    // base_url intentionally omitted: immutable at runtime to prevent SSRF
    pub embedding_model: Option<String>,
    pub api_key: Option<String>,
}
