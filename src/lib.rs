//! # code-retrieval
//!
//! Retrieves, from a pre-parsed index of a repository's functions and
//! classes, the functions most textually relevant to a query snippet, and
//! attaches structurally related code (sibling methods of the same class and
//! the functions each result calls) for a downstream prompt builder.
//!
//! ## Architecture
//!
//! ```text
//!   parsed index JSON                         query snippet
//!          │                                        │
//!          ▼                                        │
//!   ┌──────────────┐                                │
//!   │  BlockStore  │  blocks + (file, class) method index
//!   └──────┬───────┘                                │
//!          │ blocks                                 │
//!          ▼                                        ▼
//!   ┌──────────────────────────────────────────────────────┐
//!   │ Ranker                                               │
//!   │   TextExtractor → source span per block              │
//!   │   Scorer (bm25 | tfidf | jaccard | embedding)        │
//!   │   threshold filter → stable top-N                    │
//!   └──────────────────────┬───────────────────────────────┘
//!                          │ top-N blocks
//!                          ▼
//!   ┌──────────────────────────────────────────────────────┐
//!   │ RelationResolver (per block, within budget)          │
//!   │   related_methods: same file + class, declared order │
//!   │   related_calls:   Class.method / free fn / import   │
//!   └──────────────────────┬───────────────────────────────┘
//!                          ▼
//!                    Report (text / JSON)
//! ```
//!
//! ## Module Overview
//!
//! - [`models`] - `FunctionBlock`, `ClassMethodIndex`, parsed-index schema, request types
//! - [`store`] - Read-only block store with positional lookup indices
//! - [`extract`] - Source span extraction, failing soft on unreadable files
//! - [`search`] - `Strategy`, the `Scorer` trait and the runtime scorer table
//! - [`search::bm25`] - BM25 over a fresh in-memory tantivy index per call
//! - [`search::tfidf`] - TF-IDF dot product with the query as a pseudo-document
//! - [`search::jaccard`] - Whitespace token-set overlap
//! - [`search::vector`] - Cosine similarity over provider embeddings
//! - [`search::rank`] - Threshold filtering and top-N selection
//! - [`llm::embeddings`] - Embedding providers via Ollama or OpenAI-compatible APIs
//! - [`relations`] - Sibling-method and call-target resolution
//! - [`report`] - Budgeted enrichment and report rendering
//! - [`config`] - Environment-based configuration
//! - [`api`] - Axum HTTP handlers for retrieval and config
//! - [`state`] - Shared server state holding the loaded store

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod relations;
pub mod report;
pub mod search;
pub mod state;
pub mod store;

pub use error::{Error, Result};
