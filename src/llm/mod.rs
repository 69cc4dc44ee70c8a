//! Clients for external model providers.

pub mod embeddings;
