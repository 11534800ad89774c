//! The retain pipeline: ingest free-form content, extract facts, and store
//! them deduplicated, embedded, entity-linked and temporally/causally
//! connected within a bank's transaction boundary.
//!
//! Everything outside that boundary — recall/search, query-time date
//! inference, the embedding model, the LLM transport, entity-resolution
//! strategy, HTTP/CLI glue — is either a trait seam owned by this crate's
//! callers or simply out of scope.

pub mod chunk_store;
pub mod chunker;
pub mod config;
pub mod dedup;
pub mod embedder;
pub mod entity_processing;
pub mod fact_extraction;
pub mod fact_store;
pub mod link_builder;
pub mod llm;
pub mod orchestrator;
pub mod query_analyzer;
pub mod task_backend;
pub mod types;

pub use config::RetainConfig;
pub use dedup::{DuplicateChecker, EmbeddingDuplicateChecker};
pub use embedder::{Embedder, OpenAiEmbedder};
pub use entity_processing::{EntityResolver, NameMatchEntityResolver};
pub use llm::{LlmClient, OpenAiLlmClient};
pub use orchestrator::{RetainBatchRequest, RetainContentInput, RetainDeps, delete_bank, retain, retain_batch};
pub use query_analyzer::QueryAnalyzer;
pub use task_backend::{BackgroundTask, TaskBackend};
pub use types::{Fact, FactType, RetainContent};
