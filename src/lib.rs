//! chainsight - Grounded question answering over indexed documents
//!
//! A retrieval-augmented answer-generation pipeline for supply chain
//! document intelligence: documents are chunked, embedded, and indexed in a
//! vector store; questions are answered from retrieved fragments, either in
//! a single retrieval+generation pass or agentically, by decomposing the
//! question into sub-queries whose answers are merged, ranked, and
//! synthesized with a reasoning trace.
//!
//! # Architecture
//!
//! - Capability providers (embedding, generation, vector backend) are
//!   injected behind traits; HTTP adapters and an in-memory backend ship
//!   with the crate
//! - Degradation is layered: vector search falls back to keyword search,
//!   and the agentic orchestrator falls back to the single-pass pipeline

pub mod agent;
pub mod chunker;
pub mod config;
pub mod errors;
pub mod ops;
pub mod pipeline;
pub mod planner;
pub mod providers;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use agent::AgentOrchestrator;
pub use chunker::{Chunk, Chunker};
pub use config::RagConfig;
pub use errors::{RagError, Result};
pub use pipeline::{QueryOptions, RagPipeline, NO_SOURCES_ANSWER};
pub use planner::QueryPlanner;
pub use providers::{
    AzureEmbeddingClient, AzureGenerationClient, EmbeddingProvider, GenerationProvider,
    GenerationRequest,
};
pub use service::QueryService;
pub use store::{IndexedStore, InMemoryBackend, QdrantBackend, VectorBackend};
pub use types::{
    AgentResult, DocumentInfo, PipelineResult, QueryRequest, QueryResponse, SourceMatch,
    SubQueryResult,
};
