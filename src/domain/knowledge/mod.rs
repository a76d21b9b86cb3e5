//! Knowledge retrieval module.

mod retriever;

pub use retriever::{KnowledgeRetriever, RetrievedSnippet, DEFAULT_LIMIT};
