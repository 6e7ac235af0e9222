//! # Repograph - Code-intelligence indexing engine
//!
//! Parses a source repository into ASTs, extracts declared symbols and usage
//! references, builds a directed dependency graph linking files and symbols,
//! and persists everything to SQLite so downstream consumers can run
//! "find usages", change-impact analysis, and search.
//!
//! Repograph provides:
//! - Tree-sitter based parsing for TypeScript/JavaScript, tolerant of per-file
//!   syntax errors
//! - Symbol and reference extraction over a closed, exhaustively-dispatched
//!   node classification
//! - Module resolution and dependency-edge construction
//! - A chunked, transactional bulk-storage engine with partial-failure
//!   observability
//! - A cycle-safe, depth-bounded dependency query engine

pub mod file;
pub mod symbol;
pub mod reference;
pub mod edge;
pub mod parser;
pub mod extract;
pub mod resolve;
pub mod graph;
pub mod storage;
pub mod query;
pub mod pipeline;
pub mod config;

// Re-exports for convenient access
pub use file::{Language, SourceFile};
pub use symbol::{Span, Symbol, SymbolKind};
pub use reference::{Reference, ReferenceKind};
pub use edge::{DependencyEdge, DependencyKind, EdgeEndpoint};
pub use storage::{ChunkMode, ChunkedWriter, GraphStore};
pub use query::{DependencyQuery, QueryScope, TraversalResult};
pub use pipeline::{IndexRun, RunOutcome, RunProgress, RunSummary};

/// Result type alias for Repograph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Repograph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Invalid graph row: {0}")]
    InvalidGraphRow(String),

    #[error("Unknown node id: {0}")]
    NodeNotFound(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
