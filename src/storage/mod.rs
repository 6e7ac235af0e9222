//! Storage layer - SQLite persistence for files, symbols, references, edges
//!
//! [`GraphStore`] is the low-level store; [`ChunkedWriter`] is the bulk write
//! path that commits one indexing run as a sequence of bounded, atomic chunk
//! transactions.

pub mod chunked;
pub mod schema;
pub mod sqlite;

pub use chunked::{ChunkMode, ChunkReceipt, ChunkedWriter, FileBundle};
pub use sqlite::{EdgeHop, GraphStore, NodeId, RunRecord, StoreStats};
