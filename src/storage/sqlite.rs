//! SQLite storage implementation

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::edge::DependencyKind;
use crate::{Error, Result};

use super::schema;

/// A node in the persisted dependency graph: a file row or a symbol row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "id")]
pub enum NodeId {
    File(i64),
    Symbol(i64),
}

impl NodeId {
    pub fn raw(&self) -> i64 {
        match self {
            NodeId::File(id) | NodeId::Symbol(id) => *id,
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeId::File(id) => write!(f, "file:{}", id),
            NodeId::Symbol(id) => write!(f, "symbol:{}", id),
        }
    }
}

impl std::str::FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidValue(format!("node id must be kind:id, got {}", s)))?;
        let id: i64 = id
            .parse()
            .map_err(|_| Error::InvalidValue(format!("invalid node id number: {}", id)))?;
        match kind {
            "file" => Ok(NodeId::File(id)),
            "symbol" => Ok(NodeId::Symbol(id)),
            _ => Err(Error::InvalidValue(format!("unknown node kind: {}", kind))),
        }
    }
}

/// One traversable edge hop out of (or into) a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeHop {
    pub node: NodeId,
    pub kind: DependencyKind,
}

/// Persisted run state for observability.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub repository: String,
    pub status: String,
    pub files_indexed: u64,
    pub chunks_completed: u64,
    pub failed_chunk: Option<u64>,
    pub error: Option<String>,
}

/// SQLite-backed store for the dependency graph.
pub struct GraphStore {
    conn: Connection,
}

impl GraphStore {
    /// Open a database file (creates if it doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    // ========== Lookup Operations ==========

    /// Resolve a file path to its row id.
    pub fn file_id(&self, repository: &str, path: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT id FROM files WHERE repository = ?1 AND path = ?2",
                params![repository, path],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Resolve a symbol natural key (file, name, start line) to its row id.
    pub fn symbol_id(&self, repository: &str, file_path: &str, name: &str, line: u32) -> Result<Option<i64>> {
        self.conn
            .query_row(
                r#"
                SELECT s.id FROM symbols s
                JOIN files f ON f.id = s.file_id
                WHERE f.repository = ?1 AND f.path = ?2 AND s.name = ?3 AND s.start_line = ?4
                "#,
                params![repository, file_path, name, line],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Display name of a node: file path or symbol name.
    pub fn node_name(&self, node: NodeId) -> Result<Option<String>> {
        let (sql, id) = match node {
            NodeId::File(id) => ("SELECT path FROM files WHERE id = ?1", id),
            NodeId::Symbol(id) => ("SELECT name FROM symbols WHERE id = ?1", id),
        };
        self.conn
            .query_row(sql, [id], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    // ========== Edge Traversal Reads ==========

    /// Edges leaving a node (what it depends on).
    pub fn edges_out(&self, node: NodeId) -> Result<Vec<EdgeHop>> {
        let (sql, id) = match node {
            NodeId::File(id) => (
                "SELECT to_file_id, to_symbol_id, kind FROM dependency_edges WHERE from_file_id = ?1",
                id,
            ),
            NodeId::Symbol(id) => (
                "SELECT to_file_id, to_symbol_id, kind FROM dependency_edges WHERE from_symbol_id = ?1",
                id,
            ),
        };
        self.collect_hops(sql, id)
    }

    /// Edges arriving at a node (what depends on it).
    pub fn edges_in(&self, node: NodeId) -> Result<Vec<EdgeHop>> {
        let (sql, id) = match node {
            NodeId::File(id) => (
                "SELECT from_file_id, from_symbol_id, kind FROM dependency_edges WHERE to_file_id = ?1",
                id,
            ),
            NodeId::Symbol(id) => (
                "SELECT from_file_id, from_symbol_id, kind FROM dependency_edges WHERE to_symbol_id = ?1",
                id,
            ),
        };
        self.collect_hops(sql, id)
    }

    fn collect_hops(&self, sql: &str, id: i64) -> Result<Vec<EdgeHop>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([id], |row| {
            let file_id: Option<i64> = row.get(0)?;
            let symbol_id: Option<i64> = row.get(1)?;
            let kind_str: String = row.get(2)?;
            Ok((file_id, symbol_id, kind_str))
        })?;

        let mut hops = Vec::new();
        for row in rows {
            let (file_id, symbol_id, kind_str) = row?;
            let kind: DependencyKind = kind_str
                .parse()
                .map_err(|e: Error| rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                ))?;
            // Unresolved endpoints (both ids NULL) are not traversable.
            let node = match (file_id, symbol_id) {
                (Some(id), _) => NodeId::File(id),
                (None, Some(id)) => NodeId::Symbol(id),
                (None, None) => continue,
            };
            hops.push(EdgeHop { node, kind });
        }
        Ok(hops)
    }

    // ========== Counts & Stats ==========

    pub fn count_files(&self, repository: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM files WHERE repository = ?1",
            [repository],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn count_symbols(&self, repository: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM symbols s JOIN files f ON f.id = s.file_id WHERE f.repository = ?1",
            [repository],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn count_references(&self, repository: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM refs r JOIN files f ON f.id = r.file_id WHERE f.repository = ?1",
            [repository],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn count_edges(&self, repository: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM dependency_edges WHERE repository = ?1",
            [repository],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn stats(&self, repository: &str) -> Result<StoreStats> {
        Ok(StoreStats {
            files: self.count_files(repository)?,
            symbols: self.count_symbols(repository)?,
            references: self.count_references(repository)?,
            edges: self.count_edges(repository)?,
        })
    }

    // ========== Run Bookkeeping ==========

    /// Record the start of an indexing run.
    pub fn create_run(&self, repository: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO index_runs (repository, status) VALUES (?1, 'running')",
            [repository],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update durable progress after a committed chunk.
    pub fn record_run_progress(&self, run_id: i64, files_indexed: u64, chunks_completed: u64) -> Result<()> {
        self.conn.execute(
            "UPDATE index_runs SET files_indexed = ?2, chunks_completed = ?3 WHERE id = ?1",
            params![run_id, files_indexed, chunks_completed],
        )?;
        Ok(())
    }

    pub fn finish_run_success(&self, run_id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE index_runs SET status = 'succeeded', finished_at = datetime('now') WHERE id = ?1",
            [run_id],
        )?;
        Ok(())
    }

    pub fn finish_run_failure(&self, run_id: i64, failed_chunk: u64, error: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE index_runs SET status = 'failed', failed_chunk = ?2, error = ?3, finished_at = datetime('now') WHERE id = ?1",
            params![run_id, failed_chunk, error],
        )?;
        Ok(())
    }

    pub fn get_run(&self, run_id: i64) -> Result<Option<RunRecord>> {
        self.conn
            .query_row(
                "SELECT id, repository, status, files_indexed, chunks_completed, failed_chunk, error FROM index_runs WHERE id = ?1",
                [run_id],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        repository: row.get(1)?,
                        status: row.get(2)?,
                        files_indexed: row.get::<_, i64>(3)? as u64,
                        chunks_completed: row.get::<_, i64>(4)? as u64,
                        failed_chunk: row.get::<_, Option<i64>>(5)?.map(|v| v as u64),
                        error: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

/// Row counts for one repository.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub files: usize,
    pub symbols: usize,
    pub references: usize,
    pub edges: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Symbols: {}", self.symbols)?;
        writeln!(f, "  References: {}", self.references)?;
        writeln!(f, "  Edges: {}", self.edges)
    }
}
