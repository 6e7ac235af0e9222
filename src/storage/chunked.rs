//! Chunked storage engine
//!
//! Persists one indexing run's output without exceeding per-transaction
//! limits: files are partitioned into ordered chunks, each file's symbols,
//! references, and edges travel in the same chunk, and every chunk commits
//! as exactly one atomic transaction.
//!
//! The caller passes an explicit [`ChunkMode`] per chunk - never inferred
//! from ambient state. `FirstChunk` deletes all pre-existing rows for the
//! repository before inserting; `ContinuationChunk` is insert-only. On
//! failure at chunk K, chunks before K stay committed and queryable.
//!
//! Edge targets are natural keys resolved to row ids inside the chunk's own
//! transaction, so targets that landed in earlier chunks resolve directly.
//! Targets that land in a *later* chunk are inserted with a NULL id and the
//! natural key kept in `target_name`; each subsequent chunk backfills the
//! pending ids for the files it inserts.

use rusqlite::{params, OptionalExtension, Transaction};

use crate::edge::{DependencyEdge, EdgeEndpoint};
use crate::file::SourceFile;
use crate::reference::Reference;
use crate::symbol::Symbol;
use crate::{Error, Result};

use super::sqlite::GraphStore;

/// Whether a chunk opens a run (delete-then-insert) or continues one
/// (insert-only). An explicit two-state enum by design: the delete is too
/// destructive to hang off an inferred boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    FirstChunk,
    ContinuationChunk,
}

/// One file and everything extracted from it. The grouping key for chunk
/// partitioning is the owning file.
#[derive(Debug)]
pub struct FileBundle {
    pub file: SourceFile,
    pub symbols: Vec<Symbol>,
    pub references: Vec<Reference>,
    pub edges: Vec<DependencyEdge>,
}

impl FileBundle {
    /// A file with no extracted rows (parse failures still get a file row).
    pub fn file_only(file: SourceFile) -> Self {
        Self {
            file,
            symbols: Vec::new(),
            references: Vec::new(),
            edges: Vec::new(),
        }
    }
}

/// Outcome of one committed chunk.
#[derive(Debug, Clone, Copy)]
pub struct ChunkReceipt {
    pub chunk_index: usize,
    pub files_in_chunk: usize,
    pub rows_inserted: usize,
}

/// Bulk write path over a [`GraphStore`].
pub struct ChunkedWriter<'a> {
    store: &'a mut GraphStore,
}

impl<'a> ChunkedWriter<'a> {
    pub fn new(store: &'a mut GraphStore) -> Self {
        Self { store }
    }

    /// Partition a run's bundles into ordered chunks of at most `chunk_size`
    /// files each. A run with N files yields ceil(N / chunk_size) chunks.
    pub fn partition(bundles: Vec<FileBundle>, chunk_size: usize) -> Vec<Vec<FileBundle>> {
        let chunk_size = chunk_size.max(1);
        let mut chunks = Vec::with_capacity(bundles.len().div_ceil(chunk_size));
        let mut current = Vec::with_capacity(chunk_size);
        for bundle in bundles {
            current.push(bundle);
            if current.len() == chunk_size {
                chunks.push(std::mem::replace(&mut current, Vec::with_capacity(chunk_size)));
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Commit one chunk atomically: either every row lands, or none does.
    pub fn write_chunk(
        &mut self,
        repository: &str,
        chunk_index: usize,
        bundles: &[FileBundle],
        mode: ChunkMode,
    ) -> Result<ChunkReceipt> {
        let tx = self.store.connection_mut().transaction()?;
        let mut rows = 0usize;

        if mode == ChunkMode::FirstChunk {
            delete_repository_rows(&tx, repository)?;
        }

        // Pass 1: files, symbols, references. Edges wait until every file of
        // the chunk has an id.
        let mut inserted_files: Vec<(String, i64)> = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            let file_id = insert_file(&tx, repository, &bundle.file)?;
            inserted_files.push((bundle.file.path.clone(), file_id));
            rows += 1;

            for symbol in &bundle.symbols {
                insert_symbol(&tx, file_id, symbol)?;
                rows += 1;
            }
            for reference in &bundle.references {
                insert_reference(&tx, file_id, reference)?;
                rows += 1;
            }
        }

        // Pass 2: edges, with natural keys resolved against everything
        // visible inside this transaction.
        for bundle in bundles {
            for edge in &bundle.edges {
                insert_edge(&tx, edge)?;
                rows += 1;
            }
        }

        // Pass 3: backfill edges from earlier chunks that were waiting for
        // files inserted just now.
        for (path, file_id) in &inserted_files {
            tx.execute(
                r#"
                UPDATE dependency_edges
                SET to_file_id = ?1, target_name = NULL
                WHERE repository = ?2 AND to_file_id IS NULL AND to_symbol_id IS NULL
                  AND kind = 'file_import' AND target_name = ?3
                "#,
                params![file_id, repository, path],
            )?;
        }

        tx.commit()?;
        tracing::debug!(
            repository,
            chunk_index,
            files = bundles.len(),
            rows,
            "chunk committed"
        );

        Ok(ChunkReceipt {
            chunk_index,
            files_in_chunk: bundles.len(),
            rows_inserted: rows,
        })
    }
}

fn delete_repository_rows(tx: &Transaction, repository: &str) -> Result<()> {
    tx.execute("DELETE FROM dependency_edges WHERE repository = ?1", [repository])?;
    tx.execute(
        "DELETE FROM refs WHERE file_id IN (SELECT id FROM files WHERE repository = ?1)",
        [repository],
    )?;
    tx.execute(
        "DELETE FROM symbols WHERE file_id IN (SELECT id FROM files WHERE repository = ?1)",
        [repository],
    )?;
    tx.execute("DELETE FROM files WHERE repository = ?1", [repository])?;
    Ok(())
}

fn insert_file(tx: &Transaction, repository: &str, file: &SourceFile) -> Result<i64> {
    tx.execute(
        "INSERT INTO files (repository, path, hash, language) VALUES (?1, ?2, ?3, ?4)",
        params![
            repository,
            file.path,
            file.hash,
            file.language.map(|l| l.as_str()),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_symbol(tx: &Transaction, file_id: i64, symbol: &Symbol) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO symbols (file_id, name, kind, start_line, start_col, end_line, end_col, exported, metadata)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            file_id,
            symbol.name,
            symbol.kind.as_str(),
            symbol.span.start_line,
            symbol.span.start_col,
            symbol.span.end_line,
            symbol.span.end_col,
            symbol.exported,
            serde_json::to_string(&symbol.metadata)?,
        ],
    )?;
    Ok(())
}

fn insert_reference(tx: &Transaction, file_id: i64, reference: &Reference) -> Result<()> {
    tx.execute(
        "INSERT INTO refs (file_id, line, col, kind, target, metadata) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            file_id,
            reference.line,
            reference.column,
            reference.kind.as_str(),
            reference.target,
            serde_json::to_string(&reference.metadata)?,
        ],
    )?;
    Ok(())
}

fn insert_edge(tx: &Transaction, edge: &DependencyEdge) -> Result<()> {
    let repository = edge.repository.as_str();

    let (from_file_id, from_symbol_id) = match resolve_endpoint(tx, repository, &edge.from)? {
        ResolvedEndpoint::File(id) => (Some(id), None),
        ResolvedEndpoint::Symbol(id) => (None, Some(id)),
        ResolvedEndpoint::Pending(_) | ResolvedEndpoint::External(_) => {
            // A from endpoint always belongs to the current chunk; a miss is
            // a programmer error, not a data condition.
            return Err(Error::InvalidGraphRow(format!(
                "from endpoint {:?} not present at insert time",
                edge.from
            )));
        }
    };

    let (to_file_id, to_symbol_id, target_name) =
        match resolve_endpoint(tx, repository, &edge.to)? {
            ResolvedEndpoint::File(id) => (Some(id), None, None),
            ResolvedEndpoint::Symbol(id) => (None, Some(id), None),
            ResolvedEndpoint::Pending(name) | ResolvedEndpoint::External(name) => {
                (None, None, Some(name))
            }
        };

    tx.execute(
        r#"
        INSERT INTO dependency_edges
            (repository, from_file_id, from_symbol_id, to_file_id, to_symbol_id, kind, target_name, metadata)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            repository,
            from_file_id,
            from_symbol_id,
            to_file_id,
            to_symbol_id,
            edge.kind.as_str(),
            target_name,
            serde_json::to_string(&edge.metadata)?,
        ],
    )?;
    Ok(())
}

enum ResolvedEndpoint {
    File(i64),
    Symbol(i64),
    /// Known file path whose row has not been inserted yet (later chunk).
    Pending(String),
    /// Name that resolves to no row at all (external package, bare name).
    External(String),
}

fn resolve_endpoint(
    tx: &Transaction,
    repository: &str,
    endpoint: &EdgeEndpoint,
) -> Result<ResolvedEndpoint> {
    match endpoint {
        EdgeEndpoint::File(path) => {
            let id: Option<i64> = tx
                .query_row(
                    "SELECT id FROM files WHERE repository = ?1 AND path = ?2",
                    params![repository, path],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(match id {
                Some(id) => ResolvedEndpoint::File(id),
                None => ResolvedEndpoint::Pending(path.clone()),
            })
        }
        EdgeEndpoint::Symbol(key) => {
            let id: Option<i64> = tx
                .query_row(
                    r#"
                    SELECT s.id FROM symbols s
                    JOIN files f ON f.id = s.file_id
                    WHERE f.repository = ?1 AND f.path = ?2 AND s.name = ?3 AND s.start_line = ?4
                    "#,
                    params![repository, key.file_path, key.name, key.line],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(match id {
                Some(id) => ResolvedEndpoint::Symbol(id),
                None => ResolvedEndpoint::Pending(key.name.clone()),
            })
        }
        EdgeEndpoint::Unresolved(name) => Ok(ResolvedEndpoint::External(name.clone())),
    }
}
