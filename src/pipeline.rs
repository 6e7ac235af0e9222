//! Indexing pipeline - parse, extract, build edges, store in chunks
//!
//! One [`IndexRun`] indexes one repository snapshot. Parsing and extraction
//! fan out across worker threads (the per-file work is independent); storage
//! is strictly sequential, chunk by chunk, so the atomicity story stays
//! simple. A failed chunk ends the run but leaves every earlier chunk
//! committed and queryable, with the failure point recorded in `index_runs`.
//!
//! Cancellation is cooperative: the flag is checked between chunks, so a
//! cancelled run still finishes the chunk it was committing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::extract;
use crate::file::{Language, SourceFile};
use crate::graph::GraphBuilder;
use crate::parser::{self, ParseFailure, ParseOutcome};
use crate::storage::{ChunkMode, ChunkedWriter, FileBundle, GraphStore};
use crate::Result;

/// Default number of files per storage chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// One file handed to the pipeline: repository-relative path plus content.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub path: String,
    pub content: String,
    /// Explicit language hint, taking precedence over extension detection.
    pub language: Option<Language>,
}

impl SourceInput {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

/// Durable progress snapshot, reported after every committed chunk.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunProgress {
    pub files_indexed: u64,
    pub chunks_completed: u64,
    pub total_chunks: u64,
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunOutcome {
    Success,
    /// Chunk `chunk` failed to commit; chunks before it remain queryable.
    FailedAtChunk { chunk: u64, error: String },
    Cancelled,
}

/// Everything a caller needs to report on a finished (or failed) run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: i64,
    pub repository: String,
    pub outcome: RunOutcome,
    pub files_discovered: usize,
    /// Files durably committed, which can trail `files_discovered` on
    /// failure or cancellation.
    pub files_indexed: u64,
    pub chunks_completed: u64,
    pub symbols_extracted: usize,
    pub references_extracted: usize,
    pub edges_built: usize,
    /// Rows refused by edge validation. Non-zero is loud in the logs.
    pub rows_rejected: usize,
    pub parse_failures: Vec<ParseFailure>,
    #[serde(skip)]
    pub duration: Duration,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.outcome == RunOutcome::Success
    }
}

struct ProcessedFile {
    index: usize,
    bundle: FileBundle,
    parse_failure: Option<ParseFailure>,
    rejected: usize,
}

/// Orchestrates one indexing run over a repository snapshot.
pub struct IndexRun {
    repository: String,
    chunk_size: usize,
    workers: usize,
    cancel: Arc<AtomicBool>,
    progress: Option<Box<dyn FnMut(&RunProgress) + Send>>,
}

impl IndexRun {
    pub fn new(repository: impl Into<String>) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            repository: repository.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Flag that requests a stop after the in-flight chunk commits.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Callback invoked after every committed chunk.
    pub fn on_progress(mut self, callback: impl FnMut(&RunProgress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Run the full pipeline: parse, extract, build edges, commit chunks.
    pub fn execute(mut self, store: &mut GraphStore, inputs: Vec<SourceInput>) -> Result<RunSummary> {
        let started = Instant::now();
        let run_id = store.create_run(&self.repository)?;
        let files_discovered = inputs.len();

        tracing::info!(
            repository = %self.repository,
            files = files_discovered,
            chunk_size = self.chunk_size,
            "indexing run started"
        );

        // The resolution universe for imports is the full input set, known
        // up front, so edge building can run inside the workers too.
        let file_set: HashSet<String> = inputs.iter().map(|i| i.path.clone()).collect();
        let processed = self.process_files(inputs, &file_set)?;

        let mut parse_failures = Vec::new();
        let mut rows_rejected = 0usize;
        let mut symbols_extracted = 0usize;
        let mut references_extracted = 0usize;
        let mut edges_built = 0usize;

        let mut bundles = Vec::with_capacity(processed.len());
        for item in processed {
            if let Some(failure) = item.parse_failure {
                tracing::warn!(file = %failure.path, "parse failed: {}", failure.message);
                parse_failures.push(failure);
            }
            rows_rejected += item.rejected;
            symbols_extracted += item.bundle.symbols.len();
            references_extracted += item.bundle.references.len();
            edges_built += item.bundle.edges.len();
            bundles.push(item.bundle);
        }

        let chunks = ChunkedWriter::partition(bundles, self.chunk_size);
        let total_chunks = chunks.len() as u64;

        let mut files_indexed = 0u64;
        let mut chunks_completed = 0u64;
        let mut outcome = RunOutcome::Success;

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                outcome = RunOutcome::Cancelled;
                break;
            }

            let mode = if chunk_index == 0 {
                ChunkMode::FirstChunk
            } else {
                ChunkMode::ContinuationChunk
            };

            match ChunkedWriter::new(store).write_chunk(&self.repository, chunk_index, chunk, mode) {
                Ok(receipt) => {
                    files_indexed += receipt.files_in_chunk as u64;
                    chunks_completed += 1;
                }
                Err(e) => {
                    tracing::error!(chunk = chunk_index, "chunk failed: {}", e);
                    outcome = RunOutcome::FailedAtChunk {
                        chunk: chunk_index as u64,
                        error: e.to_string(),
                    };
                    break;
                }
            }

            store.record_run_progress(run_id, files_indexed, chunks_completed)?;
            if let Some(callback) = self.progress.as_mut() {
                callback(&RunProgress {
                    files_indexed,
                    chunks_completed,
                    total_chunks,
                });
            }
        }

        match &outcome {
            RunOutcome::Success => store.finish_run_success(run_id)?,
            RunOutcome::FailedAtChunk { chunk, error } => {
                store.finish_run_failure(run_id, *chunk, error)?
            }
            RunOutcome::Cancelled => {
                store.finish_run_failure(run_id, chunks_completed, "cancelled")?
            }
        }

        let duration = started.elapsed();
        tracing::info!(
            repository = %self.repository,
            files_indexed,
            chunks_completed,
            parse_failures = parse_failures.len(),
            elapsed_ms = duration.as_millis() as u64,
            "indexing run finished: {:?}",
            outcome
        );

        Ok(RunSummary {
            run_id,
            repository: self.repository,
            outcome,
            files_discovered,
            files_indexed,
            chunks_completed,
            symbols_extracted,
            references_extracted,
            edges_built,
            rows_rejected,
            parse_failures,
            duration,
        })
    }

    /// Fan parse/extract/edge-build out across worker threads. Results come
    /// back in arbitrary order and are re-sorted by input index so chunk
    /// composition stays deterministic.
    fn process_files(
        &self,
        inputs: Vec<SourceInput>,
        file_set: &HashSet<String>,
    ) -> Result<Vec<ProcessedFile>> {
        let builder = GraphBuilder::new(&self.repository, file_set);
        let repository = self.repository.as_str();

        let (task_tx, task_rx) = crossbeam::channel::unbounded::<(usize, SourceInput)>();
        let (result_tx, result_rx) = crossbeam::channel::unbounded::<Result<ProcessedFile>>();

        for task in inputs.into_iter().enumerate() {
            // Unbounded channel, send cannot fail while the receiver lives.
            let _ = task_tx.send(task);
        }
        drop(task_tx);

        let mut processed = Vec::new();
        std::thread::scope(|scope| {
            for _ in 0..self.workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                let builder = &builder;
                scope.spawn(move || {
                    while let Ok((index, input)) = task_rx.recv() {
                        let _ = result_tx.send(process_file(repository, index, input, builder));
                    }
                });
            }
            drop(result_tx);

            while let Ok(item) = result_rx.recv() {
                processed.push(item);
            }
        });

        let mut processed = processed.into_iter().collect::<Result<Vec<_>>>()?;
        processed.sort_by_key(|item| item.index);
        Ok(processed)
    }
}

fn process_file(
    repository: &str,
    index: usize,
    input: SourceInput,
    builder: &GraphBuilder<'_>,
) -> Result<ProcessedFile> {
    let mut file = SourceFile::new(repository, input.path.clone(), &input.content);
    if let Some(hint) = input.language {
        file = file.with_language(hint);
    }

    let Some(language) = file.language else {
        // No grammar for this file; it still gets a file row.
        return Ok(ProcessedFile {
            index,
            bundle: FileBundle::file_only(file),
            parse_failure: None,
            rejected: 0,
        });
    };

    let parsed = match parser::parse_source(&input.content, &input.path, language)? {
        ParseOutcome::Parsed(parsed) => parsed,
        ParseOutcome::Failed(failure) => {
            return Ok(ProcessedFile {
                index,
                bundle: FileBundle::file_only(file),
                parse_failure: Some(failure),
                rejected: 0,
            });
        }
    };

    let output = extract::extract(&parsed, &input.path, &input.content);
    let built = builder.build_edges(&input.path, &output.symbols, &output.references);

    Ok(ProcessedFile {
        index,
        bundle: FileBundle {
            file,
            symbols: output.symbols,
            references: output.references,
            edges: built.edges,
        },
        parse_failure: None,
        rejected: built.rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{DependencyQuery, QueryScope};
    use crate::storage::NodeId;

    fn inputs(files: &[(&str, &str)]) -> Vec<SourceInput> {
        files
            .iter()
            .map(|(path, content)| SourceInput::new(*path, *content))
            .collect()
    }

    #[test]
    fn test_small_run_end_to_end() {
        let mut store = GraphStore::open_in_memory().unwrap();
        let summary = IndexRun::new("repo")
            .with_workers(2)
            .execute(
                &mut store,
                inputs(&[
                    ("src/util.ts", "export function helper(): number { return 1; }"),
                    ("src/app.ts", "import { helper } from './util';\nhelper();"),
                ]),
            )
            .unwrap();

        assert!(summary.succeeded());
        assert_eq!(summary.files_indexed, 2);
        assert_eq!(summary.chunks_completed, 1);
        assert!(summary.parse_failures.is_empty());
        assert!(summary.symbols_extracted >= 1);

        let app = store.file_id("repo", "src/app.ts").unwrap().unwrap();
        let util = store.file_id("repo", "src/util.ts").unwrap().unwrap();
        let query = DependencyQuery::new(&store);
        let deps = query
            .dependencies(NodeId::File(app), 1, QueryScope::FilesOnly)
            .unwrap();
        assert!(deps.hits.iter().any(|h| h.node == NodeId::File(util)));
    }

    #[test]
    fn test_parse_failure_still_records_file() {
        let mut store = GraphStore::open_in_memory().unwrap();
        let summary = IndexRun::new("repo")
            .execute(
                &mut store,
                inputs(&[
                    ("good.ts", "export const x = 1;"),
                    // Binary-ish garbage: no recognizable structure at all.
                    ("bad.ts", "\u{0}\u{1}\u{2}}}"),
                ]),
            )
            .unwrap();

        assert!(summary.succeeded());
        assert_eq!(summary.files_indexed, 2);
        assert_eq!(summary.parse_failures.len(), 1);
        assert_eq!(summary.parse_failures[0].path, "bad.ts");
        assert_eq!(store.count_files("repo").unwrap(), 2);
    }

    #[test]
    fn test_progress_reported_per_chunk() {
        let mut store = GraphStore::open_in_memory().unwrap();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let files: Vec<(String, String)> = (0..7)
            .map(|i| (format!("f{}.ts", i), format!("export const v{} = {};", i, i)))
            .collect();
        let inputs = files
            .iter()
            .map(|(p, c)| SourceInput::new(p.clone(), c.clone()))
            .collect();

        let summary = IndexRun::new("repo")
            .with_chunk_size(3)
            .on_progress(move |p| sink.lock().unwrap().push(*p))
            .execute(&mut store, inputs)
            .unwrap();

        assert!(summary.succeeded());
        assert_eq!(summary.chunks_completed, 3);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].files_indexed, 3);
        assert_eq!(seen[2].files_indexed, 7);
        assert!(seen.iter().all(|p| p.total_chunks == 3));
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let mut store = GraphStore::open_in_memory().unwrap();
        let files = inputs(&[
            ("a.ts", "export const a = 1;"),
            ("b.ts", "import { a } from './a';"),
        ]);

        IndexRun::new("repo").execute(&mut store, files.clone()).unwrap();
        IndexRun::new("repo").execute(&mut store, files).unwrap();

        assert_eq!(store.count_files("repo").unwrap(), 2);
    }

    #[test]
    fn test_language_hint_overrides_extension() {
        let mut store = GraphStore::open_in_memory().unwrap();

        // An extensionless script is a bare file row without a hint, and
        // fully extracted with one.
        let summary = IndexRun::new("repo")
            .execute(
                &mut store,
                vec![SourceInput::new("tools/generate", "export const version = 1;")],
            )
            .unwrap();
        assert!(summary.succeeded());
        assert_eq!(summary.symbols_extracted, 0);

        let summary = IndexRun::new("repo")
            .execute(
                &mut store,
                vec![
                    SourceInput::new("tools/generate", "export const version = 1;")
                        .with_language(Language::TypeScript),
                ],
            )
            .unwrap();
        assert!(summary.succeeded());
        assert_eq!(summary.symbols_extracted, 1);
    }

    #[test]
    fn test_cancel_mid_run_keeps_committed_chunks() {
        let mut store = GraphStore::open_in_memory().unwrap();
        let run = IndexRun::new("repo").with_chunk_size(2);
        let cancel = run.cancel_handle();

        // 6 files at chunk size 2; cancel as soon as the first chunk lands.
        let files: Vec<SourceInput> = (0..6)
            .map(|i| SourceInput::new(format!("f{}.ts", i), format!("export const v{} = {};", i, i)))
            .collect();

        let summary = run
            .on_progress(move |p| {
                if p.chunks_completed == 1 {
                    cancel.store(true, Ordering::Relaxed);
                }
            })
            .execute(&mut store, files)
            .unwrap();

        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.chunks_completed, 1);
        assert_eq!(summary.files_indexed, 2);

        // The committed chunk stays durable and queryable.
        assert_eq!(store.count_files("repo").unwrap(), 2);
        assert!(store.file_id("repo", "f0.ts").unwrap().is_some());
        assert!(store.file_id("repo", "f2.ts").unwrap().is_none());

        let run = store.get_run(summary.run_id).unwrap().unwrap();
        assert_eq!(run.status, "failed");
        assert_eq!(run.chunks_completed, 1);
        assert_eq!(run.error.as_deref(), Some("cancelled"));
    }

    #[test]
    fn test_cancelled_before_first_chunk() {
        let mut store = GraphStore::open_in_memory().unwrap();
        let run = IndexRun::new("repo");
        run.cancel_handle().store(true, Ordering::Relaxed);

        let summary = run
            .execute(&mut store, inputs(&[("a.ts", "export const a = 1;")]))
            .unwrap();

        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.files_indexed, 0);

        let run = store.get_run(summary.run_id).unwrap().unwrap();
        assert_eq!(run.status, "failed");
        assert_eq!(run.error.as_deref(), Some("cancelled"));
    }
}
