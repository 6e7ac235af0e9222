//! Database schema definitions

/// SQL to create the files table
pub const CREATE_FILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository TEXT NOT NULL,
    path TEXT NOT NULL,
    hash TEXT NOT NULL,
    language TEXT,
    UNIQUE(repository, path)
)
"#;

/// SQL to create the symbols table
pub const CREATE_SYMBOLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS symbols (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES files(id),
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    start_col INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    end_col INTEGER NOT NULL,
    exported INTEGER NOT NULL DEFAULT 0,
    metadata TEXT NOT NULL DEFAULT '{}'
)
"#;

/// SQL to create the refs table.
/// References keep no foreign key to a target symbol; resolution is deferred.
pub const CREATE_REFS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS refs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES files(id),
    line INTEGER NOT NULL,
    col INTEGER NOT NULL,
    kind TEXT NOT NULL,
    target TEXT,
    metadata TEXT NOT NULL DEFAULT '{}'
)
"#;

/// SQL to create the dependency_edges table.
/// `target_name` keeps the natural key (file path or symbol name) when the
/// target id is not yet known; unresolved external targets stay NULL forever.
pub const CREATE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS dependency_edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository TEXT NOT NULL,
    from_file_id INTEGER,
    from_symbol_id INTEGER,
    to_file_id INTEGER,
    to_symbol_id INTEGER,
    kind TEXT NOT NULL,
    target_name TEXT,
    metadata TEXT NOT NULL DEFAULT '{}'
)
"#;

/// SQL to create the index_runs table (run-level observability)
pub const CREATE_RUNS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS index_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository TEXT NOT NULL,
    status TEXT NOT NULL,
    files_indexed INTEGER NOT NULL DEFAULT 0,
    chunks_completed INTEGER NOT NULL DEFAULT 0,
    failed_chunk INTEGER,
    error TEXT,
    started_at TEXT NOT NULL DEFAULT (datetime('now')),
    finished_at TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_files_repo_path ON files(repository, path)",
    "CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_id)",
    "CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name)",
    "CREATE INDEX IF NOT EXISTS idx_refs_file ON refs(file_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_from_file ON dependency_edges(from_file_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_to_file ON dependency_edges(to_file_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_from_symbol ON dependency_edges(from_symbol_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_to_symbol ON dependency_edges(to_symbol_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_target_name ON dependency_edges(target_name)",
    "CREATE INDEX IF NOT EXISTS idx_edges_repo ON dependency_edges(repository)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_FILES_TABLE,
        CREATE_SYMBOLS_TABLE,
        CREATE_REFS_TABLE,
        CREATE_EDGES_TABLE,
        CREATE_RUNS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
