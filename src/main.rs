//! Repograph CLI - index a repository and query its dependency graph

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repograph::config::{self, RepographConfig};
use repograph::pipeline::{IndexRun, SourceInput, DEFAULT_CHUNK_SIZE};
use repograph::query::{DependencyQuery, QueryScope, DEFAULT_MAX_DEPTH};
use repograph::storage::NodeId;
use repograph::{GraphStore, Language, RunOutcome};

#[derive(Parser)]
#[command(name = "repograph")]
#[command(version = "0.1.0")]
#[command(about = "Code-intelligence indexing engine - symbols, references, dependency graph")]
#[command(long_about = r#"
Repograph parses a TypeScript/JavaScript repository into a dependency graph
stored in SQLite, enabling:
  • Find-usages and change-impact analysis (dependents)
  • Transitive dependency listing (dependencies)
  • Chunked, resumable-observability indexing runs

Example usage:
  repograph index --path ./src --repo my-app
  repograph dependents --node src/auth.ts --depth 3
  repograph dependencies --node src/app.ts --format json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to repograph.toml (defaults to ./repograph.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter repograph.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Index a repository directory
    Index {
        /// Path to the repository root
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Repository name (defaults to directory name)
        #[arg(short, long)]
        repo: Option<String>,

        /// Files per storage chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Find everything that depends on a node
    Dependents {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Find everything a node depends on
    Dependencies {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show row counts for a repository
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Repository name
        #[arg(short, long)]
        repo: Option<String>,
    },
}

#[derive(clap::Args)]
struct QueryArgs {
    /// File path, a symbol address like src/auth.ts#validate@10, or a raw
    /// node id like file:12 / symbol:7
    #[arg(short, long)]
    node: String,

    /// Path to the database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Repository name
    #[arg(short, long)]
    repo: Option<String>,

    /// Maximum traversal depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    depth: u32,

    /// Restrict results: all, files, symbols
    #[arg(long, default_value = "all")]
    scope: String,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            let starter = RepographConfig {
                database: Some(
                    config::default_database_path_in(Path::new("."))
                        .to_string_lossy()
                        .to_string(),
                ),
                repository: None,
                chunk_size: Some(DEFAULT_CHUNK_SIZE),
            };
            config::write_config(&path, &starter, force)?;
            println!("✅ Wrote {}", path.display());
        }

        Commands::Index { path, database, repo, chunk_size } => {
            let database = resolve_database(database, &file_config);
            let repo_name = repo
                .or_else(|| file_config.repository.clone())
                .unwrap_or_else(|| directory_name(&path));
            let chunk_size = chunk_size
                .or(file_config.chunk_size)
                .unwrap_or(DEFAULT_CHUNK_SIZE);

            println!("🚀 Indexing repository: {}", repo_name);
            println!("📂 Path: {}", path.display());
            println!("🗄️  Database: {}", database.display());

            let inputs = collect_inputs(&path)?;
            if inputs.is_empty() {
                println!("∅ No indexable files found under {}", path.display());
                return Ok(());
            }
            println!("📄 Files discovered: {}", inputs.len());

            config::ensure_db_dir(&database)?;
            let mut store = GraphStore::open(&database)?;

            let total_chunks = inputs.len().div_ceil(chunk_size) as u64;
            let bar = ProgressBar::new(total_chunks);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{bar:30.cyan/blue}] chunk {pos}/{len} ({msg} files)",
                )?
                .progress_chars("=> "),
            );

            let progress_bar = bar.clone();
            let summary = IndexRun::new(&repo_name)
                .with_chunk_size(chunk_size)
                .on_progress(move |p| {
                    progress_bar.set_position(p.chunks_completed);
                    progress_bar.set_message(p.files_indexed.to_string());
                })
                .execute(&mut store, inputs)?;
            bar.finish_and_clear();

            for failure in &summary.parse_failures {
                println!(
                    "⚠️  Parse failed: {} ({})",
                    console::style(&failure.path).yellow(),
                    failure.message
                );
            }

            match &summary.outcome {
                RunOutcome::Success => {
                    println!("\n✅ Indexing complete in {:.2?}", summary.duration);
                    println!("   Files indexed: {}", summary.files_indexed);
                    println!("   Chunks committed: {}", summary.chunks_completed);
                    println!("   Symbols: {}", summary.symbols_extracted);
                    println!("   References: {}", summary.references_extracted);
                    println!("   Edges: {}", summary.edges_built);
                    if summary.rows_rejected > 0 {
                        println!(
                            "   {} rows rejected by validation",
                            console::style(summary.rows_rejected).red()
                        );
                    }
                }
                RunOutcome::FailedAtChunk { chunk, error } => {
                    println!(
                        "\n❌ Run failed at chunk {}: {} ({} chunks remain committed)",
                        chunk, error, summary.chunks_completed
                    );
                    std::process::exit(1);
                }
                RunOutcome::Cancelled => {
                    println!(
                        "\n🛑 Run cancelled after {} chunks",
                        summary.chunks_completed
                    );
                }
            }
        }

        Commands::Dependents { query } => run_query(&file_config, query, true)?,
        Commands::Dependencies { query } => run_query(&file_config, query, false)?,

        Commands::Stats { database, repo } => {
            let database = resolve_database(database, &file_config);
            let repo_name = repo
                .or_else(|| file_config.repository.clone())
                .unwrap_or_else(|| directory_name(Path::new(".")));

            let store = GraphStore::open(&database)?;
            let stats = store.stats(&repo_name)?;

            println!("📊 Repograph Statistics ({})", database.display());
            println!("------------------------------------");
            println!("{}", stats);
        }
    }

    Ok(())
}

fn run_query(file_config: &RepographConfig, args: QueryArgs, dependents: bool) -> anyhow::Result<()> {
    let database = resolve_database(args.database, file_config);
    let repo_name = args
        .repo
        .clone()
        .or_else(|| file_config.repository.clone())
        .unwrap_or_else(|| directory_name(Path::new(".")));

    let scope = match args.scope.as_str() {
        "all" => QueryScope::All,
        "files" => QueryScope::FilesOnly,
        "symbols" => QueryScope::SymbolsOnly,
        other => anyhow::bail!("unknown scope '{}' (expected all, files, symbols)", other),
    };

    let store = GraphStore::open(&database)?;
    let seed = resolve_node(&store, &repo_name, &args.node)?;
    let query = DependencyQuery::new(&store);

    let result = if dependents {
        println!("📞 Dependents of {} (depth: {})...", args.node, args.depth);
        query.dependents(seed, args.depth, scope)?
    } else {
        println!("📦 Dependencies of {} (depth: {})...", args.node, args.depth);
        query.dependencies(seed, args.depth, scope)?
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.hits.is_empty() {
        println!("∅ No results.");
    } else {
        for hit in &result.hits {
            println!(
                "- [{}] {} ({}, depth {})",
                hit.dependency_type, hit.name, hit.node, hit.depth
            );
        }
    }
    if result.depth_limit_reached {
        println!("⚠️  Depth limit reached; results are truncated.");
    }
    Ok(())
}

/// Accepts `file:12` / `symbol:7` node ids, `path#name@line` symbol
/// addresses, or a repository-relative file path.
fn resolve_node(store: &GraphStore, repository: &str, node: &str) -> anyhow::Result<NodeId> {
    if let Ok(id) = NodeId::from_str(node) {
        return Ok(id);
    }

    if let Some((file, symbol)) = node.split_once('#') {
        let Some((name, line)) = symbol.rsplit_once('@') else {
            anyhow::bail!("symbol address must be path#name@line, got '{}'", node);
        };
        let line: u32 = line
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid line number in '{}'", node))?;
        return match store.symbol_id(repository, file, name, line)? {
            Some(id) => Ok(NodeId::Symbol(id)),
            None => anyhow::bail!(
                "no symbol '{}' at {}:{} in repository '{}'",
                name,
                file,
                line,
                repository
            ),
        };
    }

    match store.file_id(repository, node)? {
        Some(id) => Ok(NodeId::File(id)),
        None => anyhow::bail!("no indexed file '{}' in repository '{}'", node, repository),
    }
}

fn resolve_database(flag: Option<PathBuf>, file_config: &RepographConfig) -> PathBuf {
    flag.or_else(|| file_config.database.clone().map(PathBuf::from))
        .unwrap_or_else(|| config::default_database_path_in(Path::new(".")))
}

fn directory_name(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|s| s.to_string_lossy().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Walk the repository and read every file with a known grammar, honoring
/// .gitignore. Paths are repository-relative with forward slashes.
fn collect_inputs(root: &Path) -> anyhow::Result<Vec<SourceInput>> {
    let mut inputs = Vec::new();
    for entry in ignore::WalkBuilder::new(root).build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let file_path = entry.path();
        let relative = file_path.strip_prefix(root).unwrap_or(file_path);
        let relative = relative.to_string_lossy().replace('\\', "/");

        if Language::from_path(&relative).is_none() {
            continue;
        }

        match std::fs::read_to_string(file_path) {
            Ok(content) => inputs.push(SourceInput::new(relative, content)),
            Err(e) => {
                tracing::debug!("skipping unreadable file {}: {}", file_path.display(), e);
            }
        }
    }
    inputs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(inputs)
}
