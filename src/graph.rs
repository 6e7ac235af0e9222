//! Dependency graph builder
//!
//! Converts extracted references into directed [`DependencyEdge`] rows.
//! Import references go through module resolution; unresolved imports
//! (external packages, missing files) are retained as edges with an
//! unresolved target rather than dropped. Call/property/type references
//! produce `symbol_usage` edges, resolved against same-file symbols only -
//! cross-file symbol resolution is a deferred pass.
//!
//! The builder is the enforcement point for the edge endpoint invariant:
//! a row that fails validation is logged and counted, never handed to
//! storage.

use std::collections::{HashMap, HashSet};

use crate::edge::{DependencyEdge, DependencyKind, EdgeEndpoint};
use crate::reference::{meta, Reference, ReferenceKind};
use crate::resolve;
use crate::symbol::Symbol;
use crate::Error;

/// Edges built for one file, plus the count of rows rejected by the
/// endpoint invariant.
#[derive(Debug, Default)]
pub struct BuiltEdges {
    pub edges: Vec<DependencyEdge>,
    pub rejected: usize,
}

/// Builds dependency edges for one repository run.
pub struct GraphBuilder<'a> {
    repository: &'a str,
    /// All file paths in the run, the resolution universe for imports.
    files: &'a HashSet<String>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(repository: &'a str, files: &'a HashSet<String>) -> Self {
        Self { repository, files }
    }

    /// Convert one file's references into edges.
    ///
    /// `symbols` are the file's own symbols, used for same-file resolution
    /// of usage targets. Duplicate (from, to, kind) triples collapse to one
    /// edge.
    pub fn build_edges(
        &self,
        file_path: &str,
        symbols: &[Symbol],
        references: &[Reference],
    ) -> BuiltEdges {
        let mut out = BuiltEdges::default();
        let mut seen: HashSet<(EdgeEndpoint, EdgeEndpoint, DependencyKind)> = HashSet::new();

        // Same-file symbol lookup by name; first declaration wins.
        let mut local_symbols: HashMap<&str, &Symbol> = HashMap::new();
        for symbol in symbols {
            local_symbols.entry(symbol.name.as_str()).or_insert(symbol);
        }

        for reference in references {
            let candidate = match reference.kind {
                ReferenceKind::Import => self.import_edge(file_path, reference),
                ReferenceKind::Call
                | ReferenceKind::PropertyAccess
                | ReferenceKind::TypeReference => {
                    self.usage_edge(file_path, reference, &local_symbols)
                }
            };

            let Some(result) = candidate else {
                continue;
            };

            match result {
                Ok(edge) => {
                    let key = (edge.from.clone(), edge.to.clone(), edge.kind);
                    if seen.insert(key) {
                        out.edges.push(edge);
                    }
                }
                Err(Error::InvalidGraphRow(msg)) => {
                    tracing::error!(file = file_path, "InvalidGraphRow rejected: {}", msg);
                    out.rejected += 1;
                }
                Err(other) => {
                    tracing::error!(file = file_path, "edge build failed: {}", other);
                    out.rejected += 1;
                }
            }
        }

        out
    }

    fn import_edge(
        &self,
        file_path: &str,
        reference: &Reference,
    ) -> Option<crate::Result<DependencyEdge>> {
        let specifier = reference.import_source()?.to_string();

        let to = match resolve::resolve_import(file_path, &specifier, self.files) {
            Some(target) => EdgeEndpoint::file(target),
            None => EdgeEndpoint::unresolved(specifier.clone()),
        };

        let edge = DependencyEdge::new(
            self.repository,
            EdgeEndpoint::file(file_path),
            to,
            DependencyKind::FileImport,
        )
        .map(|mut e| {
            e.metadata = reference.metadata.clone();
            e.metadata
                .insert(meta::IMPORT_SOURCE.to_string(), specifier.into());
            e
        });
        Some(edge)
    }

    fn usage_edge(
        &self,
        file_path: &str,
        reference: &Reference,
        local_symbols: &HashMap<&str, &Symbol>,
    ) -> Option<crate::Result<DependencyEdge>> {
        let target_name = reference.target.as_deref()?;

        let to = match local_symbols.get(target_name) {
            Some(symbol) => {
                EdgeEndpoint::symbol(file_path, &symbol.name, symbol.span.start_line)
            }
            // Name-only target, deferred to a future resolution pass.
            None => EdgeEndpoint::unresolved(target_name),
        };

        let edge = DependencyEdge::new(
            self.repository,
            EdgeEndpoint::file(file_path),
            to,
            DependencyKind::SymbolUsage,
        )
        .map(|mut e| {
            e.metadata = reference.metadata.clone();
            e
        });
        Some(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceKind;
    use crate::symbol::{Span, SymbolKind};

    fn file_set(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_resolved_import_edge() {
        let files = file_set(&["src/app.ts", "src/util.ts"]);
        let builder = GraphBuilder::new("repo", &files);

        let reference = Reference::new("src/app.ts", 1, 0, ReferenceKind::Import, Some("helper".into()))
            .with_meta(meta::IMPORT_SOURCE, "./util");

        let built = builder.build_edges("src/app.ts", &[], &[reference]);
        assert_eq!(built.edges.len(), 1);
        assert_eq!(built.rejected, 0);

        let edge = &built.edges[0];
        assert_eq!(edge.kind, DependencyKind::FileImport);
        assert_eq!(edge.to, EdgeEndpoint::file("src/util.ts"));
        assert_eq!(edge.metadata[meta::IMPORT_SOURCE], "./util");
    }

    #[test]
    fn test_external_import_kept_unresolved() {
        let files = file_set(&["src/app.ts"]);
        let builder = GraphBuilder::new("repo", &files);

        let reference = Reference::new("src/app.ts", 1, 0, ReferenceKind::Import, Some("default".into()))
            .with_meta(meta::IMPORT_SOURCE, "lodash");

        let built = builder.build_edges("src/app.ts", &[], &[reference]);
        assert_eq!(built.edges.len(), 1);
        assert!(built.edges[0].is_unresolved());
        assert_eq!(built.edges[0].to.display_name(), "lodash");
    }

    #[test]
    fn test_same_file_symbol_usage_resolves() {
        let files = file_set(&["src/app.ts"]);
        let builder = GraphBuilder::new("repo", &files);

        let symbol = Symbol::new("src/app.ts", "helper", SymbolKind::Function, Span::new(3, 0, 5, 1));
        let reference = Reference::new("src/app.ts", 10, 2, ReferenceKind::Call, Some("helper".into()));

        let built = builder.build_edges("src/app.ts", &[symbol], &[reference]);
        assert_eq!(built.edges.len(), 1);
        assert_eq!(built.edges[0].kind, DependencyKind::SymbolUsage);
        assert_eq!(
            built.edges[0].to,
            EdgeEndpoint::symbol("src/app.ts", "helper", 3)
        );
    }

    #[test]
    fn test_unknown_usage_target_stays_name_only() {
        let files = file_set(&["src/app.ts"]);
        let builder = GraphBuilder::new("repo", &files);

        let reference = Reference::new("src/app.ts", 10, 2, ReferenceKind::Call, Some("imported".into()));
        let built = builder.build_edges("src/app.ts", &[], &[reference]);

        assert_eq!(built.edges.len(), 1);
        assert!(built.edges[0].is_unresolved());
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let files = file_set(&["src/app.ts", "src/util.ts"]);
        let builder = GraphBuilder::new("repo", &files);

        let make = || {
            Reference::new("src/app.ts", 1, 0, ReferenceKind::Import, Some("a".into()))
                .with_meta(meta::IMPORT_SOURCE, "./util")
        };
        let built = builder.build_edges("src/app.ts", &[], &[make(), make()]);
        assert_eq!(built.edges.len(), 1);
    }

    #[test]
    fn test_empty_target_rejected_loudly() {
        let files = file_set(&["src/app.ts"]);
        let builder = GraphBuilder::new("repo", &files);

        let reference = Reference::new("src/app.ts", 10, 2, ReferenceKind::Call, Some(String::new()));
        let built = builder.build_edges("src/app.ts", &[], &[reference]);

        assert_eq!(built.edges.len(), 0);
        assert_eq!(built.rejected, 1);
    }
}
