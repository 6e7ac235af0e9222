//! Dependency edge types - the unit read by traversal queries
//!
//! Edges connect files and/or symbols in a directed graph. Before storage an
//! endpoint is a natural key (file path, or file path + symbol name + line);
//! the chunked writer resolves natural keys to row ids at insert time so that
//! edges whose target landed in an earlier chunk still resolve correctly.
//!
//! Invariant: every edge has a `from` endpoint and a `to` endpoint. Violating
//! this is a programmer error surfaced as [`crate::Error::InvalidGraphRow`],
//! never silently tolerated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::{Error, Result};

/// Kinds of dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// File depends on another module via an import statement
    FileImport,
    /// File or symbol uses a symbol (call, property access, type reference)
    SymbolUsage,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::FileImport => "file_import",
            DependencyKind::SymbolUsage => "symbol_usage",
        }
    }
}

impl FromStr for DependencyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file_import" => Ok(DependencyKind::FileImport),
            "symbol_usage" => Ok(DependencyKind::SymbolUsage),
            _ => Err(Error::InvalidValue(format!("Unknown dependency kind: {}", s))),
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Natural key identifying a symbol row within a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolKey {
    pub file_path: String,
    pub name: String,
    pub line: u32,
}

/// One end of a dependency edge, pre-storage.
///
/// `Unresolved` carries the raw import specifier (external packages) or bare
/// symbol name whose resolution is deferred to a later pass. It is still a
/// real endpoint: such edges are retained, not dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "key")]
pub enum EdgeEndpoint {
    File(String),
    Symbol(SymbolKey),
    Unresolved(String),
}

impl EdgeEndpoint {
    pub fn file(path: impl Into<String>) -> Self {
        EdgeEndpoint::File(path.into())
    }

    pub fn symbol(file_path: impl Into<String>, name: impl Into<String>, line: u32) -> Self {
        EdgeEndpoint::Symbol(SymbolKey {
            file_path: file_path.into(),
            name: name.into(),
            line,
        })
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        EdgeEndpoint::Unresolved(name.into())
    }

    /// Display name for logs and query results.
    pub fn display_name(&self) -> &str {
        match self {
            EdgeEndpoint::File(path) => path,
            EdgeEndpoint::Symbol(key) => &key.name,
            EdgeEndpoint::Unresolved(name) => name,
        }
    }
}

/// A directed dependency-graph edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub repository: String,
    pub from: EdgeEndpoint,
    pub to: EdgeEndpoint,
    pub kind: DependencyKind,
    /// Open metadata map: `importSource`, `alias`, `isOptionalChain`, ...
    pub metadata: Map<String, Value>,
}

impl DependencyEdge {
    /// Create an edge, enforcing the endpoint invariant.
    ///
    /// An `Unresolved` endpoint with an empty name is treated as missing.
    pub fn new(
        repository: impl Into<String>,
        from: EdgeEndpoint,
        to: EdgeEndpoint,
        kind: DependencyKind,
    ) -> Result<Self> {
        for (side, endpoint) in [("from", &from), ("to", &to)] {
            if Self::endpoint_is_empty(endpoint) {
                return Err(Error::InvalidGraphRow(format!(
                    "{} endpoint of a {} edge is empty",
                    side, kind
                )));
            }
        }

        Ok(Self {
            repository: repository.into(),
            from,
            to,
            kind,
            metadata: Map::new(),
        })
    }

    fn endpoint_is_empty(endpoint: &EdgeEndpoint) -> bool {
        match endpoint {
            EdgeEndpoint::File(path) => path.is_empty(),
            EdgeEndpoint::Symbol(key) => key.file_path.is_empty() || key.name.is_empty(),
            EdgeEndpoint::Unresolved(name) => name.is_empty(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// True when the target could not be resolved to a file or symbol row.
    pub fn is_unresolved(&self) -> bool {
        matches!(self.to, EdgeEndpoint::Unresolved(_))
    }

    /// The file path the edge originates from, regardless of endpoint shape.
    pub fn source_file(&self) -> Option<&str> {
        match &self.from {
            EdgeEndpoint::File(path) => Some(path),
            EdgeEndpoint::Symbol(key) => Some(&key.file_path),
            EdgeEndpoint::Unresolved(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_file_import_edge() {
        let edge = DependencyEdge::new(
            "repo",
            EdgeEndpoint::file("src/a.ts"),
            EdgeEndpoint::file("src/b.ts"),
            DependencyKind::FileImport,
        )
        .unwrap();

        assert!(!edge.is_unresolved());
        assert_eq!(edge.source_file(), Some("src/a.ts"));
    }

    #[test]
    fn test_unresolved_target_is_still_valid() {
        let edge = DependencyEdge::new(
            "repo",
            EdgeEndpoint::file("src/a.ts"),
            EdgeEndpoint::unresolved("lodash"),
            DependencyKind::FileImport,
        )
        .unwrap();

        assert!(edge.is_unresolved());
        assert_eq!(edge.to.display_name(), "lodash");
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let result = DependencyEdge::new(
            "repo",
            EdgeEndpoint::file(""),
            EdgeEndpoint::file("src/b.ts"),
            DependencyKind::FileImport,
        );
        assert!(matches!(result, Err(Error::InvalidGraphRow(_))));

        let result = DependencyEdge::new(
            "repo",
            EdgeEndpoint::file("src/a.ts"),
            EdgeEndpoint::unresolved(""),
            DependencyKind::SymbolUsage,
        );
        assert!(matches!(result, Err(Error::InvalidGraphRow(_))));
    }
}
