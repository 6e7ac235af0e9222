//! Symbol types - named declarations extracted from source files
//!
//! Every declaration maps to one of six kinds:
//! - `Function`: function declarations, methods, anonymous functions
//! - `Class`: class declarations
//! - `Interface`: TypeScript interface declarations
//! - `TypeAlias`: `type X = ...` declarations
//! - `Enum`: enum declarations
//! - `Variable`: module-scope `const`/`let`/`var` bindings and re-exports

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::{Error, Result};

/// Placeholder name for anonymous functions, kept so the call graph stays
/// complete even when a callable has no binding.
pub const ANONYMOUS: &str = "<anonymous>";

/// Kinds of declared symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Variable,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Enum => "enum",
            SymbolKind::Variable => "variable",
        }
    }

    pub fn all() -> &'static [SymbolKind] {
        &[
            SymbolKind::Function,
            SymbolKind::Class,
            SymbolKind::Interface,
            SymbolKind::TypeAlias,
            SymbolKind::Enum,
            SymbolKind::Variable,
        ]
    }
}

impl FromStr for SymbolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "function" | "fn" | "method" => Ok(SymbolKind::Function),
            "class" => Ok(SymbolKind::Class),
            "interface" => Ok(SymbolKind::Interface),
            "type_alias" | "type" => Ok(SymbolKind::TypeAlias),
            "enum" => Ok(SymbolKind::Enum),
            "variable" | "var" | "const" | "let" => Ok(SymbolKind::Variable),
            _ => Err(Error::InvalidValue(format!("Unknown symbol kind: {}", s))),
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source span. Lines are 1-indexed, columns 0-indexed, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self { start_line, start_col, end_line, end_col }
    }
}

/// A named declaration belonging to exactly one file.
///
/// Symbols are fully recomputed on every re-index, never incrementally
/// patched. Generic type parameters travel as metadata, not as separate rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// Path of the owning file (repository-relative)
    pub file_path: String,
    /// Symbol name, or `<anonymous>` for unnamed functions
    pub name: String,
    pub kind: SymbolKind,
    pub span: Span,
    /// Whether the declaration is exported from its module
    pub exported: bool,
    /// Open metadata map: `typeParams`, `reexportSource`, `originalName`, ...
    pub metadata: Map<String, Value>,
}

impl Symbol {
    pub fn new(
        file_path: impl Into<String>,
        name: impl Into<String>,
        kind: SymbolKind,
        span: Span,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            name: name.into(),
            kind,
            span,
            exported: false,
            metadata: Map::new(),
        }
    }

    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.name == ANONYMOUS
    }
}
