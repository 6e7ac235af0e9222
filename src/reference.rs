//! Reference types - recorded usage sites
//!
//! A reference is one usage of a name: an import, a call, a property access,
//! or a type reference. References carry a best-effort *unresolved* target
//! name; mapping that name to a concrete symbol id is a separate resolution
//! pass that this crate deliberately does not perform.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::{Error, Result};

/// Recognized metadata keys. The map is open and additive; consumers must
/// tolerate keys not listed here.
pub mod meta {
    pub const IMPORT_SOURCE: &str = "importSource";
    pub const ALIAS: &str = "alias";
    pub const IS_OPTIONAL_CHAIN: &str = "isOptionalChain";
    pub const RECEIVER: &str = "receiver";
    pub const IS_DEFAULT: &str = "isDefault";
    pub const IS_NAMESPACE: &str = "isNamespace";
}

/// Kinds of usage sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Import,
    Call,
    PropertyAccess,
    TypeReference,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Import => "import",
            ReferenceKind::Call => "call",
            ReferenceKind::PropertyAccess => "property_access",
            ReferenceKind::TypeReference => "type_reference",
        }
    }

    pub fn all() -> &'static [ReferenceKind] {
        &[
            ReferenceKind::Import,
            ReferenceKind::Call,
            ReferenceKind::PropertyAccess,
            ReferenceKind::TypeReference,
        ]
    }
}

impl FromStr for ReferenceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "import" => Ok(ReferenceKind::Import),
            "call" => Ok(ReferenceKind::Call),
            "property_access" => Ok(ReferenceKind::PropertyAccess),
            "type_reference" => Ok(ReferenceKind::TypeReference),
            _ => Err(Error::InvalidValue(format!("Unknown reference kind: {}", s))),
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded usage site.
///
/// `target` is the unresolved name of whatever is being used; it is `None`
/// only for side-effect imports (`import './polyfill'`), which have no
/// specifier. References never hold a foreign key to a target symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    /// Path of the file the usage occurs in
    pub file_path: String,
    /// 1-indexed line of the usage site
    pub line: u32,
    /// 0-indexed column of the usage site
    pub column: u32,
    pub kind: ReferenceKind,
    /// Unresolved target name
    pub target: Option<String>,
    /// Open metadata map, see [`meta`] for recognized keys
    pub metadata: Map<String, Value>,
}

impl Reference {
    pub fn new(
        file_path: impl Into<String>,
        line: u32,
        column: u32,
        kind: ReferenceKind,
        target: Option<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            column,
            kind,
            target,
            metadata: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// The import source path, if this is an import reference.
    pub fn import_source(&self) -> Option<&str> {
        self.metadata.get(meta::IMPORT_SOURCE).and_then(Value::as_str)
    }

    /// The local alias, if the usage binds one (`{ foo as bar }`).
    pub fn alias(&self) -> Option<&str> {
        self.metadata.get(meta::ALIAS).and_then(Value::as_str)
    }

    pub fn is_optional_chain(&self) -> bool {
        self.metadata
            .get(meta::IS_OPTIONAL_CHAIN)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
