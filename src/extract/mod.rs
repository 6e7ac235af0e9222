//! Symbol and reference extraction
//!
//! Visitors over a parsed tree. Extraction never fails on an unresolvable
//! node: patterns we cannot attribute statically (computed member access,
//! destructuring bindings, `export *`) are skipped, not errored.

pub mod node;
pub mod references;
pub mod symbols;

use tree_sitter::Node;

use crate::parser::ParsedSource;
use crate::reference::Reference;
use crate::symbol::{Span, Symbol};

/// Everything extracted from one file.
#[derive(Debug, Default)]
pub struct ExtractionOutput {
    pub symbols: Vec<Symbol>,
    pub references: Vec<Reference>,
}

/// Run both extractors over a parsed file.
pub fn extract(parsed: &ParsedSource, path: &str, content: &str) -> ExtractionOutput {
    let root = parsed.tree.root_node();
    let source = content.as_bytes();

    ExtractionOutput {
        symbols: symbols::extract_symbols(root, source, path),
        references: references::extract_references(root, source, path),
    }
}

/// Node span with 1-indexed lines, 0-indexed columns.
pub(crate) fn span_of(node: Node) -> Span {
    Span::new(
        node.start_position().row as u32 + 1,
        node.start_position().column as u32,
        node.end_position().row as u32 + 1,
        node.end_position().column as u32,
    )
}

pub(crate) fn text_of<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
