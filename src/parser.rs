//! AST parser front-end
//!
//! Wraps tree-sitter with the TypeScript/TSX/JavaScript grammars. Parsing is
//! a pure, stateless operation: no caches survive across calls, and a parse
//! failure is a per-file diagnostic rather than a run-level error. The file is
//! still recorded as indexed; it is just excluded from extraction.

use tree_sitter::{Node, Parser, Tree};

use crate::file::Language;
use crate::{Error, Result};

/// A successfully parsed file, ready for extraction.
pub struct ParsedSource {
    pub tree: Tree,
    pub language: Language,
}

/// Per-file parse diagnostic. Non-fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParseFailure {
    pub path: String,
    pub message: String,
}

/// Result of parsing one file.
pub enum ParseOutcome {
    Parsed(ParsedSource),
    Failed(ParseFailure),
}

fn grammar_for(language: Language) -> tree_sitter::Language {
    match language {
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
    }
}

/// Parse one file into a syntax tree.
///
/// Tree-sitter is error-tolerant, so localized syntax errors still produce a
/// usable tree; a [`ParseFailure`] is only a missing tree, an error root, or
/// a tree whose error recovery salvaged nothing (every named child of the
/// root is an error node). Grammar setup problems are hard errors.
pub fn parse_source(content: &str, path: &str, language: Language) -> Result<ParseOutcome> {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar_for(language))
        .map_err(|e| Error::Parser(format!("failed to load {} grammar: {}", language, e)))?;

    let tree = match parser.parse(content, None) {
        Some(tree) => tree,
        None => {
            return Ok(ParseOutcome::Failed(ParseFailure {
                path: path.to_string(),
                message: "parser produced no tree".to_string(),
            }));
        }
    };

    let root = tree.root_node();
    if root.is_error() || recovered_nothing(root) {
        return Ok(ParseOutcome::Failed(ParseFailure {
            path: path.to_string(),
            message: "file is not syntactically recognizable".to_string(),
        }));
    }

    Ok(ParseOutcome::Parsed(ParsedSource { tree, language }))
}

/// Recovery wraps unparseable stretches in error nodes. A root whose named
/// children are all error nodes carries no extractable structure.
fn recovered_nothing(root: Node) -> bool {
    if !root.has_error() {
        return false;
    }
    let mut cursor = root.walk();
    let recognized = root.named_children(&mut cursor).any(|c| !c.is_error());
    !recognized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typescript() {
        let outcome = parse_source("export function f(): number { return 1; }", "a.ts", Language::TypeScript).unwrap();
        assert!(matches!(outcome, ParseOutcome::Parsed(_)));
    }

    #[test]
    fn test_parse_tsx() {
        let outcome = parse_source("export const C = () => <div>hi</div>;", "a.tsx", Language::Tsx).unwrap();
        assert!(matches!(outcome, ParseOutcome::Parsed(_)));
    }

    #[test]
    fn test_localized_error_is_tolerated() {
        // One broken statement must not fail the whole file.
        let src = "const a = 1;\nfunction {{{\nconst b = 2;\n";
        let outcome = parse_source(src, "broken.ts", Language::TypeScript).unwrap();
        assert!(matches!(outcome, ParseOutcome::Parsed(_)));
    }

    #[test]
    fn test_unrecognizable_input_is_a_failure() {
        // Nothing here can start a statement; recovery yields only error
        // nodes and the file must be reported, not silently extracted.
        let outcome = parse_source("\u{0}\u{1}}}", "junk.ts", Language::TypeScript).unwrap();
        let ParseOutcome::Failed(failure) = outcome else {
            panic!("expected a parse failure");
        };
        assert_eq!(failure.path, "junk.ts");
    }

    #[test]
    fn test_empty_file_parses() {
        let outcome = parse_source("", "empty.ts", Language::TypeScript).unwrap();
        assert!(matches!(outcome, ParseOutcome::Parsed(_)));
    }
}
