//! Symbol extractor
//!
//! Walks the tree and emits one [`Symbol`] per declaration: functions (named,
//! anonymous, methods), classes, interfaces, type aliases, enums, and
//! module-scope variables. Re-exports and default exports are recorded under
//! their effective exported name. Generic type parameters are attached as
//! metadata on the owning symbol.

use tree_sitter::Node;

use super::node::DeclNode;
use super::{span_of, text_of};
use crate::symbol::{Symbol, SymbolKind, ANONYMOUS};

/// Export position of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportCtx {
    No,
    Named,
    Default,
}

pub fn extract_symbols(root: Node, source: &[u8], path: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    walk(root, source, path, &mut symbols);
    symbols
}

fn walk(node: Node, source: &[u8], path: &str, out: &mut Vec<Symbol>) {
    if let Some(decl) = DeclNode::classify(node.kind()) {
        match decl {
            DeclNode::Function | DeclNode::GeneratorFunction => {
                emit_function(node, source, path, out);
            }
            DeclNode::FunctionExpression => {
                // A named function expression declares its own name; an
                // unnamed one is anonymous unless a binding covers it.
                if node.child_by_field_name("name").is_some() {
                    emit_function(node, source, path, out);
                } else if !is_named_by_binding(node) {
                    emit_function(node, source, path, out);
                }
            }
            DeclNode::ArrowFunction => {
                if !is_named_by_binding(node) {
                    emit_function(node, source, path, out);
                }
            }
            DeclNode::MethodDefinition => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| text_of(n, source).to_string())
                    .unwrap_or_else(|| ANONYMOUS.to_string());
                out.push(
                    Symbol::new(path, name, SymbolKind::Function, span_of(node)),
                );
            }
            DeclNode::Class | DeclNode::AbstractClass => {
                emit_named(node, source, path, SymbolKind::Class, out);
            }
            DeclNode::Interface => {
                emit_named(node, source, path, SymbolKind::Interface, out);
            }
            DeclNode::TypeAlias => {
                emit_named(node, source, path, SymbolKind::TypeAlias, out);
            }
            DeclNode::Enum => {
                emit_named(node, source, path, SymbolKind::Enum, out);
            }
            DeclNode::LexicalDeclaration | DeclNode::VariableDeclaration => {
                if is_module_scope(node) {
                    emit_declarators(node, source, path, out);
                }
            }
            DeclNode::ExportStatement => {
                emit_export_forms(node, source, path, out);
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, source, path, out);
    }
}

fn emit_function(node: Node, source: &[u8], path: &str, out: &mut Vec<Symbol>) {
    let ctx = export_context(node);
    let name = match node.child_by_field_name("name") {
        Some(name_node) => text_of(name_node, source).to_string(),
        None if ctx == ExportCtx::Default => "default".to_string(),
        None => ANONYMOUS.to_string(),
    };

    let mut symbol = Symbol::new(path, name, SymbolKind::Function, span_of(node))
        .exported(ctx != ExportCtx::No);
    if let Some(params) = node.child_by_field_name("type_parameters") {
        symbol = symbol.with_meta("typeParams", text_of(params, source));
    }
    out.push(symbol);
}

fn emit_named(node: Node, source: &[u8], path: &str, kind: SymbolKind, out: &mut Vec<Symbol>) {
    let ctx = export_context(node);
    let name = match node.child_by_field_name("name") {
        Some(name_node) => text_of(name_node, source).to_string(),
        None if ctx == ExportCtx::Default => "default".to_string(),
        None => ANONYMOUS.to_string(),
    };

    let mut symbol = Symbol::new(path, name, kind, span_of(node)).exported(ctx != ExportCtx::No);
    if let Some(params) = node.child_by_field_name("type_parameters") {
        symbol = symbol.with_meta("typeParams", text_of(params, source));
    }
    out.push(symbol);
}

fn emit_declarators(node: Node, source: &[u8], path: &str, out: &mut Vec<Symbol>) {
    let exported = export_context(node) != ExportCtx::No;
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        // Destructuring patterns cannot be attributed to one name; skipped.
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        if name_node.kind() != "identifier" {
            continue;
        }
        out.push(
            Symbol::new(path, text_of(name_node, source), SymbolKind::Variable, span_of(declarator))
                .exported(exported),
        );
    }
}

/// Re-exports (`export { x as y } from './m'`) and expression default exports.
fn emit_export_forms(node: Node, source: &[u8], path: &str, out: &mut Vec<Symbol>) {
    if let Some(source_node) = node.child_by_field_name("source") {
        let module = strip_string_quotes(text_of(source_node, source));
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "export_clause" {
                continue;
            }
            let mut spec_cursor = child.walk();
            for spec in child.named_children(&mut spec_cursor) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let Some(name_node) = spec.child_by_field_name("name") else {
                    continue;
                };
                let original = text_of(name_node, source);
                let alias = spec
                    .child_by_field_name("alias")
                    .map(|n| text_of(n, source));

                let effective = alias.unwrap_or(original);
                let mut symbol =
                    Symbol::new(path, effective, SymbolKind::Variable, span_of(spec))
                        .exported(true)
                        .with_meta("reexportSource", module.clone());
                if alias.is_some() {
                    symbol = symbol.with_meta("originalName", original);
                }
                out.push(symbol);
            }
        }
        return;
    }

    // `export default <expr>;` for non-declaration expressions. Function and
    // class declarations under `export default` are handled by their own
    // visitors via export_context.
    if has_default_token(node) {
        if let Some(value) = node.child_by_field_name("value") {
            if DeclNode::classify(value.kind()).is_none() {
                out.push(
                    Symbol::new(path, "default", SymbolKind::Variable, span_of(value))
                        .exported(true),
                );
            }
        }
    }
}

/// Whether a binding (declarator, object property, assignment) already names
/// this function, in which case no `<anonymous>` placeholder is needed.
fn is_named_by_binding(node: Node) -> bool {
    match node.parent() {
        Some(parent) => matches!(
            parent.kind(),
            "variable_declarator" | "pair" | "assignment_expression" | "public_field_definition"
        ),
        None => false,
    }
}

fn export_context(node: Node) -> ExportCtx {
    let Some(parent) = node.parent() else {
        return ExportCtx::No;
    };
    if parent.kind() != "export_statement" {
        return ExportCtx::No;
    }
    if has_default_token(parent) {
        ExportCtx::Default
    } else {
        ExportCtx::Named
    }
}

fn has_default_token(export_statement: Node) -> bool {
    let mut cursor = export_statement.walk();
    let found = export_statement
        .children(&mut cursor)
        .any(|c| c.kind() == "default");
    found
}

/// Whether a declaration sits at module scope (directly under `program`,
/// possibly wrapped in an `export_statement`).
fn is_module_scope(node: Node) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "program" => return true,
            "export_statement" => current = parent,
            _ => return false,
        }
    }
    false
}

pub(crate) fn strip_string_quotes(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::file::Language;
    use crate::parser::{parse_source, ParseOutcome};

    fn symbols_of(src: &str) -> Vec<Symbol> {
        let ParseOutcome::Parsed(parsed) = parse_source(src, "test.ts", Language::TypeScript).unwrap() else {
            panic!("fixture failed to parse");
        };
        extract(&parsed, "test.ts", src).symbols
    }

    #[test]
    fn test_declaration_kinds() {
        let src = r#"
export function run(): void {}
class Engine {}
interface Config { debug: boolean }
type Pair = [number, number];
enum Mode { Fast, Slow }
const limit = 10;
"#;
        let symbols = symbols_of(src);
        let find = |name: &str| symbols.iter().find(|s| s.name == name).unwrap();

        assert_eq!(find("run").kind, SymbolKind::Function);
        assert!(find("run").exported);
        assert_eq!(find("Engine").kind, SymbolKind::Class);
        assert!(!find("Engine").exported);
        assert_eq!(find("Config").kind, SymbolKind::Interface);
        assert_eq!(find("Pair").kind, SymbolKind::TypeAlias);
        assert_eq!(find("Mode").kind, SymbolKind::Enum);
        assert_eq!(find("limit").kind, SymbolKind::Variable);
    }

    #[test]
    fn test_anonymous_callback_gets_placeholder() {
        let src = "items.forEach(function () { work(); });";
        let symbols = symbols_of(src);
        assert!(symbols.iter().any(|s| s.is_anonymous() && s.kind == SymbolKind::Function));
    }

    #[test]
    fn test_bound_arrow_is_a_variable_not_anonymous() {
        let src = "const handler = () => {};";
        let symbols = symbols_of(src);
        assert!(symbols.iter().any(|s| s.name == "handler" && s.kind == SymbolKind::Variable));
        assert!(!symbols.iter().any(|s| s.is_anonymous()));
    }

    #[test]
    fn test_local_variables_are_not_module_symbols() {
        let src = "function f() { const local = 1; return local; }";
        let symbols = symbols_of(src);
        assert!(symbols.iter().any(|s| s.name == "f"));
        assert!(!symbols.iter().any(|s| s.name == "local"));
    }

    #[test]
    fn test_default_export_naming() {
        let symbols = symbols_of("export default function () { return 1; }");
        assert!(symbols.iter().any(|s| s.name == "default" && s.exported));

        let symbols = symbols_of("export default function main() {}");
        assert!(symbols.iter().any(|s| s.name == "main" && s.exported));
    }

    #[test]
    fn test_reexport_effective_name() {
        let symbols = symbols_of("export { add as sum } from './math';");
        let sym = symbols.iter().find(|s| s.name == "sum").unwrap();
        assert!(sym.exported);
        assert_eq!(sym.metadata["reexportSource"], "./math");
        assert_eq!(sym.metadata["originalName"], "add");
    }

    #[test]
    fn test_type_params_as_metadata() {
        let symbols = symbols_of("export function wrap<T, U>(value: T): U { return value as any; }");
        let sym = symbols.iter().find(|s| s.name == "wrap").unwrap();
        assert_eq!(sym.metadata["typeParams"], "<T, U>");
    }

    #[test]
    fn test_method_definitions_are_functions() {
        let src = "class Store { save(): void {} load(): void {} }";
        let symbols = symbols_of(src);
        assert!(symbols.iter().any(|s| s.name == "save" && s.kind == SymbolKind::Function));
        assert!(symbols.iter().any(|s| s.name == "load" && s.kind == SymbolKind::Function));
    }
}
