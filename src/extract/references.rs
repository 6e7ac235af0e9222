//! Reference extractor
//!
//! Walks the tree and emits one [`Reference`] per usage site: imports, calls,
//! property accesses, and type references. Targets are unresolved names;
//! resolution to symbol ids is a deferred pass.
//!
//! Known limitation: computed member access (`obj[key]`) is skipped - it
//! cannot be attributed to a name statically.

use tree_sitter::Node;

use super::node::{DeclNode, UsageNode};
use super::symbols::strip_string_quotes;
use super::text_of;
use crate::reference::{meta, Reference, ReferenceKind};

pub fn extract_references(root: Node, source: &[u8], path: &str) -> Vec<Reference> {
    let mut refs = Vec::new();
    walk(root, source, path, &mut refs);
    refs
}

fn walk(node: Node, source: &[u8], path: &str, out: &mut Vec<Reference>) {
    if let Some(usage) = UsageNode::classify(node.kind()) {
        match usage {
            UsageNode::ImportStatement => {
                emit_imports(node, source, path, out);
                // Specifier identifiers inside the clause are bindings, not
                // usages; nothing further to visit.
                return;
            }
            UsageNode::CallExpression => {
                emit_call(node, source, path, out);
            }
            UsageNode::MemberExpression => {
                // A member expression serving as a call's callee is covered
                // by the call reference; only bare accesses count here.
                if !is_call_callee(node) {
                    emit_property_access(node, source, path, out);
                }
            }
            UsageNode::SubscriptExpression => {
                // Computed access: deliberately skipped, see module docs.
            }
            UsageNode::TypeIdentifier => {
                if is_type_usage(node) {
                    push_type_ref(node, text_of(node, source), path, out);
                }
                return;
            }
            UsageNode::NestedTypeIdentifier => {
                // Qualified name (`ns.Type`): record the full resolved text.
                push_type_ref(node, text_of(node, source), path, out);
                return;
            }
            UsageNode::GenericType => {
                // `Foo<T>` records the base type name only; type arguments
                // are not separately tracked.
                if let Some(name) = node.child_by_field_name("name") {
                    push_type_ref(node, text_of(name, source), path, out);
                }
                return;
            }
            UsageNode::TypeQuery => {
                push_type_ref(node, text_of(node, source), path, out);
                return;
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, source, path, out);
    }
}

/// One reference per import specifier; one target-less reference for a
/// side-effect import.
fn emit_imports(node: Node, source: &[u8], path: &str, out: &mut Vec<Reference>) {
    let Some(source_node) = node.child_by_field_name("source") else {
        return;
    };
    let module = strip_string_quotes(text_of(source_node, source));

    let mut cursor = node.walk();
    let clause = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "import_clause");

    let Some(clause) = clause else {
        // `import './polyfill';` - no specifiers, null target name.
        out.push(
            import_ref(node, None, path).with_meta(meta::IMPORT_SOURCE, module),
        );
        return;
    };

    let mut clause_cursor = clause.walk();
    for child in clause.named_children(&mut clause_cursor) {
        match child.kind() {
            // `import foo from './m'` - bound to the synthetic "default" name
            "identifier" => {
                out.push(
                    import_ref(child, Some("default".to_string()), path)
                        .with_meta(meta::IMPORT_SOURCE, module.clone())
                        .with_meta(meta::ALIAS, text_of(child, source))
                        .with_meta(meta::IS_DEFAULT, true),
                );
            }
            // `import * as ns from './m'`
            "namespace_import" => {
                let mut ns_cursor = child.walk();
                let alias = child
                    .named_children(&mut ns_cursor)
                    .find(|c| c.kind() == "identifier")
                    .map(|c| text_of(c, source).to_string());

                let mut r = import_ref(child, Some("*".to_string()), path)
                    .with_meta(meta::IMPORT_SOURCE, module.clone())
                    .with_meta(meta::IS_NAMESPACE, true);
                if let Some(alias) = alias {
                    r = r.with_meta(meta::ALIAS, alias);
                }
                out.push(r);
            }
            // `import { foo, bar as baz } from './m'`
            "named_imports" => {
                let mut spec_cursor = child.walk();
                for spec in child.named_children(&mut spec_cursor) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let Some(name_node) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let mut r = import_ref(spec, Some(text_of(name_node, source).to_string()), path)
                        .with_meta(meta::IMPORT_SOURCE, module.clone());
                    if let Some(alias_node) = spec.child_by_field_name("alias") {
                        r = r.with_meta(meta::ALIAS, text_of(alias_node, source));
                    }
                    out.push(r);
                }
            }
            _ => {}
        }
    }
}

fn import_ref(node: Node, target: Option<String>, path: &str) -> Reference {
    Reference::new(
        path,
        node.start_position().row as u32 + 1,
        node.start_position().column as u32,
        ReferenceKind::Import,
        target,
    )
}

/// One reference per call node. Chained calls (`a.b().c()`) each produce
/// their own reference as the walk recurses through the callee.
fn emit_call(node: Node, source: &[u8], path: &str, out: &mut Vec<Reference>) {
    let Some(callee) = node.child_by_field_name("function") else {
        return;
    };

    match callee.kind() {
        "identifier" => {
            out.push(Reference::new(
                path,
                callee.start_position().row as u32 + 1,
                callee.start_position().column as u32,
                ReferenceKind::Call,
                Some(text_of(callee, source).to_string()),
            ));
        }
        "member_expression" => {
            if let Some(property) = callee.child_by_field_name("property") {
                let mut r = Reference::new(
                    path,
                    property.start_position().row as u32 + 1,
                    property.start_position().column as u32,
                    ReferenceKind::Call,
                    Some(text_of(property, source).to_string()),
                );
                if let Some(object) = callee.child_by_field_name("object") {
                    r = r.with_meta(meta::RECEIVER, text_of(object, source));
                }
                if has_optional_chain(callee) {
                    r = r.with_meta(meta::IS_OPTIONAL_CHAIN, true);
                }
                out.push(r);
            }
        }
        // Other callee shapes (subscripts, parenthesized expressions) are
        // unresolvable statically; the walk still visits their children.
        _ => {}
    }
}

fn emit_property_access(node: Node, source: &[u8], path: &str, out: &mut Vec<Reference>) {
    let Some(property) = node.child_by_field_name("property") else {
        return;
    };
    if property.kind() != "property_identifier" {
        return;
    }

    let mut r = Reference::new(
        path,
        property.start_position().row as u32 + 1,
        property.start_position().column as u32,
        ReferenceKind::PropertyAccess,
        Some(text_of(property, source).to_string()),
    );
    if let Some(object) = node.child_by_field_name("object") {
        r = r.with_meta(meta::RECEIVER, text_of(object, source));
    }
    if has_optional_chain(node) {
        r = r.with_meta(meta::IS_OPTIONAL_CHAIN, true);
    }
    out.push(r);
}

fn push_type_ref(node: Node, target: &str, path: &str, out: &mut Vec<Reference>) {
    out.push(Reference::new(
        path,
        node.start_position().row as u32 + 1,
        node.start_position().column as u32,
        ReferenceKind::TypeReference,
        Some(target.to_string()),
    ));
}

fn is_call_callee(node: Node) -> bool {
    match node.parent() {
        Some(parent) if parent.kind() == "call_expression" => parent
            .child_by_field_name("function")
            .map(|f| f.id() == node.id())
            .unwrap_or(false),
        _ => false,
    }
}

fn has_optional_chain(member: Node) -> bool {
    let mut cursor = member.walk();
    let found = member
        .children(&mut cursor)
        .any(|c| c.kind() == "optional_chain");
    found
}

/// A bare `type_identifier` is a usage unless it is the declared name of a
/// type-shaped declaration or a generic parameter.
fn is_type_usage(node: Node) -> bool {
    match node.parent() {
        Some(parent) => {
            if DeclNode::declares_type_name(parent.kind()) {
                parent
                    .child_by_field_name("name")
                    .map(|n| n.id() != node.id())
                    .unwrap_or(true)
            } else {
                true
            }
        }
        None => true,
    }
}
