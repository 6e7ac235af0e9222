//! Closed classification of tree-sitter node kinds
//!
//! Tree-sitter exposes node kinds as loosely-typed strings. The extractors
//! never dispatch on those strings directly: each kind of interest is mapped
//! here into a closed enum, and the visitors match on the enum exhaustively.
//! Adding a variant without handling it everywhere then fails to compile
//! instead of silently extracting nothing.

/// Declaration-shaped nodes the symbol extractor handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclNode {
    Function,
    GeneratorFunction,
    FunctionExpression,
    ArrowFunction,
    MethodDefinition,
    Class,
    AbstractClass,
    Interface,
    TypeAlias,
    Enum,
    LexicalDeclaration,
    VariableDeclaration,
    ExportStatement,
}

impl DeclNode {
    pub fn classify(kind: &str) -> Option<DeclNode> {
        match kind {
            "function_declaration" => Some(DeclNode::Function),
            "generator_function_declaration" => Some(DeclNode::GeneratorFunction),
            "function_expression" | "generator_function" => Some(DeclNode::FunctionExpression),
            "arrow_function" => Some(DeclNode::ArrowFunction),
            "method_definition" => Some(DeclNode::MethodDefinition),
            "class_declaration" => Some(DeclNode::Class),
            "abstract_class_declaration" => Some(DeclNode::AbstractClass),
            "interface_declaration" => Some(DeclNode::Interface),
            "type_alias_declaration" => Some(DeclNode::TypeAlias),
            "enum_declaration" => Some(DeclNode::Enum),
            "lexical_declaration" => Some(DeclNode::LexicalDeclaration),
            "variable_declaration" => Some(DeclNode::VariableDeclaration),
            "export_statement" => Some(DeclNode::ExportStatement),
            _ => None,
        }
    }

    /// Kinds whose `name` field is a declared identifier, not a usage.
    pub fn declares_type_name(kind: &str) -> bool {
        matches!(
            kind,
            "class_declaration"
                | "abstract_class_declaration"
                | "interface_declaration"
                | "type_alias_declaration"
                | "enum_declaration"
                | "type_parameter"
        )
    }
}

/// Usage-site nodes the reference extractor handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageNode {
    ImportStatement,
    CallExpression,
    MemberExpression,
    /// Computed member access (`obj[key]`) - recognized so it can be skipped
    /// deliberately rather than falling through.
    SubscriptExpression,
    TypeIdentifier,
    NestedTypeIdentifier,
    GenericType,
    TypeQuery,
}

impl UsageNode {
    pub fn classify(kind: &str) -> Option<UsageNode> {
        match kind {
            "import_statement" => Some(UsageNode::ImportStatement),
            "call_expression" => Some(UsageNode::CallExpression),
            "member_expression" => Some(UsageNode::MemberExpression),
            "subscript_expression" => Some(UsageNode::SubscriptExpression),
            "type_identifier" => Some(UsageNode::TypeIdentifier),
            "nested_type_identifier" => Some(UsageNode::NestedTypeIdentifier),
            "generic_type" => Some(UsageNode::GenericType),
            "type_query" => Some(UsageNode::TypeQuery),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decl_classification() {
        assert_eq!(DeclNode::classify("function_declaration"), Some(DeclNode::Function));
        assert_eq!(DeclNode::classify("interface_declaration"), Some(DeclNode::Interface));
        assert_eq!(DeclNode::classify("binary_expression"), None);
    }

    #[test]
    fn test_usage_classification() {
        assert_eq!(UsageNode::classify("call_expression"), Some(UsageNode::CallExpression));
        assert_eq!(UsageNode::classify("subscript_expression"), Some(UsageNode::SubscriptExpression));
        assert_eq!(UsageNode::classify("identifier"), None);
    }
}
