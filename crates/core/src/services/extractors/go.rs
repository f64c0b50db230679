use tree_sitter::Node;

use super::syntax::{field_text, first_descendant, function_unit, node_text, SyntaxParser};
use super::{ExtractError, FunctionExtractor};
use crate::model::{Language, RawFunctionUnit};

const ATOMIC_KINDS: &[&str] = &["interpreted_string_literal", "raw_string_literal", "rune_literal"];

/// Top-level functions and methods; methods are scoped by receiver type.
///
/// Go has no validator, so every blob passes the gate.
pub struct GoExtractor {
    parser: SyntaxParser,
}

impl GoExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        let parser = SyntaxParser::new(Language::Go, tree_sitter_go::LANGUAGE.into())?;
        Ok(Self { parser })
    }
}

impl FunctionExtractor for GoExtractor {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extract(&mut self, blob: &str) -> Result<Vec<RawFunctionUnit>, ExtractError> {
        let tree = self.parser.parse(blob)?;
        let root = tree.root_node();
        let mut cursor = root.walk();
        let units = root
            .children(&mut cursor)
            .filter_map(|child| function_from_node(child, blob))
            .collect();
        Ok(units)
    }

    fn describe(&self) -> &'static str {
        "tree-sitter Go: functions and methods, no validator"
    }
}

fn function_from_node(node: Node<'_>, src: &str) -> Option<RawFunctionUnit> {
    let name = field_text(node, "name", src)?;
    match node.kind() {
        "function_declaration" => {
            Some(function_unit(Language::Go, &[], name, node, src, ATOMIC_KINDS))
        }
        "method_declaration" => {
            let receiver = node
                .child_by_field_name("receiver")
                .and_then(|r| first_descendant(r, "type_identifier"))
                .map(|t| node_text(t, src).to_string());
            let scope: Vec<String> = receiver.into_iter().collect();
            Some(function_unit(Language::Go, &scope, name, node, src, ATOMIC_KINDS))
        }
        _ => None,
    }
}
