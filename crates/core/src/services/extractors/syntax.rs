//! Shared tree-sitter plumbing for the concrete extractors.

use tree_sitter::{Node, Parser, Tree};

use super::ExtractError;
use crate::model::{Language, RawFunctionUnit};

/// A parser configured once for a single language.
///
/// The tree built by [`SyntaxParser::is_well_formed`] is kept until the next
/// [`SyntaxParser::parse`] of the same blob, so validate-then-extract parses once.
pub(super) struct SyntaxParser {
    language: Language,
    parser: Parser,
    validated: Option<(String, Tree)>,
}

impl SyntaxParser {
    pub(super) fn new(
        language: Language,
        grammar: tree_sitter::Language,
    ) -> Result<Self, ExtractError> {
        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| ExtractError::Grammar { language, message: e.to_string() })?;
        Ok(Self { language, parser, validated: None })
    }

    pub(super) fn parse(&mut self, blob: &str) -> Result<Tree, ExtractError> {
        match self.validated.take() {
            Some((source, tree)) if source == blob => Ok(tree),
            _ => self.parse_fresh(blob),
        }
    }

    /// Parses with no error or missing nodes anywhere in the tree.
    pub(super) fn is_well_formed(&mut self, blob: &str) -> bool {
        self.validated = None;
        let Ok(tree) = self.parse_fresh(blob) else {
            return false;
        };
        let well_formed = !tree.root_node().has_error();
        if well_formed {
            self.validated = Some((blob.to_string(), tree));
        }
        well_formed
    }

    #[cfg(test)]
    pub(super) fn has_validated_tree(&self) -> bool {
        self.validated.is_some()
    }

    fn parse_fresh(&mut self, blob: &str) -> Result<Tree, ExtractError> {
        self.parser.parse(blob, None).ok_or(ExtractError::NoTree(self.language))
    }
}

pub(super) fn node_text<'s>(node: Node<'_>, src: &'s str) -> &'s str {
    src.get(node.byte_range()).unwrap_or_default()
}

pub(super) fn field_text<'s>(node: Node<'_>, field: &str, src: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field).map(|child| node_text(child, src))
}

/// Depth-first search for the first node of `kind`, including `node` itself.
pub(super) fn first_descendant<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    if node.kind() == kind {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(|child| first_descendant(child, kind))
}

/// Leaf texts of `node` in source order.
///
/// Comments are dropped; nodes whose kind is listed in `atomic` (string
/// literals) contribute their whole text as one token.
pub(super) fn leaf_tokens(node: Node<'_>, src: &str, atomic: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    push_leaves(node, src, atomic, &mut out);
    out
}

fn push_leaves(node: Node<'_>, src: &str, atomic: &[&str], out: &mut Vec<String>) {
    if node.kind().ends_with("comment") {
        return;
    }
    if node.child_count() == 0 || atomic.contains(&node.kind()) {
        let text = node_text(node, src).trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        push_leaves(child, src, atomic, out);
    }
}

/// Build a unit for a function node, qualifying `name` with the enclosing scope.
pub(super) fn function_unit(
    language: Language,
    scope: &[String],
    name: &str,
    node: Node<'_>,
    src: &str,
    atomic: &[&str],
) -> RawFunctionUnit {
    let identifier = if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope.join("."), name)
    };
    RawFunctionUnit::new(language, identifier, node_text(node, src), leaf_tokens(node, src, atomic))
}
