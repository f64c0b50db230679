use tree_sitter::Node;

use super::syntax::{field_text, function_unit, SyntaxParser};
use super::{ExtractError, FunctionExtractor, SyntaxValidator};
use crate::model::{Language, RawFunctionUnit};

const ATOMIC_KINDS: &[&str] = &["string"];

/// Module-level functions and class methods (through nested classes and decorators).
pub struct PythonExtractor {
    parser: SyntaxParser,
}

impl PythonExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        let parser = SyntaxParser::new(Language::Python, tree_sitter_python::LANGUAGE.into())?;
        Ok(Self { parser })
    }
}

impl SyntaxValidator for PythonExtractor {
    fn validate(&mut self, blob: &str) -> bool {
        self.parser.is_well_formed(blob)
    }
}

impl FunctionExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extract(&mut self, blob: &str) -> Result<Vec<RawFunctionUnit>, ExtractError> {
        let tree = self.parser.parse(blob)?;
        let mut units = Vec::new();
        collect(tree.root_node(), blob, &mut Vec::new(), &mut units);
        Ok(units)
    }

    fn validator(&mut self) -> Option<&mut dyn SyntaxValidator> {
        Some(self)
    }

    fn describe(&self) -> &'static str {
        "tree-sitter Python: module functions and class methods, validated"
    }
}

fn collect(node: Node<'_>, src: &str, scope: &mut Vec<String>, out: &mut Vec<RawFunctionUnit>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_definition(child, src, scope, out);
    }
}

fn visit_definition(
    node: Node<'_>,
    src: &str,
    scope: &mut Vec<String>,
    out: &mut Vec<RawFunctionUnit>,
) {
    match node.kind() {
        "function_definition" => {
            if let Some(name) = field_text(node, "name", src) {
                out.push(function_unit(Language::Python, scope, name, node, src, ATOMIC_KINDS));
            }
        }
        "class_definition" => {
            if let (Some(name), Some(body)) =
                (field_text(node, "name", src), node.child_by_field_name("body"))
            {
                scope.push(name.to_string());
                collect(body, src, scope, out);
                scope.pop();
            }
        }
        "decorated_definition" => {
            if let Some(definition) = node.child_by_field_name("definition") {
                visit_definition(definition, src, scope, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
import os

def top_level(a, b=1):
    """Docs."""
    # comment
    return a + b

class Outer:
    @staticmethod
    def helper():
        return "x y"

    class Inner:
        def getValue(self):
            def nested():
                pass
            return nested
"#;

    #[test]
    fn extracts_functions_with_scopes() {
        let mut extractor = PythonExtractor::new().unwrap();
        let units = extractor.extract(SOURCE).unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.identifier.as_str()).collect();
        assert_eq!(ids, vec!["top_level", "Outer.helper", "Outer.Inner.getValue"]);
        assert!(units[0].function_text.starts_with("def top_level(a, b=1):"));
        assert!(units.iter().all(|u| u.language == Language::Python));
    }

    #[test]
    fn tokens_skip_comments_and_keep_strings_whole() {
        let mut extractor = PythonExtractor::new().unwrap();
        let units = extractor.extract(SOURCE).unwrap();
        assert_eq!(&units[0].function_tokens[..4], &["def", "top_level", "(", "a"]);
        assert!(!units[0].function_tokens.iter().any(|t| t.starts_with('#')));
        assert!(units[1].function_tokens.contains(&"\"x y\"".to_string()));
    }

    #[test]
    fn validator_rejects_broken_source() {
        let mut extractor = PythonExtractor::new().unwrap();
        assert!(extractor.validate(SOURCE));
        assert!(!extractor.validate("def broken(:\n    pass"));
    }
}
