use tree_sitter::Node;

use super::syntax::{field_text, function_unit, SyntaxParser};
use super::{ExtractError, FunctionExtractor, SyntaxValidator};
use crate::model::{Language, RawFunctionUnit};

const ATOMIC_KINDS: &[&str] = &["string_literal", "character_literal", "text_block"];

const TYPE_DECLARATIONS: &[&str] =
    &["class_declaration", "interface_declaration", "enum_declaration", "record_declaration"];

const TYPE_BODIES: &[&str] =
    &["class_body", "interface_body", "enum_body", "enum_body_declarations"];

/// Methods and constructors of (possibly nested) type declarations.
pub struct JavaExtractor {
    parser: SyntaxParser,
}

impl JavaExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        let parser = SyntaxParser::new(Language::Java, tree_sitter_java::LANGUAGE.into())?;
        Ok(Self { parser })
    }
}

impl SyntaxValidator for JavaExtractor {
    fn validate(&mut self, blob: &str) -> bool {
        self.parser.is_well_formed(blob)
    }
}

impl FunctionExtractor for JavaExtractor {
    fn language(&self) -> Language {
        Language::Java
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
        "tree-sitter Java: methods and constructors, validated"
    }
}

fn collect(node: Node<'_>, src: &str, scope: &mut Vec<String>, out: &mut Vec<RawFunctionUnit>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = child.kind();
        if kind == "method_declaration" || kind == "constructor_declaration" {
            if let Some(name) = field_text(child, "name", src) {
                out.push(function_unit(Language::Java, scope, name, child, src, ATOMIC_KINDS));
            }
        } else if TYPE_DECLARATIONS.contains(&kind) {
            if let (Some(name), Some(body)) =
                (field_text(child, "name", src), child.child_by_field_name("body"))
            {
                scope.push(name.to_string());
                collect(body, src, scope, out);
                scope.pop();
            }
        } else if TYPE_BODIES.contains(&kind) {
            collect(child, src, scope, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
package demo;

public class Outer {
    private int x;

    public Outer(int x) { this.x = x; }

    // getter
    public int getX() { return x; }

    static class Inner {
        String greet() { return "hi there"; }
    }

    enum Mode {
        A, B;
        boolean isA() { return this == A; }
    }
}
"#;

    #[test]
    fn extracts_methods_and_constructors_with_scopes() {
        let mut extractor = JavaExtractor::new().unwrap();
        let units = extractor.extract(SOURCE).unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.identifier.as_str()).collect();
        assert_eq!(ids, vec!["Outer.Outer", "Outer.getX", "Outer.Inner.greet", "Outer.Mode.isA"]);
        assert_eq!(units[1].function_text, "public int getX() { return x; }");
        assert_eq!(
            units[1].function_tokens,
            vec!["public", "int", "getX", "(", ")", "{", "return", "x", ";", "}"]
        );
        assert!(units[2].function_tokens.contains(&"\"hi there\"".to_string()));
    }

    #[test]
    fn wrapped_method_parses_and_validates() {
        let mut extractor = JavaExtractor::new().unwrap();
        let wrapped = "class WRAPPER {\nvoid m(){}\n}\n";
        assert!(extractor.validate(wrapped));
        let units = extractor.extract(wrapped).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].identifier, "WRAPPER.m");
        assert_eq!(units[0].function_text, "void m(){}");
    }

    #[test]
    fn extraction_reuses_the_validated_tree() {
        let mut extractor = JavaExtractor::new().unwrap();
        let wrapped = "class W { void m(){} }";
        assert!(extractor.validate(wrapped));
        assert!(extractor.parser.has_validated_tree());
        assert_eq!(extractor.extract(wrapped).unwrap()[0].identifier, "W.m");
        assert!(!extractor.parser.has_validated_tree());

        // A different blob never sees the cached tree.
        assert!(extractor.validate(wrapped));
        let units = extractor.extract("class V { int a(){return 1;} int b(){return 2;} }").unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.identifier.as_str()).collect();
        assert_eq!(ids, vec!["V.a", "V.b"]);

        assert!(!extractor.validate("class A { void m() { }"));
        assert!(!extractor.parser.has_validated_tree());
    }

    #[test]
    fn bare_method_does_not_validate() {
        let mut extractor = JavaExtractor::new().unwrap();
        assert!(!extractor.validate("class A { void m() { }"));
    }
}
