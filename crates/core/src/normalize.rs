//! Conversion of a raw function unit into a canonical training record.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::{Granularity, Language, NormalizedRecord, RawFunctionUnit, Split};
use crate::tokens::{split_or_degrade, subtokenize};

/// Separator between scope components in an extractor identifier.
pub const SCOPE_SEPARATOR: char = '.';

/// Suffix appended to a retained identifier scope.
pub const SCOPE_SUFFIX: &str = "::";

/// Default name of the synthetic class wrapped around bare Java methods.
pub const DEFAULT_WRAPPER_CLASS: &str = "WRAPPER";

/// Knobs for record normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Emit `identifier_scope` on every record.
    pub retain_scope: bool,
    /// Class name used for the synthetic Java container.
    pub wrapper_class: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { retain_scope: true, wrapper_class: DEFAULT_WRAPPER_CLASS.to_string() }
    }
}

/// Pass-through provenance attached to every record of a target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordContext {
    pub split: Option<Split>,
    pub from_file: Option<String>,
}

/// Hex SHA-256 over the whitespace-stripped function text.
pub fn content_hash(function_text: &str) -> String {
    let digest = Sha256::digest(function_text.trim().as_bytes());
    format!("{:x}", digest)
}

/// Wrap Java source in a one-line synthetic class header and footer.
pub fn wrap_java(text: &str, wrapper_class: &str) -> String {
    format!("class {wrapper_class} {{\n{text}\n}}\n")
}

/// Prepare an input blob for extraction.
///
/// Method-granularity Java has no enclosing type and will not parse on its
/// own, so it is wrapped before it reaches the validator.
pub fn prepare_blob<'a>(
    language: Language,
    granularity: Granularity,
    blob: &'a str,
    options: &NormalizeOptions,
) -> Cow<'a, str> {
    match (language, granularity) {
        (Language::Java, Granularity::Method) => {
            Cow::Owned(wrap_java(blob, &options.wrapper_class))
        }
        _ => Cow::Borrowed(blob),
    }
}

/// Split a dotted identifier into `(scope, bare_name)`; the scope excludes the final dot.
pub fn split_identifier(identifier: &str) -> (&str, &str) {
    match identifier.rfind(SCOPE_SEPARATOR) {
        Some(idx) => (&identifier[..idx], &identifier[idx + 1..]),
        None => ("", identifier),
    }
}

/// Build the canonical record for one extracted function.
pub fn normalize(
    unit: &RawFunctionUnit,
    context: &RecordContext,
    options: &NormalizeOptions,
) -> NormalizedRecord {
    let (scope, bare_name) = split_identifier(&unit.identifier);
    let target_tokens = subtokenize(bare_name);
    let (elided_tokens, source_tokens) = split_or_degrade(bare_name, &unit.function_tokens);
    let sha256_hash = content_hash(&unit.function_text);

    let source_code = match unit.language {
        Language::Java => wrap_java(&unit.function_text, &options.wrapper_class),
        _ => unit.function_text.clone(),
    };

    NormalizedRecord {
        language: unit.language,
        identifier_scope: options.retain_scope.then(|| format!("{scope}{SCOPE_SUFFIX}")),
        identifier: bare_name.to_string(),
        target_tokens,
        source_tokens,
        elided_tokens,
        source_code,
        sha256_hash,
        split: context.split,
        from_file: context.from_file.clone(),
    }
}

/// Language-specific shape check applied before a record is emitted.
///
/// Java records must close both the method body and the synthetic wrapper;
/// anything else (abstract methods, stray trailing text) is unsuitable.
pub fn has_accepted_shape(record: &NormalizedRecord) -> bool {
    match record.language {
        Language::Java => record.source_code.ends_with("}\n}\n"),
        _ => true,
    }
}
