//! Core data model for raw function units and normalized training records.
//!
//! `RawFunctionUnit` is what an extractor hands back for one function and is
//! consumed immediately by the normalizer. `NormalizedRecord` is the atomic
//! element of the emitted corpus.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Source languages the pipeline knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Go,
}

impl Language {
    /// All languages, in a stable order.
    pub const ALL: [Language; 3] = [Language::Python, Language::Java, Language::Go];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Go => "go",
        }
    }

    /// File extensions that hold source for this language.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py"],
            Language::Java => &["java"],
            Language::Go => &["go"],
        }
    }

    /// Extension used when writing a function's raw source next to its record.
    pub fn source_extension(self) -> &'static str {
        self.extensions()[0]
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Language::ALL.into_iter().find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|ext| ext.to_str()).and_then(Self::from_extension)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "go" | "golang" => Ok(Language::Go),
            other => Err(format!("Unsupported language '{}'. Allowed: python, java, go", other)),
        }
    }
}

/// Corpus partition a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    /// Input order used by the triple-split corpus mode.
    pub const ALL: [Split; 3] = [Split::Test, Split::Train, Split::Valid];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an input blob is a whole file or an already isolated method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    File,
    Method,
}

/// One function as produced by an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFunctionUnit {
    pub language: Language,
    /// Dot-delimited scope path ending in the bare name (e.g. `Outer.Inner.method`).
    pub identifier: String,
    /// Full source text of the function as written.
    pub function_text: String,
    /// Lexical tokens covering `function_text` in order.
    pub function_tokens: Vec<String>,
}

impl RawFunctionUnit {
    pub fn new(
        language: Language,
        identifier: impl Into<String>,
        function_text: impl Into<String>,
        function_tokens: Vec<String>,
    ) -> Self {
        Self {
            language,
            identifier: identifier.into(),
            function_text: function_text.into(),
            function_tokens,
        }
    }
}

/// Canonical training record; one JSON line per record in every output mode.
///
/// Field order matches the emitted JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_scope: Option<String>,
    pub identifier: String,
    pub target_tokens: Vec<String>,
    pub source_tokens: Vec<String>,
    pub elided_tokens: Vec<String>,
    pub source_code: String,
    pub sha256_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<Split>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_file: Option<String>,
}
