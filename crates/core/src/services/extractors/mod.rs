//! Function extractor and syntax validator contracts.
//!
//! One extractor variant exists per supported language. New languages are
//! added by implementing [`FunctionExtractor`] and registering a factory in
//! [`ExtractorRegistry`], never by branching on language deeper in the
//! pipeline.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{Language, RawFunctionUnit};

#[cfg(any(feature = "python-extractor", feature = "java-extractor", feature = "go-extractor"))]
mod syntax;

#[cfg(feature = "go-extractor")]
pub mod go;
#[cfg(feature = "java-extractor")]
pub mod java;
#[cfg(feature = "python-extractor")]
pub mod python;

#[cfg(feature = "go-extractor")]
pub use go::GoExtractor;
#[cfg(feature = "java-extractor")]
pub use java::JavaExtractor;
#[cfg(feature = "python-extractor")]
pub use python::PythonExtractor;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No extractor registered for language {0}")]
    UnsupportedLanguage(Language),
    #[error("Failed to load {language} grammar: {message}")]
    Grammar { language: Language, message: String },
    #[error("{0} parser produced no syntax tree")]
    NoTree(Language),
    #[error("Extractor error: {0}")]
    Other(String),
}

/// Whole-blob syntax check run before extraction.
pub trait SyntaxValidator {
    /// `true` when `blob` is a syntactically complete program.
    fn validate(&mut self, blob: &str) -> bool;
}

/// Language-specific extractor yielding raw function units.
///
/// Instances hold mutable parser state and are never shared: each worker
/// builds its own through the registry.
pub trait FunctionExtractor: Send {
    fn language(&self) -> Language;

    fn extract(&mut self, blob: &str) -> Result<Vec<RawFunctionUnit>, ExtractError>;

    /// Validator for this language, when one exists.
    fn validator(&mut self) -> Option<&mut dyn SyntaxValidator> {
        None
    }

    /// Short description shown by `languages`.
    fn describe(&self) -> &'static str;
}

pub type ExtractorFactory =
    Box<dyn Fn() -> Result<Box<dyn FunctionExtractor>, ExtractError> + Send + Sync>;

/// Registry of extractor factories; callers select by language.
#[derive(Default)]
pub struct ExtractorRegistry {
    factories: HashMap<Language, ExtractorFactory>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    pub fn register<F>(&mut self, language: Language, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn FunctionExtractor>, ExtractError> + Send + Sync + 'static,
    {
        self.factories.insert(language, Box::new(factory));
        self
    }

    pub fn supports(&self, language: Language) -> bool {
        self.factories.contains_key(&language)
    }

    /// Sorted list of registered languages for help and error messages.
    pub fn languages(&self) -> Vec<Language> {
        let mut keys: Vec<Language> = self.factories.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Build a fresh, independently configured extractor.
    pub fn build(&self, language: Language) -> Result<Box<dyn FunctionExtractor>, ExtractError> {
        let factory =
            self.factories.get(&language).ok_or(ExtractError::UnsupportedLanguage(language))?;
        factory()
    }

    /// Per-worker cache of extractors, built lazily on first use.
    pub fn worker(&self) -> WorkerExtractors<'_> {
        WorkerExtractors { registry: self, built: HashMap::new() }
    }
}

/// Extractors owned by a single worker.
pub struct WorkerExtractors<'a> {
    registry: &'a ExtractorRegistry,
    built: HashMap<Language, Box<dyn FunctionExtractor>>,
}

impl WorkerExtractors<'_> {
    pub fn get(&mut self, language: Language) -> Result<&mut dyn FunctionExtractor, ExtractError> {
        if !self.built.contains_key(&language) {
            let extractor = self.registry.build(language)?;
            self.built.insert(language, extractor);
        }
        self.built
            .get_mut(&language)
            .map(|extractor| extractor.as_mut() as &mut dyn FunctionExtractor)
            .ok_or(ExtractError::UnsupportedLanguage(language))
    }

    /// Drop a possibly inconsistent extractor so the next target rebuilds it.
    pub fn discard(&mut self, language: Language) {
        self.built.remove(&language);
    }
}

/// Registry holding every extractor compiled into this build.
pub fn default_extractor_registry() -> ExtractorRegistry {
    #[allow(unused_mut)]
    let mut registry = ExtractorRegistry::new();
    #[cfg(feature = "python-extractor")]
    registry.register(Language::Python, || Ok(Box::new(PythonExtractor::new()?)));
    #[cfg(feature = "java-extractor")]
    registry.register(Language::Java, || Ok(Box::new(JavaExtractor::new()?)));
    #[cfg(feature = "go-extractor")]
    registry.register(Language::Go, || Ok(Box::new(GoExtractor::new()?)));
    registry
}
