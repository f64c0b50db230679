use anyhow::Result;
use serde::Serialize;

use function_parser_core::services::extractors::default_extractor_registry;

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    pub extensions: Vec<String>,
    pub validated: bool,
    pub description: String,
}

/// Languages with an extractor compiled into this binary.
pub fn language_infos() -> Result<Vec<LanguageInfo>> {
    let registry = default_extractor_registry();
    let mut entries = Vec::new();
    for language in registry.languages() {
        let mut extractor = registry.build(language)?;
        entries.push(LanguageInfo {
            name: language.to_string(),
            extensions: language.extensions().iter().map(|e| e.to_string()).collect(),
            validated: extractor.validator().is_some(),
            description: extractor.describe().to_string(),
        });
    }
    Ok(entries)
}

pub fn languages_command(json: bool) -> Result<()> {
    let entries = language_infos()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Languages: (none)");
        return Ok(());
    }

    println!("Languages:");
    for entry in entries {
        println!("- {} [{}]: {}", entry.name, entry.extensions.join(", "), entry.description);
    }
    Ok(())
}
