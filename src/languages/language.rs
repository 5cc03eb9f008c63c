//! Validated language handle backed by the registry.

use crate::languages::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};

/// A target language that has been validated against the registry.
///
/// Constructing one via [`Language::from_code`] guarantees the code is
/// supported; accessors never fail after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    code: &'static str,
}

impl Language {
    /// Create a Language from a language code string.
    ///
    /// Returns an error if the code is not in the registry.
    pub fn from_code(code: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_code(code) {
            // Use the static str from the registry
            Some(config) => Ok(Language { code: config.code }),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// ISO 639-1 code (e.g., "fa", "fr").
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Full registry entry for this language.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a Language constructed via `from_code`.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// English name used inside generated prompts (e.g., "French").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Native name (e.g., "Français").
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Flag emoji for menus and confirmations.
    pub fn flag(&self) -> &'static str {
        self.config().flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_french() {
        let language = Language::from_code("fr").expect("Should succeed");
        assert_eq!(language.code(), "fr");
        assert_eq!(language.name(), "French");
    }

    #[test]
    fn test_from_code_invalid() {
        let result = Language::from_code("xx");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown"));
    }

    #[test]
    fn test_from_code_empty() {
        assert!(Language::from_code("").is_err());
    }

    #[test]
    fn test_from_code_english_rejected() {
        assert!(Language::from_code("en").is_err());
    }

    #[test]
    fn test_config_access() {
        let lang = Language::from_code("es").unwrap();
        let config = lang.config();
        assert_eq!(config.code, "es");
        assert_eq!(config.name, "Spanish");
        assert_eq!(config.native_name, "Español");
    }

    #[test]
    fn test_accessors() {
        let lang = Language::from_code("ru").unwrap();
        assert_eq!(lang.name(), "Russian");
        assert_eq!(lang.native_name(), "Русский");
        assert_eq!(lang.flag(), "🇷🇺");
    }

    #[test]
    fn test_language_equality_and_copy() {
        let lang1 = Language::from_code("de").unwrap();
        let lang2 = lang1;
        assert_eq!(lang1, lang2);
        assert_ne!(lang1, Language::from_code("it").unwrap());
    }
}
