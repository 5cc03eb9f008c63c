//! Language registry: single source of truth for selectable target languages.

use std::sync::OnceLock;

/// Metadata for one supported target language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "fa", "fr")
    pub code: &'static str,

    /// English name of the language, used inside generated prompts
    /// (e.g., "Persian (Farsi)", "French")
    pub name: &'static str,

    /// Native name of the language (e.g., "فارسی", "Français")
    pub native_name: &'static str,

    /// Flag emoji shown on menu buttons
    pub flag: &'static str,
}

impl LanguageConfig {
    /// Label rendered on the inline keyboard button (e.g., "🇫🇷 French").
    pub fn display_label(&self) -> String {
        format!("{} {}", self.flag, self.name)
    }
}

/// Global language registry singleton, initialized lazily and immutable
/// thereafter.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Look up a language by its ISO 639-1 code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// All supported languages in menu order.
    pub fn list_all(&self) -> &[LanguageConfig] {
        &self.languages
    }

    /// Check whether a code names a supported target language.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

/// The fixed set of selectable target languages.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "fa",
            name: "Persian (Farsi)",
            native_name: "فارسی",
            flag: "🇮🇷",
        },
        LanguageConfig {
            code: "fr",
            name: "French",
            native_name: "Français",
            flag: "🇫🇷",
        },
        LanguageConfig {
            code: "de",
            name: "German",
            native_name: "Deutsch",
            flag: "🇩🇪",
        },
        LanguageConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            flag: "🇪🇸",
        },
        LanguageConfig {
            code: "it",
            name: "Italian",
            native_name: "Italiano",
            flag: "🇮🇹",
        },
        LanguageConfig {
            code: "tr",
            name: "Turkish",
            native_name: "Türkçe",
            flag: "🇹🇷",
        },
        LanguageConfig {
            code: "ru",
            name: "Russian",
            native_name: "Русский",
            flag: "🇷🇺",
        },
        LanguageConfig {
            code: "ar",
            name: "Arabic",
            native_name: "العربية",
            flag: "🇸🇦",
        },
        LanguageConfig {
            code: "zh",
            name: "Chinese",
            native_name: "中文",
            flag: "🇨🇳",
        },
    ]
}
