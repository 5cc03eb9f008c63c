//! Translation request resolver.
//!
//! Turns one inbound message into either a direct reply (menu, selection
//! confirmation, instructional text) or a fully specified completion request.
//! The resolver performs no network I/O; its only side effect is mutating the
//! preference store. The caller executes the completion call and relays the
//! result.

use crate::detect::{Classification, Classifier};
use crate::languages::{Language, LanguageRegistry};
use crate::store::PreferenceStore;
use tracing::info;

/// Fixed apology the caller substitutes when the completion call fails or
/// returns no content. Single attempt, no retry; the user can resend.
pub const TRANSLATION_UNAVAILABLE: &str =
    "❌ Sorry, translation is unavailable right now. Please try sending your message again.";

const WELCOME: &str = "👋 Hello! I'm your AI translation assistant.\n\n\
    Send any message in any language, and I'll translate it for you!\n\n\
    Use /language to set your preferred target language for translations.";

const CHOOSE_LANGUAGE: &str = "Please select your preferred language for translations:";

const NO_PREFERENCE: &str = "I don't know which language to translate into yet. \
    Send me a message in your language first, or use /language to pick one.";

/// One button on the language-selection menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub callback_data: String,
}

/// The two turns handed to the completion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    /// Natural-language clause naming the translation direction, embedded in
    /// the system prompt. Kept separate so callers and tests can inspect it.
    pub direction_text: String,
    pub system_prompt: String,
    pub user_message: String,
}

/// Outcome of resolving one inbound message or callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing to do (empty text, unrecognized callback payload).
    Ignore,
    /// Send this text back to the conversation; no completion call.
    Reply(String),
    /// Show the language-selection menu; no completion call.
    ShowMenu {
        prompt: String,
        entries: Vec<MenuEntry>,
    },
    /// Call the completion API with this prompt and relay the result.
    Translate(CompletionPrompt),
}

pub struct Resolver {
    classifier: Box<dyn Classifier>,
}

impl Resolver {
    pub fn new(classifier: Box<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Resolve a plain text message from a conversation.
    pub fn resolve_message(
        &self,
        store: &PreferenceStore,
        conversation_id: i64,
        text: &str,
    ) -> Resolution {
        let text = text.trim();
        if text.is_empty() {
            return Resolution::Ignore;
        }

        match text {
            "/start" => return Resolution::Reply(WELCOME.to_string()),
            "/language" => return Resolution::ShowMenu {
                prompt: CHOOSE_LANGUAGE.to_string(),
                entries: language_menu(),
            },
            _ => {}
        }

        match self.classifier.classify(text) {
            Classification::English => self.resolve_english(store, conversation_id, text),
            Classification::NonEnglish { code } => {
                self.resolve_non_english(store, conversation_id, text, code)
            }
            // Detection failure fails toward translating to English, which
            // needs no stored preference
            Classification::Unknown => self.resolve_non_english(store, conversation_id, text, None),
        }
    }

    /// Resolve a button-press callback payload of the form `lang|<code>`.
    pub fn resolve_callback(
        &self,
        store: &PreferenceStore,
        conversation_id: i64,
        payload: &str,
    ) -> Resolution {
        let code = match payload.strip_prefix("lang|") {
            Some(code) => code,
            None => return Resolution::Ignore,
        };

        match Language::from_code(code) {
            Ok(language) => {
                if let Err(e) = store.set(conversation_id, language.code()) {
                    tracing::warn!(
                        "Failed to store language preference for {}: {}",
                        conversation_id,
                        e
                    );
                    return Resolution::Reply(TRANSLATION_UNAVAILABLE.to_string());
                }
                info!(
                    "Language preference for {} set to {}",
                    conversation_id,
                    language.code()
                );
                Resolution::Reply(format!(
                    "Your preferred language has been set to: {} {} ({})",
                    language.flag(),
                    language.name(),
                    language.native_name()
                ))
            }
            Err(_) => Resolution::Reply(format!(
                "Unknown language '{}'. Use /language to see the available options.",
                code
            )),
        }
    }

    fn resolve_english(
        &self,
        store: &PreferenceStore,
        conversation_id: i64,
        text: &str,
    ) -> Resolution {
        let code = match store.get(conversation_id) {
            Some(code) => code,
            None => return Resolution::Reply(NO_PREFERENCE.to_string()),
        };

        // A stale snapshot may hold a code the registry no longer supports;
        // treat it like no preference rather than failing the request
        let language = match Language::from_code(&code) {
            Ok(language) => language,
            Err(_) => return Resolution::Reply(NO_PREFERENCE.to_string()),
        };

        let direction_text = format!("translate this English text into {}", language.name());
        Resolution::Translate(build_prompt(direction_text, text))
    }

    fn resolve_non_english(
        &self,
        store: &PreferenceStore,
        conversation_id: i64,
        text: &str,
        detected_code: Option<String>,
    ) -> Resolution {
        // Auto-learn the sender's language so a later English message routes
        // back to it without an explicit selection. Never overwrites an
        // existing preference, and never aborts the translation.
        if let Some(code) = detected_code {
            if LanguageRegistry::get().is_supported(&code) && store.get(conversation_id).is_none() {
                info!("Auto-learned language {} for {}", code, conversation_id);
                store.set_best_effort(conversation_id, &code);
            }
        }

        let direction_text = "translate this text into fluent, natural English".to_string();
        Resolution::Translate(build_prompt(direction_text, text))
    }
}

/// All supported languages as menu entries, in registry order.
fn language_menu() -> Vec<MenuEntry> {
    LanguageRegistry::get()
        .list_all()
        .iter()
        .map(|lang| MenuEntry {
            label: lang.display_label(),
            callback_data: format!("lang|{}", lang.code),
        })
        .collect()
}

fn build_prompt(direction_text: String, text: &str) -> CompletionPrompt {
    let system_prompt = format!(
        "You are a world-class translator. Your task: {}. \
         The translation must be fluent and culturally natural, never literal or word-for-word. \
         Adapt numbers, expressions, and cultural references so the result reads as if written by a native speaker. \
         Reply with only the translated text. Do not add explanations or commentary, and do not repeat the original.",
        direction_text
    );

    CompletionPrompt {
        direction_text,
        system_prompt,
        user_message: text.to_string(),
    }
}
