//! Supported target languages.
//!
//! - `registry`: single source of truth for all supported target languages
//! - `language`: validated `Language` handle constructed from a code
//!
//! The set is static and never mutated at runtime. English is not in the
//! registry: it is the pivot language every non-English message is translated
//! into, never a selectable target.

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
