//! Language classification for inbound messages.
//!
//! The resolver only needs one question answered: is this text English, and
//! if not, which language is it likely in? The answer is allowed to be
//! imprecise; an unknown verdict routes the message toward the
//! translate-to-English branch, which needs no stored preference.

use tracing::debug;

/// Verdict produced by a [`Classifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    English,
    /// Non-English text, with the detected ISO 639-1 source code when the
    /// detector could name one.
    NonEnglish { code: Option<String> },
    /// Detection failed or was too uncertain to trust.
    Unknown,
}

/// Swappable detection capability. Implementations must be cheap enough to
/// run on every inbound message.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Classification;
}

/// Build the classifier named in configuration. Unrecognized names fall back
/// to the statistical detector.
pub fn from_name(name: &str) -> Box<dyn Classifier> {
    match name {
        "ascii" => Box::new(AsciiClassifier),
        _ => Box::new(WhatlangClassifier::default()),
    }
}

/// Statistical trigram-based detection via whatlang.
pub struct WhatlangClassifier {
    /// Detections below this confidence are reported as Unknown.
    confidence_threshold: f64,
}

impl Default for WhatlangClassifier {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
        }
    }
}

impl Classifier for WhatlangClassifier {
    fn classify(&self, text: &str) -> Classification {
        let info = match whatlang::detect(text) {
            Some(info) => info,
            None => return Classification::Unknown,
        };

        debug!(
            "whatlang detected '{}' (confidence: {:.2})",
            info.lang().code(),
            info.confidence()
        );

        if info.confidence() < self.confidence_threshold {
            return Classification::Unknown;
        }

        if info.lang() == whatlang::Lang::Eng {
            Classification::English
        } else {
            Classification::NonEnglish {
                code: iso639_1(info.lang().code()).map(str::to_string),
            }
        }
    }
}

/// Heuristic fallback: text whose characters are all ASCII counts as English.
/// Wrong for accented Latin-script languages, but cheap and dependency-free;
/// misses fall toward the translate-to-English branch.
pub struct AsciiClassifier;

impl Classifier for AsciiClassifier {
    fn classify(&self, text: &str) -> Classification {
        static ASCII: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        let ascii = ASCII.get_or_init(|| regex::Regex::new(r"^[\x00-\x7F]+$").expect("valid regex"));

        if ascii.is_match(text) {
            Classification::English
        } else {
            // The heuristic cannot name the source language
            Classification::NonEnglish { code: None }
        }
    }
}

/// Map whatlang's ISO 639-3 codes to the 639-1 codes the registry uses.
/// Only the selectable target languages are mapped; anything else yields
/// None, which still translates to English but skips the auto-learn step.
fn iso639_1(code: &str) -> Option<&'static str> {
    match code {
        "pes" => Some("fa"),
        "fra" => Some("fr"),
        "deu" => Some("de"),
        "spa" => Some("es"),
        "ita" => Some("it"),
        "tur" => Some("tr"),
        "rus" => Some("ru"),
        "ara" => Some("ar"),
        "cmn" => Some("zh"),
        _ => None,
    }
}
