use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
    pub telegram_webhook_secret: String,
    pub public_url: Option<String>,

    // OpenAI
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,
    pub openai_temperature: f32,
    pub openai_max_tokens: u32,

    // Preference store (None = in-memory only)
    pub preferences_file: Option<String>,

    // Classifier: "whatlang" (statistical) or "ascii" (heuristic)
    pub classifier: String,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let telegram_webhook_secret = std::env::var("TELEGRAM_WEBHOOK_SECRET")
            .context("TELEGRAM_WEBHOOK_SECRET not set")?;
        validate_webhook_secret(&telegram_webhook_secret)?;

        Ok(Self {
            // Telegram
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN not set")?,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            telegram_webhook_secret,
            public_url: std::env::var("PUBLIC_URL").ok().filter(|s| !s.is_empty()),

            // OpenAI
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY not set")?,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            openai_temperature: std::env::var("OPENAI_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.3),
            openai_max_tokens: std::env::var("OPENAI_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),

            // Preference store
            preferences_file: std::env::var("PREFERENCES_FILE")
                .ok()
                .filter(|s| !s.is_empty()),

            // Classifier
            classifier: std::env::var("LANGUAGE_CLASSIFIER")
                .unwrap_or_else(|_| "whatlang".to_string()),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }
}

/// Telegram only accepts secret tokens of 1-256 characters from [A-Za-z0-9_].
/// Reject anything else at startup rather than at webhook registration time.
fn validate_webhook_secret(secret: &str) -> Result<()> {
    let pattern = regex::Regex::new(r"^[A-Za-z0-9_]{1,256}$").expect("valid regex");
    if !pattern.is_match(secret) {
        anyhow::bail!("TELEGRAM_WEBHOOK_SECRET must be 1-256 characters from [A-Za-z0-9_]");
    }
    Ok(())
}
