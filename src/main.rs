use anyhow::Result;
use babelgram::{config, server, store, telegram};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("babelgram=info".parse()?),
        )
        .init();

    info!("Starting translation bot");

    // Load configuration from environment
    let config = config::Config::from_env()?;

    // Open the preference store (file-backed when configured)
    let store = match &config.preferences_file {
        Some(path) => {
            info!("Using file-backed preference store at {}", path);
            store::PreferenceStore::open(path)?
        }
        None => {
            info!("Using in-memory preference store");
            store::PreferenceStore::in_memory()
        }
    };

    let state = server::AppState::new(config, store);

    // Register the webhook with Telegram when a public URL is configured
    if let Some(public_url) = state.config.public_url.clone() {
        telegram::set_webhook(&state.config, &state.client, &public_url).await?;
    } else {
        info!("PUBLIC_URL not set, skipping webhook registration");
    }

    server::run(state).await
}
