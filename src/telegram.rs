use crate::config::Config;
use crate::openai;
use crate::resolver::{MenuEntry, Resolution, Resolver, TRANSLATION_UNAVAILABLE};
use crate::store::PreferenceStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// Telegram webhook types
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
    /// Sender's declared client locale; informational only, classification
    /// works from the message text
    #[allow(dead_code)]
    pub language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[allow(dead_code)]
    pub r#type: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest {
    chat_id: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct EditMessageTextRequest {
    chat_id: String,
    message_id: i64,
    text: String,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardButton {
    text: String,
    callback_data: String,
}

/// Process one accepted webhook update end to end: resolve it, run the
/// completion call when one is required, and send the reply. All failures are
/// local to this update.
pub async fn handle_update(
    config: &Config,
    store: &PreferenceStore,
    resolver: &Resolver,
    client: &reqwest::Client,
    update: Update,
) -> Result<()> {
    if let Some(callback) = update.callback_query {
        return handle_callback(config, store, resolver, client, callback).await;
    }

    let message = match update.message {
        Some(msg) => msg,
        None => return Ok(()), // Not a message update, ignore
    };

    let text = match message.text {
        Some(t) => t,
        None => return Ok(()), // No text, ignore
    };

    let chat_id = message.chat.id;
    info!("Received message from {}: {}", chat_id, text);

    match resolver.resolve_message(store, chat_id, &text) {
        Resolution::Ignore => Ok(()),
        Resolution::Reply(reply) => send_message(config, client, chat_id, &reply, None).await,
        Resolution::ShowMenu { prompt, entries } => {
            let markup = build_language_keyboard(&entries);
            send_message(config, client, chat_id, &prompt, Some(markup)).await
        }
        Resolution::Translate(prompt) => {
            let reply = match openai::translate(client, config, &prompt).await {
                Ok(translation) => translation,
                Err(e) => {
                    warn!("Translation failed for {}: {:#}", chat_id, e);
                    TRANSLATION_UNAVAILABLE.to_string()
                }
            };
            send_message(config, client, chat_id, &reply, None).await
        }
    }
}

async fn handle_callback(
    config: &Config,
    store: &PreferenceStore,
    resolver: &Resolver,
    client: &reqwest::Client,
    callback: CallbackQuery,
) -> Result<()> {
    // Stop the client-side spinner even if the payload turns out to be junk
    if let Err(e) = answer_callback_query(config, client, &callback.id).await {
        warn!("Failed to answer callback query {}: {}", callback.id, e);
    }

    let chat_id = match callback.message.as_ref().map(|m| m.chat.id) {
        Some(id) => id,
        None => return Ok(()), // No originating chat, nothing to reply to
    };

    let data = match callback.data.as_deref() {
        Some(d) => d,
        None => return Ok(()),
    };

    info!("Received callback from {}: {}", chat_id, data);

    match resolver.resolve_callback(store, chat_id, data) {
        Resolution::Reply(reply) => {
            // Replace the menu message with the confirmation where possible
            if let Some(menu_message) = &callback.message {
                edit_message_text(config, client, chat_id, menu_message.message_id, &reply).await
            } else {
                send_message(config, client, chat_id, &reply, None).await
            }
        }
        _ => Ok(()),
    }
}

/// Arrange menu entries as inline keyboard rows, two buttons per row.
fn build_language_keyboard(entries: &[MenuEntry]) -> InlineKeyboardMarkup {
    let inline_keyboard = entries
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|entry| InlineKeyboardButton {
                    text: entry.label.clone(),
                    callback_data: entry.callback_data.clone(),
                })
                .collect()
        })
        .collect();

    InlineKeyboardMarkup { inline_keyboard }
}

/// Send a Telegram message to a specific chat, optionally with an inline
/// keyboard.
async fn send_message(
    config: &Config,
    client: &reqwest::Client,
    chat_id: i64,
    text: &str,
    reply_markup: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let url = format!(
        "{}/bot{}/sendMessage",
        config.telegram_api_url, config.telegram_bot_token
    );

    let request = SendMessageRequest {
        chat_id: chat_id.to_string(),
        text: text.to_string(),
        reply_markup,
    };

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .context("Failed to send request to Telegram API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Telegram API error ({}): {}", status, body);
    }

    Ok(())
}

/// Replace the text of an already-sent message (used to swap the language
/// menu for the selection confirmation).
async fn edit_message_text(
    config: &Config,
    client: &reqwest::Client,
    chat_id: i64,
    message_id: i64,
    text: &str,
) -> Result<()> {
    let url = format!(
        "{}/bot{}/editMessageText",
        config.telegram_api_url, config.telegram_bot_token
    );

    let request = EditMessageTextRequest {
        chat_id: chat_id.to_string(),
        message_id,
        text: text.to_string(),
    };

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .context("Failed to send request to Telegram API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Telegram API error ({}): {}", status, body);
    }

    Ok(())
}

/// Acknowledge a callback query so the client stops showing a progress
/// indicator.
async fn answer_callback_query(
    config: &Config,
    client: &reqwest::Client,
    callback_query_id: &str,
) -> Result<()> {
    let url = format!(
        "{}/bot{}/answerCallbackQuery",
        config.telegram_api_url, config.telegram_bot_token
    );

    let response = client
        .post(&url)
        .json(&serde_json::json!({ "callback_query_id": callback_query_id }))
        .send()
        .await
        .context("Failed to send request to Telegram API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Telegram API error ({}): {}", status, body);
    }

    Ok(())
}

/// Register this bot's webhook with Telegram on startup. Pending updates are
/// dropped so a redeploy does not replay a backlog.
pub async fn set_webhook(config: &Config, client: &reqwest::Client, public_url: &str) -> Result<()> {
    let webhook_url = format!("{}/webhook", public_url.trim_end_matches('/'));
    let url = format!(
        "{}/bot{}/setWebhook",
        config.telegram_api_url, config.telegram_bot_token
    );

    let response = client
        .post(&url)
        .json(&serde_json::json!({
            "url": webhook_url,
            "secret_token": config.telegram_webhook_secret,
            "drop_pending_updates": true,
        }))
        .send()
        .await
        .context("Failed to send setWebhook request to Telegram API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Telegram setWebhook error ({}): {}", status, body);
    }

    info!("Webhook registered at {}", webhook_url);
    Ok(())
}
