use crate::config::Config;
use crate::resolver::CompletionPrompt;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Execute one completion call for a resolved translation request.
///
/// Single attempt by design: on failure the caller sends a fixed apology and
/// the user can simply resend. Callers should run this under a bounded
/// timeout to avoid tying up a worker on a stalled upstream.
pub async fn translate(
    client: &reqwest::Client,
    config: &Config,
    prompt: &CompletionPrompt,
) -> Result<String> {
    let request = ChatRequest {
        model: config.openai_model.clone(),
        messages: vec![
            Message {
                role: "system".to_string(),
                content: prompt.system_prompt.clone(),
            },
            Message {
                role: "user".to_string(),
                content: prompt.user_message.clone(),
            },
        ],
        max_tokens: config.openai_max_tokens,
        temperature: config.openai_temperature,
    };

    let response = client
        .post(&config.openai_api_url)
        .header("Authorization", format!("Bearer {}", config.openai_api_key))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await
        .context("Failed to send request to OpenAI API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI API error ({}): {}", status, body);
    }

    let chat_response: ChatResponse = response
        .json()
        .await
        .context("Failed to parse OpenAI response")?;

    let translation = chat_response
        .choices
        .first()
        .map(|c| c.message.content.trim().to_string())
        .filter(|content| !content.is_empty())
        .context("OpenAI response contained no translation")?;

    Ok(translation)
}
