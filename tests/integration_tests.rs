//! Integration tests for the translation bot.
//!
//! These run the real axum router against wiremock stand-ins for the
//! Telegram and OpenAI APIs, driving it over HTTP the way Telegram's webhook
//! delivery would.

use std::time::Duration;

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

use babelgram::config::Config;
use babelgram::resolver::TRANSLATION_UNAVAILABLE;
use babelgram::server::{build_router, AppState};
use babelgram::store::PreferenceStore;

const SECRET: &str = "test_webhook_secret";
const BOT_TOKEN: &str = "test-token";

// ==================== Test Helpers ====================

struct TestBot {
    base_url: String,
    state: AppState,
    telegram: MockServer,
    openai: MockServer,
    client: reqwest::Client,
}

/// Create a test config pointing at mocked Telegram/OpenAI endpoints
fn create_test_config(telegram_url: &str, openai_url: &str) -> Config {
    Config {
        telegram_bot_token: BOT_TOKEN.to_string(),
        telegram_api_url: telegram_url.to_string(),
        telegram_webhook_secret: SECRET.to_string(),
        public_url: None,
        openai_api_key: "test-openai-key".to_string(),
        openai_model: "gpt-4o-mini".to_string(),
        openai_api_url: format!("{}/v1/chat/completions", openai_url),
        openai_temperature: 0.3,
        openai_max_tokens: 1000,
        preferences_file: None,
        classifier: "whatlang".to_string(),
        port: 0,
    }
}

/// Start the router on an ephemeral port with mocked upstreams.
async fn start_bot(store: PreferenceStore) -> TestBot {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;

    let config = create_test_config(&telegram.uri(), &openai.uri());
    let state = AppState::new(config, store);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let router = build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });

    TestBot {
        base_url: format!("http://{}", addr),
        state,
        telegram,
        openai,
        client: reqwest::Client::new(),
    }
}

impl TestBot {
    /// POST a webhook update with the shared secret attached.
    async fn post_update(&self, update: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/webhook", self.base_url))
            .header("X-Telegram-Bot-Api-Secret-Token", SECRET)
            .json(&update)
            .send()
            .await
            .expect("request")
    }

    /// Wait until the mocked Telegram API has received `n` sendMessage (or
    /// editMessageText) calls, observing the request bodies.
    async fn wait_for_outbound(&self, n: usize) -> Vec<serde_json::Value> {
        for _ in 0..100 {
            let bodies = self.outbound_bodies().await;
            if bodies.len() >= n {
                return bodies;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("timed out waiting for {} outbound Telegram calls", n);
    }

    async fn outbound_bodies(&self) -> Vec<serde_json::Value> {
        self.telegram
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| {
                let p = r.url.path();
                p.ends_with("/sendMessage") || p.ends_with("/editMessageText")
            })
            .map(|r| serde_json::from_slice(&r.body).expect("json body"))
            .collect()
    }
}

fn message_update(chat_id: i64, text: &str) -> serde_json::Value {
    json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "from": {"id": chat_id, "first_name": "Test", "language_code": "en"},
            "chat": {"id": chat_id, "type": "private"},
            "text": text
        }
    })
}

fn callback_update(chat_id: i64, data: &str) -> serde_json::Value {
    json!({
        "update_id": 2,
        "callback_query": {
            "id": "cbq-1",
            "from": {"id": chat_id, "first_name": "Test"},
            "message": {
                "message_id": 20,
                "chat": {"id": chat_id, "type": "private"}
            },
            "data": data
        }
    })
}

fn openai_response(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ]
    })
}

/// Accept every Telegram bot API call with a success envelope.
async fn mock_telegram_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(server)
        .await;
}

// ==================== Health Endpoint ====================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let bot = start_bot(PreferenceStore::in_memory()).await;

    let response = bot
        .client
        .get(format!("{}/health", bot.base_url))
        .send()
        .await
        .expect("request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.expect("body"), "ok");
}

// ==================== Webhook Authentication ====================

#[tokio::test]
async fn test_webhook_without_secret_is_rejected() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;

    let response = bot
        .client
        .post(format!("{}/webhook", bot.base_url))
        .json(&callback_update(7, "lang|fr"))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 401);

    // No state mutated, no reply sent
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(bot.state.store.get(7), None);
    assert!(bot.outbound_bodies().await.is_empty());
}

#[tokio::test]
async fn test_webhook_with_wrong_secret_is_rejected() {
    let bot = start_bot(PreferenceStore::in_memory()).await;

    let response = bot
        .client
        .post(format!("{}/webhook", bot.base_url))
        .header("X-Telegram-Bot-Api-Secret-Token", "not_the_secret")
        .json(&message_update(7, "Hello"))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_webhook_with_secret_is_accepted() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;

    let response = bot.post_update(json!({"update_id": 5})).await;
    assert!(response.status().is_success());
}

// ==================== Language Selection Flow ====================

#[tokio::test]
async fn test_language_command_sends_menu_keyboard() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;

    bot.post_update(message_update(7, "/language")).await;

    let bodies = bot.wait_for_outbound(1).await;
    let keyboard = &bodies[0]["reply_markup"]["inline_keyboard"];
    let rows = keyboard.as_array().expect("keyboard rows");
    assert_eq!(rows.len(), 5); // nine languages, two per row
    assert_eq!(rows[0].as_array().unwrap().len(), 2);

    let flattened = serde_json::to_string(keyboard).expect("serialize");
    assert!(flattened.contains("lang|fa"));
    assert!(flattened.contains("lang|zh"));
}

#[tokio::test]
async fn test_valid_callback_sets_preference_and_confirms() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;

    let response = bot.post_update(callback_update(7, "lang|fr")).await;
    assert!(response.status().is_success());

    let bodies = bot.wait_for_outbound(1).await;
    assert!(bodies[0]["text"].as_str().unwrap().contains("French"));
    assert_eq!(bot.state.store.get(7), Some("fr".to_string()));
}

#[tokio::test]
async fn test_invalid_callback_reports_unknown_language() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;

    bot.post_update(callback_update(7, "lang|xx")).await;

    let bodies = bot.wait_for_outbound(1).await;
    assert!(bodies[0]["text"].as_str().unwrap().contains("Unknown language"));
    assert_eq!(bot.state.store.get(7), None);
}

#[tokio::test]
async fn test_callback_persists_to_preferences_file() {
    let temp_dir = tempfile::TempDir::new().expect("temp dir");
    let prefs_path = temp_dir.path().join("prefs.json");
    let store = PreferenceStore::open(&prefs_path).expect("open");

    let bot = start_bot(store).await;
    mock_telegram_ok(&bot.telegram).await;

    bot.post_update(callback_update(9, "lang|ar")).await;
    bot.wait_for_outbound(1).await;

    let contents = std::fs::read_to_string(&prefs_path).expect("read snapshot");
    let map: serde_json::Value = serde_json::from_str(&contents).expect("parse");
    assert_eq!(map["9"], "ar");
}

// ==================== Translation Flow ====================

#[tokio::test]
async fn test_english_without_preference_gets_instructions_and_no_completion_call() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;

    // No completion call may happen on this path
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_response("nope")))
        .expect(0)
        .mount(&bot.openai)
        .await;

    bot.post_update(message_update(7, "Hello, how is the weather looking today?"))
        .await;

    let bodies = bot.wait_for_outbound(1).await;
    assert!(bodies[0]["text"].as_str().unwrap().contains("/language"));
}

#[tokio::test]
async fn test_english_with_preference_is_translated() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;
    bot.state.store.set(7, "fr").expect("seed preference");

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "Hello, I would like to order a coffee please"}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openai_response("Bonjour, je voudrais commander un café")),
        )
        .expect(1)
        .mount(&bot.openai)
        .await;

    bot.post_update(message_update(7, "Hello, I would like to order a coffee please"))
        .await;

    let bodies = bot.wait_for_outbound(1).await;
    assert_eq!(
        bodies[0]["text"].as_str().unwrap(),
        "Bonjour, je voudrais commander un café"
    );
}

#[tokio::test]
async fn test_non_english_is_translated_to_english_and_auto_learned() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_response("Hello everyone")))
        .expect(1)
        .mount(&bot.openai)
        .await;

    bot.post_update(message_update(
        7,
        "Bonjour tout le monde, comment allez-vous aujourd'hui?",
    ))
    .await;

    let bodies = bot.wait_for_outbound(1).await;
    assert_eq!(bodies[0]["text"].as_str().unwrap(), "Hello everyone");
    assert_eq!(bot.state.store.get(7), Some("fr".to_string()));
}

#[tokio::test]
async fn test_completion_failure_sends_fixed_apology() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;
    bot.state.store.set(7, "de").expect("seed preference");

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1) // single attempt, no retry
        .mount(&bot.openai)
        .await;

    bot.post_update(message_update(7, "Hello, this message will not get translated"))
        .await;

    let bodies = bot.wait_for_outbound(1).await;
    assert_eq!(bodies[0]["text"].as_str().unwrap(), TRANSLATION_UNAVAILABLE);
}

// ==================== Malformed Updates ====================

#[tokio::test]
async fn test_message_without_text_is_ignored() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;

    let update = json!({
        "update_id": 3,
        "message": {
            "message_id": 30,
            "chat": {"id": 7, "type": "private"}
        }
    });

    let response = bot.post_update(update).await;
    assert!(response.status().is_success());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(bot.outbound_bodies().await.is_empty());
}

#[tokio::test]
async fn test_update_with_neither_message_nor_callback_is_ignored() {
    let bot = start_bot(PreferenceStore::in_memory()).await;
    mock_telegram_ok(&bot.telegram).await;

    let response = bot.post_update(json!({"update_id": 4})).await;
    assert!(response.status().is_success());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(bot.outbound_bodies().await.is_empty());
}
