//! Integration tests for notification channels using wiremock

use eventwatch::config::{DiscordConfig, RescanWindow};
use eventwatch::notify::{Boundary, DiscordChannel, NotifyChannel, TelegramChannel};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn telegram_channel(server: &MockServer, chat_ids: Vec<String>) -> TelegramChannel {
    TelegramChannel::new(
        format!("{}/bot-token/", server.uri()),
        chat_ids,
        RescanWindow {
            start_hour: 5,
            end_hour: 21,
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_telegram_sends_to_every_chat() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bot-token/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok": true}"#))
        .expect(2)
        .mount(&server)
        .await;

    let channel = telegram_channel(&server, vec!["100".to_string(), "200".to_string()]);
    let result = channel
        .notify_quest_reset("Community Day", Boundary::Start)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_telegram_failed_chat_does_not_block_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bot-token/sendMessage"))
        .and(query_param("chat_id", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"ok": false, "description": "Bad Request: chat not found"}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bot-token/sendMessage"))
        .and(query_param("chat_id", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok": true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let channel = telegram_channel(&server, vec!["100".to_string(), "200".to_string()]);
    let result = channel
        .notify_quest_reset("Community Day", Boundary::End)
        .await;

    // one destination succeeded, so the channel reports success
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_telegram_all_destinations_failing_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bot-token/sendMessage"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"ok": false, "description": "unauthorized"}"#),
        )
        .mount(&server)
        .await;

    let channel = telegram_channel(&server, vec!["100".to_string()]);
    let result = channel
        .notify_quest_reset("Community Day", Boundary::Start)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_discord_posts_embed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/abc"))
        .and(body_partial_json(serde_json::json!({
            "username": "Event Watch Bot",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let discord = DiscordConfig {
        enable: true,
        webhook_urls: vec![format!("{}/api/webhooks/1/abc", server.uri())],
        ..DiscordConfig::default()
    };
    let channel = DiscordChannel::from_config(&discord).unwrap();
    let result = channel
        .notify_quest_reset("Community Day", Boundary::Start)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_discord_rejected_webhook_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let discord = DiscordConfig {
        enable: true,
        webhook_urls: vec![format!("{}/api/webhooks/1/abc", server.uri())],
        ..DiscordConfig::default()
    };
    let channel = DiscordChannel::from_config(&discord).unwrap();
    let result = channel
        .notify_quest_reset("Community Day", Boundary::Start)
        .await;

    assert!(result.is_err());
}
