//! BDD step definitions for the Telegram notification feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};

use tws_sentinel::config::TelegramConfig;
use tws_sentinel::io::HttpClient;
use tws_sentinel::notifier::Notification;
use tws_sentinel::telegram::TelegramNotifier;

use crate::world::{RecordingHttpClient, SentinelWorld};

fn test_telegram_config() -> TelegramConfig {
    TelegramConfig {
        bot_token: "123456:test-token".to_string(),
        chat_id: "-100200300".to_string(),
        ..TelegramConfig::default()
    }
}

fn use_http(world: &mut SentinelWorld, http: RecordingHttpClient) {
    let http = Arc::new(http);
    let notifier = TelegramNotifier::new(
        &test_telegram_config(),
        Arc::clone(&http) as Arc<dyn HttpClient>,
    );
    world.http = Some(http);
    world.notifier = Some(Box::new(notifier));
}

#[given("a Telegram notifier with valid credentials")]
fn telegram_valid(world: &mut SentinelWorld) {
    use_http(
        world,
        RecordingHttpClient::answering(200, r#"{"ok":true,"result":{"message_id":7}}"#),
    );
}

#[given("a Telegram notifier whose bot token is rejected")]
fn telegram_rejected(world: &mut SentinelWorld) {
    use_http(
        world,
        RecordingHttpClient::answering(
            401,
            r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#,
        ),
    );
}

#[given("a Telegram notifier that is unreachable")]
fn telegram_unreachable(world: &mut SentinelWorld) {
    use_http(world, RecordingHttpClient::unreachable());
}

#[when(expr = "a {string} notification is sent for {string}")]
async fn send_notification(world: &mut SentinelWorld, kind: String, label: String) {
    let notification = match kind.as_str() {
        "started" => Notification::started(&label),
        "stopped" => Notification::stopped(&label),
        "down" => Notification::down(&label, "Connection refused"),
        "recovered" => Notification::recovered(&label, "2026-10-20 15:00:00 UTC"),
        "reminder" => Notification::reminder(&label, Duration::from_secs(3600), "timed out"),
        other => panic!("Unknown notification kind: {}", other),
    };
    let notifier = world.notifier.as_ref().expect("notifier not set");
    world.notification_result = Some(notifier.notify(&notification).await);
}

#[then("the notification should succeed")]
fn notification_succeeds(world: &mut SentinelWorld) {
    let result = world.notification_result.as_ref().expect("no result");
    result.as_ref().unwrap();
}

#[then(expr = "the notification should fail with an error mentioning {string}")]
fn notification_fails(world: &mut SentinelWorld, expected: String) {
    let result = world.notification_result.as_ref().expect("no result");
    let err = result.as_ref().expect_err("notification should have failed");
    assert!(err.to_string().contains(&expected), "error: {}", err);
}

#[then(expr = "the message should be posted to {string}")]
async fn posted_to(world: &mut SentinelWorld, url: String) {
    let http = world.http.as_ref().expect("http client not set");
    let requests = http.requests.read().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, url);
}

#[then(expr = "the form field {string} should be {string}")]
async fn form_field(world: &mut SentinelWorld, name: String, value: String) {
    let http = world.http.as_ref().expect("http client not set");
    assert_eq!(http.last_param(&name).await, Some(value));
}
