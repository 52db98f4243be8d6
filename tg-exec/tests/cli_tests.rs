//! End-to-end tests for the `tg-exec` binary.
//!
//! Each test runs the real executable with a scrubbed environment and,
//! where delivery is involved, a local Bot API stub.

#![cfg(unix)]

use std::collections::HashMap;
use std::path::Path;
use std::process::Output;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::routing::post;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::process::Command;

#[derive(Default)]
struct BotApi {
    healthy: bool,
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

async fn send_message(
    State(api): State<Arc<BotApi>>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    api.calls.fetch_add(1, Ordering::SeqCst);
    api.texts
        .lock()
        .push(form.get("text").cloned().unwrap_or_default());

    if api.healthy {
        (StatusCode::OK, r#"{"ok":true,"result":{}}"#)
    } else {
        (
            StatusCode::BAD_GATEWAY,
            r#"{"ok":false,"description":"Bad Gateway"}"#,
        )
    }
}

async fn spawn_bot_api(healthy: bool) -> (Arc<BotApi>, String) {
    let api = Arc::new(BotApi {
        healthy,
        ..Default::default()
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/{bot}/sendMessage", post(send_message))
        .with_state(api.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (api, format!("http://{addr}"))
}

/// A `tg-exec` invocation isolated from the host's environment and
/// user config.
fn tg_exec(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tg-exec"));
    cmd.env_clear()
        .env("PATH", std::env::var("PATH").unwrap_or_default())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn with_bot(cmd: &mut Command, api_base: &str) {
    cmd.env("TELEGRAM_BOT_TOKEN", "123:TEST")
        .env("TELEGRAM_CHAT_ID", "42")
        .env("TG_EXEC_API_URL", api_base)
        .env("TG_EXEC_RETRIES", "1")
        .env("TG_EXEC_HTTP_TIMEOUT", "5");
}

async fn output(mut cmd: Command) -> Output {
    cmd.output().await.unwrap()
}

#[tokio::test]
async fn missing_credentials_exit_before_running_command() {
    let home = tempfile::tempdir().unwrap();
    let marker = home.path().join("ran");

    let mut cmd = tg_exec(home.path());
    cmd.arg("touch").arg(&marker);
    let out = output(cmd).await;

    assert_eq!(out.status.code(), Some(2));
    assert!(!marker.exists());
    assert!(String::from_utf8_lossy(&out.stderr).contains("TOKEN/CHAT_ID not set"));
}

#[tokio::test]
async fn missing_command_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let out = output(tg_exec(home.path())).await;
    assert_eq!(out.status.code(), Some(2));
}

#[tokio::test]
async fn reports_and_propagates_exit_code() {
    let (api, base) = spawn_bot_api(true).await;
    let home = tempfile::tempdir().unwrap();

    let mut cmd = tg_exec(home.path());
    with_bot(&mut cmd, &base);
    cmd.args(["echo", "'hello <world>'", ";", "exit", "3"]);
    let out = output(cmd).await;

    assert_eq!(out.status.code(), Some(3));
    // Output is mirrored live, unescaped.
    assert_eq!(String::from_utf8_lossy(&out.stdout), "hello <world>\n");

    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    let text = api.texts.lock()[0].clone();
    assert!(text.contains("<b>Command failed</b>"));
    assert!(text.contains("<pre>echo 'hello &lt;world&gt;' ; exit 3</pre>"));
    assert!(text.contains("Exit code: 3"));
    assert!(text.contains("<pre>hello &lt;world&gt;\n</pre>"));
}

#[tokio::test]
async fn strict_mode_turns_delivery_failure_into_exit_70() {
    let (api, base) = spawn_bot_api(false).await;
    let home = tempfile::tempdir().unwrap();

    let mut cmd = tg_exec(home.path());
    with_bot(&mut cmd, &base);
    cmd.env("TG_EXEC_STRICT", "1").arg("true");
    let out = output(cmd).await;

    assert_eq!(out.status.code(), Some(70));
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    assert!(
        String::from_utf8_lossy(&out.stderr).contains("failed to send Telegram message")
    );
}

#[tokio::test]
async fn non_strict_mode_keeps_command_exit_code() {
    let (_api, base) = spawn_bot_api(false).await;
    let home = tempfile::tempdir().unwrap();

    let mut cmd = tg_exec(home.path());
    with_bot(&mut cmd, &base);
    cmd.arg("true");
    let out = output(cmd).await;

    assert_eq!(out.status.code(), Some(0));
    assert!(
        String::from_utf8_lossy(&out.stderr).contains("failed to send Telegram message")
    );
}

#[tokio::test]
async fn credentials_from_user_config_file() {
    let (api, base) = spawn_bot_api(true).await;
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join(".config").join("tg-exec");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.conf"),
        format!(
            "# tg-exec\nTOKEN=\"123:TEST\"\nCHAT_ID=42\nNOTE=nightly # job\nAPI_URL={base}\nALWAYS=0\n"
        ),
    )
    .unwrap();

    let mut cmd = tg_exec(home.path());
    cmd.args(["echo", "quiet"]);
    let out = output(cmd).await;

    assert_eq!(out.status.code(), Some(0));
    let text = api.texts.lock()[0].clone();
    assert!(text.contains("Command completed successfully"));
    assert!(text.contains("Note: <b>nightly</b>"));
    assert!(!text.contains("Output:"));
}

#[tokio::test]
async fn unstartable_command_is_reported_as_exit_1() {
    let (api, base) = spawn_bot_api(true).await;
    let home = tempfile::tempdir().unwrap();

    let mut cmd = tg_exec(home.path());
    with_bot(&mut cmd, &base);
    cmd.env("PATH", "/nonexistent").arg("true");
    let out = output(cmd).await;

    assert_eq!(out.status.code(), Some(1));
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    let text = api.texts.lock()[0].clone();
    assert!(text.contains("<b>Command failed</b>"));
    assert!(text.contains("Exit code: 1"));
    assert!(text.contains("failed to start command"));
}
