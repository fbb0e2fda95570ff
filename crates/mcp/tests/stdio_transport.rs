#![cfg(unix)]

use std::time::{Duration, Instant};

use chatkit_mcp::{Error, McpTransport, StdioTransport};
use serde_json::json;

fn shell(script: &str) -> StdioTransport {
    StdioTransport::new("sh", vec!["-c".to_owned(), script.to_owned()])
}

async fn wait_until_exited(transport: &mut StdioTransport) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while transport.is_alive() {
        assert!(Instant::now() < deadline, "the server did not exit");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_send_and_receive_lines() {
    let mut transport = StdioTransport::new("cat", vec![]);
    transport.start().unwrap();
    assert!(transport.is_alive());

    let message = json!({ "method": "test", "params": { "value": 42 } });
    transport.send(&message).await.unwrap();
    assert_eq!(transport.receive().await.unwrap(), message);

    let message = json!({ "message": "Hello 世界 🌍" });
    transport.send(&message).await.unwrap();
    assert_eq!(transport.receive().await.unwrap(), message);

    transport.stop().await;
    assert!(!transport.is_alive());
    let err = transport.send(&message).await.unwrap_err();
    assert!(matches!(err, Error::Exited));

    // Stopping again is a no-op.
    transport.stop().await;
}

#[tokio::test]
async fn test_workdir() {
    let dir = std::env::temp_dir();
    let script = r#"printf '{"cwd":"%s"}\n' "$(pwd -P)"; cat"#;
    let mut transport = shell(script).with_workdir(&dir);
    transport.start().unwrap();

    let message = transport.receive().await.unwrap();
    let expected = dir.canonicalize().unwrap();
    assert_eq!(message["cwd"], expected.to_string_lossy().as_ref());
    transport.stop().await;
}

#[tokio::test]
async fn test_exited_server() {
    let mut transport = shell("exit 0");
    transport.start().unwrap();
    wait_until_exited(&mut transport).await;

    let err = transport.send(&json!({})).await.unwrap_err();
    assert!(matches!(err, Error::Exited));
    let err = transport.receive().await.unwrap_err();
    assert!(matches!(err, Error::Exited));
    transport.stop().await;
}

#[tokio::test]
async fn test_bad_output() {
    let mut transport = shell("echo; echo not-json; sleep 5");
    transport.start().unwrap();

    let err = transport.receive().await.unwrap_err();
    assert!(matches!(err, Error::NoResponse));
    let err = transport.receive().await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    transport.stop().await;
}

#[tokio::test]
async fn test_spawn_failure() {
    let mut transport =
        StdioTransport::new("chatkit-surely-missing-server", vec![]);
    let err = transport.start().unwrap_err();
    assert!(matches!(err, Error::Spawn { .. }));

    let err = transport.send(&json!({})).await.unwrap_err();
    assert!(matches!(err, Error::NotStarted));
}

#[tokio::test]
async fn test_stop_kills_stubborn_server() {
    let mut transport = shell(r#"trap "" TERM; while :; do sleep 1; done"#)
        .with_stop_timeout(Duration::from_millis(200));
    transport.start().unwrap();
    assert!(transport.is_alive());

    let started = Instant::now();
    transport.stop().await;
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!transport.is_alive());
}
