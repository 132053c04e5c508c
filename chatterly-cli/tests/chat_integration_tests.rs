//! Integration tests for the CLI chat command.

use assert_cmd::cargo::cargo_bin_cmd;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_chat_command_help() {
    let mut cmd = cargo_bin_cmd!("chatterly");
    cmd.arg("chat").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Open a room and chat live"))
        .stdout(predicates::str::contains("--room"));
}

#[test]
fn test_chat_command_requires_room() {
    let mut cmd = cargo_bin_cmd!("chatterly");
    cmd.arg("chat").timeout(Duration::from_secs(5));

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains(
            "the following required arguments were not provided",
        ))
        .stderr(predicates::str::contains("--room <ROOM>"));
}

#[test]
fn test_chat_command_requires_session() {
    let data_dir = TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("chatterly");
    cmd.env("CHATTERLY_DATA_DIR", data_dir.path())
        .env("CHATTERLY_API_URL", "http://127.0.0.1:9")
        .arg("chat")
        .arg("--room")
        .arg("r1")
        .timeout(Duration::from_secs(10));

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("not logged in"));
}

#[test]
fn test_chat_command_reports_unreachable_backend() {
    let data_dir = TempDir::new().unwrap();
    let session_dir = data_dir.path().join("session");
    std::fs::create_dir_all(&session_dir).unwrap();
    std::fs::write(session_dir.join("token.entry"), "tok-123").unwrap();
    std::fs::write(
        session_dir.join("user.entry"),
        r#"{"_id":"u1","email":"ada@example.com","username":"ada"}"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("chatterly");
    cmd.env("CHATTERLY_DATA_DIR", data_dir.path())
        .env("CHATTERLY_API_URL", "http://127.0.0.1:9")
        .env("CHATTERLY_SOCKET_URL", "ws://127.0.0.1:9/ws")
        .arg("chat")
        .arg("--room")
        .arg("r1")
        .timeout(Duration::from_secs(20));

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("failed to load rooms"));
}
