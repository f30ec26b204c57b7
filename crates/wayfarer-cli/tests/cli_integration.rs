//! CLI Integration Tests
//!
//! These run the `wayfarer` binary end-to-end. Nothing here reaches a real
//! backend: online commands point at a closed local port.

use std::time::Duration;

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use tempfile::TempDir;
use wayfarer_core::{CredentialStore, Storage, TokenKind};

/// Nothing listens on the discard port
const DEAD_API: &str = "http://127.0.0.1:9/api/v1/";

// ============================================================================
// Test Utilities
// ============================================================================

/// Create a CLI command with a temporary data directory
fn cli_cmd(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wayfarer").expect("Failed to find wayfarer binary");
    cmd.env_remove("WAYFARER_API_URL")
        .env_remove("WAYFARER_MAPS_KEY")
        .env_remove("WAYFARER_REALTIME_URL")
        .env_remove("WAYFARER_PASSWORD")
        .env_remove("RUST_LOG");
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

/// Store a token pair the way a successful login would
fn seed_session(data_dir: &TempDir) {
    let storage = Storage::new(data_dir.path().join("wayfarer.redb")).unwrap();
    storage
        .save_token(TokenKind::Access, "acc", Duration::from_secs(3600))
        .unwrap();
    storage
        .save_token(TokenKind::Refresh, "ref", Duration::from_secs(3600))
        .unwrap();
}

fn write_png(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_pixel(64, 48, Rgb([200, 40, 40]))
        .save(&path)
        .unwrap();
    path
}

// ============================================================================
// Info Command Tests
// ============================================================================

#[test]
fn test_info_command() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wayfarer v"))
        .stdout(predicate::str::contains("Data directory:"))
        .stdout(predicate::str::contains("Session:        none"))
        .stdout(predicate::str::contains("Places:         not configured"));
}

#[test]
fn test_info_derives_realtime_url() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .args(["--api-url", "https://api.example.com/api/v1", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://api.example.com/api/v1/"))
        .stdout(predicate::str::contains("wss://api.example.com/socket.io/"));
}

#[test]
fn test_info_reports_stored_session() {
    let data_dir = TempDir::new().unwrap();
    seed_session(&data_dir);

    cli_cmd(&data_dir)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session:        active"));
}

#[test]
fn test_bad_api_url_is_rejected() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .args(["--api-url", "ftp://example.com", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// Session Command Tests
// ============================================================================

#[test]
fn test_logout_without_session() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));
}

#[test]
fn test_logout_clears_session_when_server_unreachable() {
    let data_dir = TempDir::new().unwrap();
    seed_session(&data_dir);

    cli_cmd(&data_dir)
        .args(["--api-url", DEAD_API, "logout"])
        .assert()
        .success();

    cli_cmd(&data_dir)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session:        none"));
}

#[test]
fn test_login_validates_before_sending() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .args(["--api-url", DEAD_API, "login", "not-an-email", "--password", "pw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Enter a valid email address"));
}

#[test]
fn test_login_network_failure_shows_generic_message() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .args([
            "--api-url",
            DEAD_API,
            "login",
            "ana@example.com",
            "--password",
            "secret123",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Something went wrong"));
}

#[test]
fn test_online_commands_require_login() {
    let data_dir = TempDir::new().unwrap();

    for args in [
        vec!["feed"],
        vec!["whoami"],
        vec!["chats", "list"],
        vec!["chats", "listen"],
        vec!["notifications", "list"],
        vec!["journey", "create-text", "hello"],
        vec!["search", "lisbon"],
    ] {
        cli_cmd(&data_dir)
            .args(["--api-url", DEAD_API])
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("not logged in"));
    }
}

#[test]
fn test_feed_with_session_but_no_server() {
    let data_dir = TempDir::new().unwrap();
    seed_session(&data_dir);

    cli_cmd(&data_dir)
        .args(["--api-url", DEAD_API, "feed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Something went wrong"));
}

// ============================================================================
// Argument Tests
// ============================================================================

#[test]
fn test_unknown_search_scope() {
    let data_dir = TempDir::new().unwrap();
    seed_session(&data_dir);

    cli_cmd(&data_dir)
        .args(["--api-url", DEAD_API, "search", "porto", "--scope", "planets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown search scope"));
}

#[test]
fn test_places_requires_key() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .args(["places", "geocode", "Lisbon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_video_journey_needs_known_type() {
    let data_dir = TempDir::new().unwrap();
    seed_session(&data_dir);
    let clip = data_dir.path().join("clip.bin");
    std::fs::write(&clip, b"not really a video").unwrap();

    cli_cmd(&data_dir)
        .args(["--api-url", DEAD_API, "journey", "create-video"])
        .arg(&clip)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--mime"));
}

// ============================================================================
// Compose Command Tests
// ============================================================================

#[test]
fn test_compose_photo_with_overlay() {
    let data_dir = TempDir::new().unwrap();
    let input = write_png(&data_dir, "in.png");
    let output = data_dir.path().join("out.jpg");

    cli_cmd(&data_dir)
        .arg("compose")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--scale", "1.5", "--rotate", "-15", "--pan", "10,-20"])
        .args(["--text", "Hello Lisbon", "--color", "#FFD700"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1080x1920 JPEG"));

    let written = image::open(&output).unwrap();
    assert_eq!(written.width(), 1080);
    assert_eq!(written.height(), 1920);
}

#[test]
fn test_compose_text_card() {
    let data_dir = TempDir::new().unwrap();
    let output = data_dir.path().join("card.jpg");

    cli_cmd(&data_dir)
        .arg("compose")
        .arg("--output")
        .arg(&output)
        .args(["--text", "Day one", "--background", "#123"])
        .assert()
        .success();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn test_compose_prints_data_uri() {
    let data_dir = TempDir::new().unwrap();
    let output = data_dir.path().join("card.jpg");

    cli_cmd(&data_dir)
        .arg("compose")
        .arg("--output")
        .arg(&output)
        .args(["--text", "Hi", "--data-uri"])
        .assert()
        .success()
        .stdout(predicate::str::contains("data:image/jpeg;base64,"));
}

#[test]
fn test_compose_text_card_needs_text() {
    let data_dir = TempDir::new().unwrap();
    let output = data_dir.path().join("card.jpg");

    cli_cmd(&data_dir)
        .arg("compose")
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs --text"));
    assert!(!output.exists());
}

#[test]
fn test_compose_undecodable_input() {
    let data_dir = TempDir::new().unwrap();
    let input = data_dir.path().join("broken.png");
    std::fs::write(&input, b"definitely not a png").unwrap();

    cli_cmd(&data_dir)
        .arg("compose")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(data_dir.path().join("out.jpg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to process image"));
}

#[test]
fn test_compose_bad_color() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .arg("compose")
        .arg("--output")
        .arg(data_dir.path().join("out.jpg"))
        .args(["--text", "Hi", "--color", "gold"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to process image"));
}

// ============================================================================
// Realtime Listen Tests
// ============================================================================

#[test]
fn test_chats_listen_applies_frames_from_stdin() {
    let data_dir = TempDir::new().unwrap();
    let frames = concat!(
        "2\n",
        r#"42["new-chat",{"data":{"attributes":{"id":"c1","participants":[],"unreadCount":0}}}]"#,
        "\n",
        r#"42["new-message",{"data":{"attributes":{"id":"m1","chatId":"c1","sender":{"id":"u2","name":"Bo"},"content":"hi","createdAt":"2026-01-01T10:00:00Z"}}}]"#,
        "\n",
        "not a frame\n",
    );

    cli_cmd(&data_dir)
        .args(["chats", "listen", "--stdin", "--me", "u1"])
        .write_stdin(frames)
        .assert()
        .success()
        .stdout(predicate::str::contains("new chat c1"))
        .stdout(predicate::str::contains("message m1 in chat c1"))
        .stdout(predicate::str::contains("4 frames: 2 applied"));
}

#[test]
fn test_chats_listen_stdin_needs_user() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .args(["chats", "listen", "--stdin"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--me"));
}

#[test]
fn test_bad_realtime_url_is_rejected() {
    let data_dir = TempDir::new().unwrap();

    cli_cmd(&data_dir)
        .args(["--realtime-url", "ftp://example.com", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
