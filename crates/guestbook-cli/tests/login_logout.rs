//! Integration tests for login/logout/whoami commands.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a temp GUESTBOOK_HOME directory for test isolation.
fn temp_home() -> TempDir {
    TempDir::new().expect("create temp guestbook home")
}

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Test: login stores the session and greets the user.
#[tokio::test]
async fn test_login_stores_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "username": "ada",
                "email": "ada@example.com",
                "name": "Ada",
                "jwt": { "access": "tok1", "refresh": "refresh1" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .env("GUESTBOOK_BASE_URL", server.uri())
        .env("GUESTBOOK_BLOCK_REAL_API", "1")
        .args(["login", "--email", "ada@example.com", "--password", "hunter2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Ada"));

    let session_path = home.path().join("session.json");
    assert!(session_path.exists(), "session.json should exist");

    let contents = fs::read_to_string(&session_path).unwrap();
    assert!(contents.contains("tok1"), "access token should be stored");
    assert!(
        contents.contains("refresh1"),
        "refresh token should be stored"
    );
    assert!(contents.contains("ada"), "user profile should be stored");
}

/// Test: an empty password is rejected before any network call.
#[test]
fn test_login_rejects_empty_password() {
    let home = temp_home();

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .env("GUESTBOOK_BASE_URL", "http://127.0.0.1:9")
        .args(["login", "--email", "ada@example.com", "--password", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Password must not be empty"));
}

/// Test: logout when not logged in shows a message.
#[test]
fn test_logout_when_not_logged_in() {
    let home = temp_home();

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

/// Test: logout clears the stored session.
#[test]
fn test_logout_clears_session() {
    let home = temp_home();
    let session_path = home.path().join("session.json");
    fs::write(
        &session_path,
        json!({
            "token": "tok1",
            "refresh_token": "refresh1",
            "user": "{\"username\":\"ada\"}"
        })
        .to_string(),
    )
    .unwrap();

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    let contents = fs::read_to_string(&session_path).unwrap();
    assert!(
        !contents.contains("tok1"),
        "access token should be removed from session.json"
    );
    assert!(
        !contents.contains("refresh1"),
        "refresh token should be removed from session.json"
    );
}

/// Test: whoami prints the stored profile with a masked token.
#[test]
fn test_whoami_reads_profile() {
    let home = temp_home();
    let profile = json!({
        "username": "ada",
        "email": "ada@example.com",
        "name": "Ada"
    })
    .to_string();
    fs::write(
        home.path().join("session.json"),
        json!({
            "token": "a-rather-long-access-token",
            "refresh_token": "refresh1",
            "user": profile
        })
        .to_string(),
    )
    .unwrap();

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("ada@example.com"))
        .stdout(predicate::str::contains("a-rather-lon..."))
        .stdout(predicate::str::contains("a-rather-long-access-token").not());
}

/// Test: whoami without a session reports not logged in.
#[test]
fn test_whoami_not_logged_in() {
    let home = temp_home();

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}
