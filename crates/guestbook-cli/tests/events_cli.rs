//! Integration tests for event and guest commands against a mock backend.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Creates a temp GUESTBOOK_HOME with a stored session.
fn logged_in_home(access: &str, refresh: &str) -> TempDir {
    let home = TempDir::new().expect("create temp guestbook home");
    fs::write(
        home.path().join("session.json"),
        json!({
            "token": access,
            "refresh_token": refresh,
            "user": "{\"username\":\"ada\"}"
        })
        .to_string(),
    )
    .expect("seed session.json");
    home
}

/// Test: `events list` renders a table from a paginated response.
#[tokio::test]
async fn test_events_list_renders_table() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok1", "refresh1");
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events/"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "10"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "results": [
                {
                    "id": 1,
                    "name": "Launch Party",
                    "start_date": "2026-09-01T18:00:00Z",
                    "is_offline": true,
                    "venue_name": "Grand Hall",
                    "city": "Bandung",
                    "guests_count": 42
                },
                {
                    "id": 2,
                    "title": "Webinar",
                    "is_offline": false
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .env("GUESTBOOK_BASE_URL", server.uri())
        .env("GUESTBOOK_BLOCK_REAL_API", "1")
        .args(["events", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Launch Party"))
        .stdout(predicate::str::contains("Grand Hall, Bandung"))
        .stdout(predicate::str::contains("Webinar"))
        .stdout(predicate::str::contains("Online"))
        .stdout(predicate::str::contains("Page 1 of 1"));
}

/// Test: an expired token is refreshed transparently and the new token
/// is persisted to the session file.
#[tokio::test]
async fn test_events_list_refreshes_expired_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("stale", "refresh1");
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events/"))
        .respond_with(|req: &Request| {
            let authorized = req
                .headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value == "Bearer tok2");
            if authorized {
                ResponseTemplate::new(200).set_body_json(json!([]))
            } else {
                ResponseTemplate::new(401).set_body_json(json!({
                    "detail": "Token expired"
                }))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token/"))
        .and(body_json(json!({ "refresh": "refresh1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "access": "tok2" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .env("GUESTBOOK_BASE_URL", server.uri())
        .env("GUESTBOOK_BLOCK_REAL_API", "1")
        .args(["events", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No events found"));

    let contents = fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(
        contents.contains("tok2"),
        "refreshed access token should be persisted"
    );
}

/// Test: a rejected refresh clears the session and reports expiry.
#[tokio::test]
async fn test_events_list_session_expiry() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("stale", "dead-refresh");
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .env("GUESTBOOK_BASE_URL", server.uri())
        .env("GUESTBOOK_BLOCK_REAL_API", "1")
        .args(["events", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session Expired"));

    let contents = fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(
        !contents.contains("stale"),
        "expired credentials should be cleared"
    );
}

/// Test: `events create` posts the full draft payload.
#[tokio::test]
async fn test_events_create_sends_payload() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok1", "refresh1");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/events/"))
        .and(header("authorization", "Bearer tok1"))
        .and(body_json(json!({
            "name": "Launch Party",
            "start_date": "2026-09-01T18:00:00Z",
            "end_date": null,
            "is_offline": true,
            "venue_name": "Grand Hall",
            "address": null,
            "city": "Bandung",
            "msg_template": null,
            "feedback_template": null
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": 7, "name": "Launch Party" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .env("GUESTBOOK_BASE_URL", server.uri())
        .env("GUESTBOOK_BLOCK_REAL_API", "1")
        .args([
            "events",
            "create",
            "--name",
            "Launch Party",
            "--start-date",
            "2026-09-01T18:00:00Z",
            "--venue",
            "Grand Hall",
            "--city",
            "Bandung",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Event created"));
}

/// Test: `events qr` prints a data URI built from the raw base64 payload.
#[tokio::test]
async fn test_events_qr_prints_data_uri() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok1", "refresh1");
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events/qr/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "name": "Launch Party", "qr_code": "aGVsbG8=" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .env("GUESTBOOK_BASE_URL", server.uri())
        .env("GUESTBOOK_BLOCK_REAL_API", "1")
        .args(["events", "qr", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Event: Launch Party"))
        .stdout(predicate::str::contains("data:image/png;base64,aGVsbG8="));
}

/// Test: `guests --csv` emits CSV with the header row.
#[tokio::test]
async fn test_guests_csv_output() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = logged_in_home("tok1", "refresh1");
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/events/guestbook/"))
        .and(query_param("event", "7"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "id": 1,
                    "name": "Jane Doe",
                    "email": "jane@example.com",
                    "phone": "555-0100",
                    "created_at": "2026-09-01T19:03:00Z"
                },
                { "id": 2, "name": "Walk-in, guest" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("guestbook")
        .env("GUESTBOOK_HOME", home.path())
        .env("GUESTBOOK_BASE_URL", server.uri())
        .env("GUESTBOOK_BLOCK_REAL_API", "1")
        .args(["guests", "--event", "7", "--csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name,Email,Phone,Check-in Time"))
        .stdout(predicate::str::contains(
            "Jane Doe,jane@example.com,555-0100,2026-09-01T19:03:00Z",
        ))
        .stdout(predicate::str::contains("\"Walk-in, guest\",,,Not checked in"));
}
