//! Event CRUD, the slim dashboard listing, exports and the public QR lookup.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ensure_ok, read_json, unwrap_data};
use crate::gateway::{ApiClient, RequestOptions};

/// An event record as returned by the backend.
///
/// Deployments disagree on some field names (`name`/`title`,
/// `guests_count`/`guests`), so parsing is tolerant and everything except the
/// id is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    #[serde(default, alias = "title")]
    pub name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Events default to in-person when the backend omits the flag.
    #[serde(default = "default_offline")]
    pub is_offline: bool,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub msg_template: Option<String>,
    #[serde(default)]
    pub feedback_template: Option<String>,
    #[serde(default, alias = "guests")]
    pub guests_count: Option<u64>,
}

fn default_offline() -> bool {
    true
}

impl Event {
    /// Display name with the backend's fallback for unnamed events.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled Event")
    }

    /// "Venue, City" for in-person events, "Online" otherwise.
    pub fn display_location(&self) -> String {
        if !self.is_offline {
            return "Online".to_string();
        }
        let parts: Vec<&str> = [self.venue_name.as_deref(), self.city.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            "In-person".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Fields accepted by the create and update endpoints.
///
/// Absent optionals serialize as explicit nulls, which is what the backend
/// expects for cleared fields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventDraft {
    pub name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_offline: bool,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub msg_template: Option<String>,
    pub feedback_template: Option<String>,
}

/// One page of events plus whatever pagination the backend disclosed.
#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total_count: Option<u64>,
    pub total_pages: Option<u64>,
}

impl EventPage {
    /// Total pages, computed from the count when the backend did not say.
    pub fn page_count(&self, page_size: u32) -> Option<u64> {
        if self.total_pages.is_some() {
            return self.total_pages;
        }
        let count = self.total_count?;
        Some(count.div_ceil(u64::from(page_size.max(1))).max(1))
    }
}

/// Query filter for the slim event listing used by the dashboard.
#[derive(Debug, Clone)]
pub enum SlimFilter {
    /// Events in a category ("upcoming", "ongoing", "past"), paginated.
    Category {
        category: String,
        page: u32,
        page_size: u32,
    },
    /// Events starting on a specific day.
    OnDate(NaiveDate),
}

impl SlimFilter {
    fn endpoint(&self) -> String {
        match self {
            SlimFilter::Category {
                category,
                page,
                page_size,
            } => {
                format!("events/slim/?category={category}&page_size={page_size}&page={page}")
            }
            SlimFilter::OnDate(date) => {
                format!("events/slim/?start_date={}", date.format("%Y-%m-%d"))
            }
        }
    }
}

/// QR payload for an event's public check-in page.
#[derive(Debug, Clone)]
pub struct EventQr {
    pub name: Option<String>,
    /// Absolute URL, or a data URI synthesized from a raw base64 payload.
    pub qr_url: Option<String>,
}

/// Accepts the three event-list shapes seen in the wild: a plain array, the
/// DRF `{count, results}` envelope, and the `{data, ...}` wrapper.
fn parse_event_page(body: Value) -> Result<EventPage> {
    // Plain array: no pagination metadata at all.
    if body.is_array() {
        let events: Vec<Event> =
            serde_json::from_value(body).context("failed to parse event records")?;
        let total = events.len() as u64;
        return Ok(EventPage {
            events,
            total_count: Some(total),
            total_pages: None,
        });
    }

    // DRF envelope.
    if let Some(results) = body.get("results").filter(|value| value.is_array()) {
        let events =
            serde_json::from_value(results.clone()).context("failed to parse event records")?;
        return Ok(EventPage {
            events,
            total_count: body.get("count").and_then(Value::as_u64),
            total_pages: None,
        });
    }

    // `{ data: [...] }` wrapper with assorted count fields.
    if let Some(data) = body.get("data").filter(|value| value.is_array()) {
        let events =
            serde_json::from_value(data.clone()).context("failed to parse event records")?;
        let total_count = body
            .get("total_count")
            .and_then(Value::as_u64)
            .or_else(|| body.get("count").and_then(Value::as_u64))
            .or_else(|| body.pointer("/meta/total").and_then(Value::as_u64));
        return Ok(EventPage {
            events,
            total_count,
            total_pages: body.get("total_pages").and_then(Value::as_u64),
        });
    }

    bail!("unrecognized event list response: {body}");
}

/// Pulls the QR payload out of the assorted shapes the endpoint returns.
fn parse_event_qr(body: &Value) -> EventQr {
    let data = body.get("data").unwrap_or(body);

    let name = data
        .get("name")
        .or_else(|| data.get("title"))
        .and_then(Value::as_str)
        .map(ToString::to_string);

    let raw = data
        .get("qr_code")
        .or_else(|| data.get("qr_image"))
        .or_else(|| body.get("qr_code"))
        .and_then(Value::as_str)
        .filter(|raw| !raw.is_empty());

    let qr_url = raw.map(|raw| {
        if raw.starts_with("http") || raw.starts_with("data:") {
            raw.to_string()
        } else {
            // Raw base64 payload; wrap it so it renders as an image.
            format!("data:image/png;base64,{raw}")
        }
    });

    EventQr { name, qr_url }
}

impl ApiClient {
    /// Lists events, one page at a time.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-success status, or an
    /// unrecognized response shape.
    pub async fn list_events(&self, page: u32, page_size: u32) -> Result<EventPage> {
        let endpoint = format!("events/?page={page}&page_size={page_size}");
        let response = self.request(&endpoint, RequestOptions::default()).await?;
        parse_event_page(read_json(response).await?)
    }

    /// Lists events through the slim dashboard endpoint.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn list_events_slim(&self, filter: &SlimFilter) -> Result<Vec<Event>> {
        let response = self
            .request(&filter.endpoint(), RequestOptions::default())
            .await?;
        let body = unwrap_data(read_json(response).await?);
        serde_json::from_value(body).context("failed to parse slim event list")
    }

    /// Fetches a single event.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn get_event(&self, id: u64) -> Result<Event> {
        let response = self
            .request(&format!("events/{id}/"), RequestOptions::default())
            .await?;
        let body = unwrap_data(read_json(response).await?);
        serde_json::from_value(body).context("failed to parse event")
    }

    /// Creates an event. The backend answers 201 on success.
    ///
    /// # Errors
    /// Returns an error on transport failure or any status other than 201.
    pub async fn create_event(&self, draft: &EventDraft) -> Result<()> {
        let response = self
            .request("events/", RequestOptions::json(Method::POST, draft)?)
            .await?;
        if response.status() == StatusCode::CREATED {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("event creation failed (HTTP {status}): {body}");
    }

    /// Updates an event in place.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn update_event(&self, id: u64, draft: &EventDraft) -> Result<()> {
        let response = self
            .request(
                &format!("events/{id}/"),
                RequestOptions::json(Method::PATCH, draft)?,
            )
            .await?;
        ensure_ok(response, "event update").await
    }

    /// Deletes an event.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn delete_event(&self, id: u64) -> Result<()> {
        let response = self
            .request(
                &format!("events/{id}/"),
                RequestOptions::new(Method::DELETE),
            )
            .await?;
        ensure_ok(response, "event deletion").await
    }

    /// Requests a server-side export of an event's details.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn export_event(&self, id: u64) -> Result<()> {
        let response = self
            .request(
                &format!("events/{id}/export/"),
                RequestOptions::new(Method::POST),
            )
            .await?;
        ensure_ok(response, "event export").await
    }

    /// Fetches the public QR payload for an event. No bearer token is sent;
    /// the endpoint is reachable without a session.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn event_qr(&self, id: u64) -> Result<EventQr> {
        let response = self
            .http()
            .get(self.url(&format!("events/qr/{id}/")))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .context("QR code request failed")?;
        let body = read_json(response).await?;
        Ok(parse_event_qr(&body))
    }
}
