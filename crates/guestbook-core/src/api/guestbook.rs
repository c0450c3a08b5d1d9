//! Guest list retrieval and CSV rendering.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{read_json, unwrap_data};
use crate::gateway::{ApiClient, RequestOptions};

/// A guestbook entry: one guest who signed in at an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestEntry {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Check-in timestamp.
    #[serde(default, alias = "checkInTime")]
    pub created_at: Option<String>,
}

impl GuestEntry {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

impl ApiClient {
    /// Lists the guestbook entries for an event.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn list_guests(&self, event_id: u64) -> Result<Vec<GuestEntry>> {
        let response = self
            .request(
                &format!("events/guestbook/?event={event_id}"),
                RequestOptions::default(),
            )
            .await?;
        let body = unwrap_data(read_json(response).await?);
        serde_json::from_value(body).context("failed to parse guest list")
    }
}

/// Renders a guest list as CSV: a header row plus one row per guest.
pub fn guests_to_csv(guests: &[GuestEntry]) -> String {
    let mut lines = vec!["Name,Email,Phone,Check-in Time".to_string()];
    for guest in guests {
        let row = [
            guest.display_name(),
            guest.email.as_deref().unwrap_or(""),
            guest.phone.as_deref().unwrap_or(""),
            guest.created_at.as_deref().unwrap_or("Not checked in"),
        ];
        lines.push(
            row.iter()
                .map(|field| csv_field(field))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Quotes a field when it would otherwise break the row.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
