//! Guest list commands.

use anyhow::Result;
use comfy_table::Table;
use guestbook_core::api::guestbook::guests_to_csv;
use guestbook_core::gateway::ApiClient;

pub async fn list(client: &ApiClient, event_id: u64, csv: bool) -> Result<()> {
    let guests = client.list_guests(event_id).await?;

    if csv {
        println!("{}", guests_to_csv(&guests));
        return Ok(());
    }

    if guests.is_empty() {
        println!("No guests found for event {event_id}");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Email", "Phone", "Check-in"]);
    for guest in &guests {
        table.add_row(vec![
            guest.id.to_string(),
            guest.display_name().to_string(),
            guest.email.clone().unwrap_or_default(),
            guest.phone.clone().unwrap_or_default(),
            guest
                .created_at
                .clone()
                .unwrap_or_else(|| "Not checked in".to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}
