//! Event management commands.

use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Table;
use guestbook_core::api::events::{Event, EventDraft, SlimFilter};
use guestbook_core::gateway::ApiClient;

use crate::cli::EventArgs;

impl From<EventArgs> for EventDraft {
    fn from(args: EventArgs) -> Self {
        EventDraft {
            name: args.name,
            start_date: args.start_date,
            end_date: args.end_date,
            is_offline: !args.online,
            venue_name: args.venue,
            address: args.address,
            city: args.city,
            msg_template: args.msg_template,
            feedback_template: args.feedback_template,
        }
    }
}

pub async fn list(
    client: &ApiClient,
    page: u32,
    page_size: u32,
    category: Option<String>,
    date: Option<NaiveDate>,
) -> Result<()> {
    // Category and date filters go through the slim dashboard endpoint.
    if let Some(category) = category {
        let events = client
            .list_events_slim(&SlimFilter::Category {
                category,
                page,
                page_size,
            })
            .await?;
        print_events(&events);
        return Ok(());
    }
    if let Some(date) = date {
        let events = client.list_events_slim(&SlimFilter::OnDate(date)).await?;
        print_events(&events);
        return Ok(());
    }

    let listing = client.list_events(page, page_size).await?;
    print_events(&listing.events);
    if let Some(pages) = listing.page_count(page_size) {
        println!("Page {page} of {pages}");
    }
    Ok(())
}

fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events found");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Start", "Location", "Guests"]);
    for event in events {
        table.add_row(vec![
            event.id.to_string(),
            event.display_name().to_string(),
            event.start_date.clone().unwrap_or_else(|| "-".to_string()),
            event.display_location(),
            event
                .guests_count
                .map_or_else(|| "-".to_string(), |count| count.to_string()),
        ]);
    }
    println!("{table}");
}

pub async fn show(client: &ApiClient, id: u64) -> Result<()> {
    let event = client.get_event(id).await?;

    println!("ID:       {}", event.id);
    println!("Name:     {}", event.display_name());
    println!("Location: {}", event.display_location());
    if let Some(start) = &event.start_date {
        println!("Start:    {start}");
    }
    if let Some(end) = &event.end_date {
        println!("End:      {end}");
    }
    if let Some(count) = event.guests_count {
        println!("Guests:   {count}");
    }
    if let Some(template) = &event.msg_template {
        println!("Message template:  {template}");
    }
    if let Some(template) = &event.feedback_template {
        println!("Feedback template: {template}");
    }
    Ok(())
}

pub async fn create(client: &ApiClient, draft: &EventDraft) -> Result<()> {
    client.create_event(draft).await?;
    println!("Event created");
    Ok(())
}

pub async fn update(client: &ApiClient, id: u64, draft: &EventDraft) -> Result<()> {
    client.update_event(id, draft).await?;
    println!("Event updated");
    Ok(())
}

pub async fn delete(client: &ApiClient, id: u64) -> Result<()> {
    client.delete_event(id).await?;
    println!("Event deleted");
    Ok(())
}

pub async fn export(client: &ApiClient, id: u64) -> Result<()> {
    client.export_event(id).await?;
    println!("Export requested for event {id}");
    Ok(())
}

pub async fn qr(client: &ApiClient, id: u64) -> Result<()> {
    let payload = client.event_qr(id).await?;

    if let Some(name) = &payload.name {
        println!("Event: {name}");
    }
    match &payload.qr_url {
        Some(url) => println!("{url}"),
        None => println!("No QR code available"),
    }
    Ok(())
}
