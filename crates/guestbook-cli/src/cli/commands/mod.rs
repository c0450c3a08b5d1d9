//! Command implementations.

mod auth;
mod events;
mod guests;

use std::sync::Arc;

use anyhow::Result;
use guestbook_core::config::{self, Config};
use guestbook_core::gateway::ApiClient;
use guestbook_core::session::{FileSessionStore, SessionManager};
use tracing::debug;

use super::surface::{LoginPrompt, StderrNotifier};
use super::{Cli, Commands, EventCommands};

/// Builds the API client from config, with the file-backed session and the
/// terminal surfaces wired in.
fn client(config: &Config) -> Result<ApiClient> {
    let base_url = config::resolve_base_url(config.base_url.as_deref())?;
    debug!("using API base URL {base_url}");
    let session = SessionManager::new(
        Box::new(FileSessionStore::new()),
        Box::new(StderrNotifier),
        Box::new(LoginPrompt),
    );
    Ok(ApiClient::new(base_url, Arc::new(session)))
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config)?;

    match cli.command {
        Commands::Login { email, password } => auth::login(&client, &email, password).await,
        Commands::Logout => auth::logout(&client),
        Commands::VerifyEmail { email, otp, resend } => {
            auth::verify_email(&client, &email, otp.as_deref(), resend).await
        }
        Commands::Whoami => auth::whoami(&client),
        Commands::Events { command } => match command {
            EventCommands::List {
                page,
                page_size,
                category,
                date,
            } => {
                let page_size = page_size.unwrap_or(config.page_size);
                events::list(&client, page, page_size, category, date).await
            }
            EventCommands::Show { id } => events::show(&client, id).await,
            EventCommands::Create(args) => events::create(&client, &args.into()).await,
            EventCommands::Update { id, args } => events::update(&client, id, &args.into()).await,
            EventCommands::Delete { id } => events::delete(&client, id).await,
            EventCommands::Export { id } => events::export(&client, id).await,
            EventCommands::Qr { id } => events::qr(&client, id).await,
        },
        Commands::Guests { event, csv } => guests::list(&client, event, csv).await,
    }
}
