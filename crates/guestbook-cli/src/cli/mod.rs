//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;

mod commands;
mod surface;

#[derive(Parser)]
#[command(name = "guestbook")]
#[command(version)]
#[command(about = "Admin CLI for the event guestbook platform")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log out and clear the stored session
    Logout,

    /// Verify an email address with an OTP code, or request a fresh one
    VerifyEmail {
        #[arg(long)]
        email: String,

        /// The code from the verification email
        #[arg(long, conflicts_with = "resend")]
        otp: Option<String>,

        /// Request a fresh code instead of verifying
        #[arg(long)]
        resend: bool,
    },

    /// Show the logged-in user
    Whoami,

    /// Manage events
    Events {
        #[command(subcommand)]
        command: EventCommands,
    },

    /// List guestbook entries for an event
    Guests {
        /// Event id
        #[arg(long)]
        event: u64,

        /// Print CSV instead of a table
        #[arg(long)]
        csv: bool,
    },
}

#[derive(clap::Subcommand)]
enum EventCommands {
    /// List events (paginated)
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size (defaults to the configured value)
        #[arg(long)]
        page_size: Option<u32>,

        /// Filter by category via the slim endpoint (upcoming, ongoing, past)
        #[arg(long, conflicts_with = "date")]
        category: Option<String>,

        /// Filter by start date (YYYY-MM-DD) via the slim endpoint
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },

    /// Show one event
    Show { id: u64 },

    /// Create an event
    Create(EventArgs),

    /// Update an event
    Update {
        id: u64,

        #[command(flatten)]
        args: EventArgs,
    },

    /// Delete an event
    Delete { id: u64 },

    /// Request a server-side export of an event
    Export { id: u64 },

    /// Fetch the public QR payload for an event (no login required)
    Qr { id: u64 },
}

#[derive(clap::Args, Debug, Clone)]
struct EventArgs {
    #[arg(long)]
    name: String,

    /// Start timestamp (ISO 8601)
    #[arg(long)]
    start_date: Option<String>,

    /// End timestamp (ISO 8601)
    #[arg(long)]
    end_date: Option<String>,

    /// Mark the event as online (in-person when omitted)
    #[arg(long)]
    online: bool,

    #[arg(long)]
    venue: Option<String>,

    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    city: Option<String>,

    /// Message template sent to guests
    #[arg(long)]
    msg_template: Option<String>,

    /// Feedback request template
    #[arg(long)]
    feedback_template: Option<String>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(commands::dispatch(cli))
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}
