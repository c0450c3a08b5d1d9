//! Terminal implementations of the notification and login-redirect surfaces.

use guestbook_core::session::{LoginRedirect, Notice, Notifier, Severity};

/// Prints notifications to stderr, the CLI's stand-in for toasts.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Destructive => eprintln!("error: {}: {}", notice.title, notice.description),
            Severity::Info => eprintln!("{}: {}", notice.title, notice.description),
        }
    }
}

/// Stands in for the dashboard's redirect to the login page.
pub struct LoginPrompt;

impl LoginRedirect for LoginPrompt {
    fn redirect_to_login(&self) {
        eprintln!("Run `guestbook login` to start a new session.");
    }
}
