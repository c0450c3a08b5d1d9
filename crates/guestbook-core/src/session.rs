//! Session persistence and expiry handling.
//!
//! Stores the active session in `${GUESTBOOK_HOME}/session.json` with
//! restricted permissions (0600). Tokens are never logged in full.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::paths;

/// Store key for the short-lived access token.
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Store key for the long-lived refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Store key for the serialized user profile.
pub const USER_KEY: &str = "user";

/// Delay between the expiry notification and the login redirect, so the
/// notification is visible before navigation.
const EXPIRY_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Durable key-value storage for session credentials.
///
/// The gateway reads and writes three keys: [`ACCESS_TOKEN_KEY`],
/// [`REFRESH_TOKEN_KEY`] and [`USER_KEY`]. Values are opaque strings.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    /// Returns an error if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// # Errors
    /// Returns an error if the removal could not be persisted.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Serialized shape of the session file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(flatten)]
    entries: HashMap<String, String>,
}

/// File-backed session store.
///
/// Each operation loads the file, mutates the map and writes it back, so a
/// fresh process always observes the latest session.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store at the default session path.
    pub fn new() -> Self {
        Self {
            path: paths::session_path(),
        }
    }

    /// Creates a store at a specific path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<SessionFile> {
        if !self.path.exists() {
            return Ok(SessionFile::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))
    }

    /// Saves the session file with restricted permissions (0600).
    fn save(&self, file: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(file).context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut handle = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            handle
                .write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl Default for FileSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(file) => file.entries.get(key).cloned(),
            Err(err) => {
                warn!("failed to load session store: {err:#}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut file = self.load()?;
        file.entries.insert(key.to_string(), value.to_string());
        self.save(&file)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut file = self.load()?;
        file.entries.remove(key);
        self.save(&file)
    }
}

/// In-memory session store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

impl MemorySessionStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Destructive,
}

/// A transient user-visible message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

/// Surface that shows transient notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Surface that returns the user to the login view after session expiry.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

/// Owns the persisted session and the terminal session-expiry path.
///
/// Storage, notification and navigation are injected so tests can observe
/// side effects without touching real files or terminals.
pub struct SessionManager {
    store: Box<dyn SessionStore>,
    notifier: Box<dyn Notifier>,
    redirect: Box<dyn LoginRedirect>,
    expiry_delay: Duration,
    /// Latched on first expiry so concurrent failures surface the
    /// notification and redirect at most once.
    expiring: AtomicBool,
}

impl SessionManager {
    pub fn new(
        store: Box<dyn SessionStore>,
        notifier: Box<dyn Notifier>,
        redirect: Box<dyn LoginRedirect>,
    ) -> Self {
        Self {
            store,
            notifier,
            redirect,
            expiry_delay: EXPIRY_REDIRECT_DELAY,
            expiring: AtomicBool::new(false),
        }
    }

    /// Overrides the delay between notification and redirect.
    pub fn with_expiry_delay(mut self, delay: Duration) -> Self {
        self.expiry_delay = delay;
        self
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Returns the serialized user profile, if a session is stored.
    pub fn user_profile(&self) -> Option<String> {
        self.store.get(USER_KEY)
    }

    /// Persists a freshly issued access token, keeping the rest of the
    /// session intact.
    ///
    /// # Errors
    /// Returns an error if the token could not be persisted.
    pub fn store_access_token(&self, access: &str) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, access)
    }

    /// Persists a complete session after a successful login.
    ///
    /// # Errors
    /// Returns an error if any entry could not be persisted.
    pub fn store_session(&self, access: &str, refresh: &str, user_json: &str) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, access)?;
        self.store.set(REFRESH_TOKEN_KEY, refresh)?;
        self.store.set(USER_KEY, user_json)
    }

    /// Removes all session entries.
    ///
    /// # Errors
    /// Returns an error if the store could not be updated.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(USER_KEY)
    }

    /// Terminal session-expiry path: clears credentials, notifies the user
    /// and redirects to login after a short delay.
    ///
    /// Concurrent callers trigger the side effects at most once; the guard
    /// stays latched because the redirect ends the interactive flow.
    pub async fn expire(&self) {
        if self
            .expiring
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        warn!("session expired, clearing stored credentials");
        if let Err(err) = self.clear() {
            warn!("failed to clear session store: {err:#}");
        }

        self.notifier.notify(Notice {
            title: "Session Expired".to_string(),
            description: "Your session has expired. Please log in again.".to_string(),
            severity: Severity::Destructive,
        });

        // Let the notification render before navigating away.
        tokio::time::sleep(self.expiry_delay).await;
        self.redirect.redirect_to_login();
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}
