//! Auth token storage.
//!
//! The gateway never reads ambient state: it is handed a [`SessionStore`]
//! at construction. The default store persists the token in the OS
//! credential store (Keychain, DPAPI, Secret Service) through `keyring`, so
//! a login survives between console invocations. [`MemorySessionStore`]
//! keeps the token for the lifetime of the process only.

use std::sync::Mutex;

use keyring::Entry;
use tracing::{info, warn};
use zeroize::Zeroizing;

pub const DEFAULT_SERVICE_NAME: &str = "barang-console";

const KEY_AUTH_TOKEN: &str = "auth_token";

/// Where the bearer token lives. Set on login, read by every authenticated
/// call, cleared on logout.
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Option<Zeroizing<String>>;
    fn set_token(&self, token: &str) -> Result<(), String>;
    fn clear_token(&self) -> Result<(), String>;
}

// ---------------------------------------------------------------------------
// OS keyring
// ---------------------------------------------------------------------------

pub struct KeyringSessionStore {
    service: String,
}

impl KeyringSessionStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry, String> {
        Entry::new(&self.service, KEY_AUTH_TOKEN).map_err(|e| e.to_string())
    }
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl SessionStore for KeyringSessionStore {
    /// Returns `None` when the entry does not exist (or the platform returns
    /// a "not found" error).
    fn token(&self) -> Option<Zeroizing<String>> {
        let entry = match self.entry() {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "keyring: failed to create entry");
                return None;
            }
        };
        match entry.get_password() {
            Ok(pw) if pw.trim().is_empty() => None,
            Ok(pw) => Some(Zeroizing::new(pw)),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "keyring: failed to read auth token");
                None
            }
        }
    }

    fn set_token(&self, token: &str) -> Result<(), String> {
        self.entry()?
            .set_password(token)
            .map_err(|e| e.to_string())?;
        info!(service = %self.service, "auth token stored");
        Ok(())
    }

    /// Silently succeeds if no token is stored.
    fn clear_token(&self) -> Result<(), String> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                info!(service = %self.service, "auth token cleared");
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// In-process
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<Zeroizing<String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(Zeroizing::new(token.to_string()))),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<Zeroizing<String>> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }

    fn set_token(&self, token: &str) -> Result<(), String> {
        let mut guard = self.token.lock().map_err(|e| e.to_string())?;
        *guard = Some(Zeroizing::new(token.to_string()));
        Ok(())
    }

    fn clear_token(&self) -> Result<(), String> {
        let mut guard = self.token.lock().map_err(|e| e.to_string())?;
        *guard = None;
        Ok(())
    }
}
