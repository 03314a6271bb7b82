//! Session token state, one token per transport kind.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use transom_types::TransportKind;

/// Header the daemon uses to issue and expect the CSRF session token.
pub(crate) const SESSION_HEADER: &str = "X-Transmission-Session-Id";

/// Current session token per transport kind.
///
/// The daemon hands the token out on its own 409 rejection, so no
/// dedicated fetch exists: the request that observes the rejection stores the
/// replacement and retries itself. Concurrent observers each do the same;
/// last writer wins and both tokens are valid.
#[derive(Debug, Default)]
pub(crate) struct SessionStore {
    tokens: Mutex<HashMap<TransportKind, String>>,
}

impl SessionStore {
    pub(crate) fn get(&self, via: TransportKind) -> Option<String> {
        self.lock().get(&via).cloned()
    }

    pub(crate) fn store(&self, via: TransportKind, token: String) {
        self.lock().insert(via, token);
    }

    /// Drop the stored token; the next call starts tokenless and harvests
    /// a fresh one from the daemon's rejection.
    pub(crate) fn invalidate(&self, via: TransportKind) {
        self.lock().remove(&via);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TransportKind, String>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
