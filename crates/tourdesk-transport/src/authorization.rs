//! The shared "default Authorization header" slot.
//!
//! Every outbound request made through an [`ApiClient`](crate::ApiClient)
//! consults this slot. There is exactly one writer: the session manager.
//! The split into [`AuthorizationWriter`] and [`AuthorizationReader`]
//! makes that rule a property of the types rather than a convention:
//!
//! - the writer is not `Clone`, so only whoever called
//!   [`AuthorizationSlot::new`] can set or clear the header;
//! - readers are cheap to clone and can be handed to any collaborator,
//!   but expose no mutation at all.
//!
//! ```text
//! SessionManager ──(AuthorizationWriter)──→ [ slot ] ←──(Reader)── ApiClient(s)
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::HeaderValue;

use crate::TransportError;

type Shared = Arc<RwLock<Option<HeaderValue>>>;

/// Constructor for a writer/reader pair sharing one empty slot.
pub struct AuthorizationSlot;

impl AuthorizationSlot {
    /// Creates an empty slot and returns its single writer plus a reader.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (AuthorizationWriter, AuthorizationReader) {
        let shared: Shared = Arc::new(RwLock::new(None));
        (
            AuthorizationWriter {
                shared: Arc::clone(&shared),
            },
            AuthorizationReader { shared },
        )
    }
}

/// Exclusive write access to the Authorization slot.
#[derive(Debug)]
pub struct AuthorizationWriter {
    shared: Shared,
}

impl AuthorizationWriter {
    /// Sets the slot to `Bearer <token>`.
    ///
    /// The stored value is flagged sensitive so `reqwest` and `http`
    /// redact it from their `Debug` output.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidHeader`] if the token contains
    /// bytes not allowed in a header value. The slot is left unchanged.
    pub fn set_bearer(&self, token: &str) -> Result<(), TransportError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        *self.shared.write().unwrap_or_else(PoisonError::into_inner) =
            Some(value);
        tracing::trace!("authorization header set");
        Ok(())
    }

    /// Clears the slot. Safe to call when it is already empty.
    pub fn clear(&self) {
        let previous = self
            .shared
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            tracing::trace!("authorization header cleared");
        }
    }

    /// A new reader for the same slot.
    pub fn reader(&self) -> AuthorizationReader {
        AuthorizationReader {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Read-only view of the Authorization slot.
#[derive(Debug, Clone)]
pub struct AuthorizationReader {
    shared: Shared,
}

impl AuthorizationReader {
    /// The header value requests should carry right now, if any.
    pub fn current(&self) -> Option<HeaderValue> {
        self.shared
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a bearer token is currently installed.
    pub fn is_set(&self) -> bool {
        self.shared
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
