//! Error types for the session layer.

use tourdesk_transport::TransportError;

/// Errors that can occur during session management.
///
/// Two families:
/// - **user-facing** (`InvalidCredentials`, `InvalidIdentity`, and
///   `Transport` during login) are returned from
///   [`SessionManager::login`](crate::SessionManager::login) for the view
///   layer to display;
/// - **lifecycle** (`RefreshFailure`, `CorruptPersistedSession`) are
///   handled inside the manager. A refresh failure always ends in a
///   forced logout; a corrupt stored session is discarded.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server rejected the identifier/secret pair.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The login response does not describe a usable identity: a token
    /// is missing, the role is missing, or a non-superadmin role came
    /// without an agency scope.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The refresh exchange was rejected, errored, or returned a
    /// malformed body.
    #[error("token refresh failed: {0}")]
    RefreshFailure(String),

    /// The persisted session could not be parsed or validated.
    #[error("persisted session is corrupt: {0}")]
    CorruptPersistedSession(String),

    /// The login request failed for a reason other than bad credentials
    /// (network down, server error).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The key/value store could not be read or written.
    #[error("session store failed: {0}")]
    Store(#[source] std::io::Error),
}
