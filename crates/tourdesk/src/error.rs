//! Unified error type for Tourdesk.

use tourdesk_protocol::ProtocolError;
use tourdesk_session::SessionError;
use tourdesk_tick::TickError;
use tourdesk_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tourdesk` meta-crate you deal with this single error
/// type instead of importing errors from each sub-crate; `?` converts
/// them automatically.
#[derive(Debug, thiserror::Error)]
pub enum TourdeskError {
    /// An HTTP-level error (network, non-2xx status).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A wire-format error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (credentials, identity, refresh, store).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The refresh timer could not be started.
    #[error(transparent)]
    Tick(#[from] TickError),

    /// A configuration value could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
