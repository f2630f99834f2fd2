//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// Each crate in Tourdesk defines its own error enum, so a
/// `ProtocolError` always means serialization went wrong, never the
/// network or the session lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, wrong
    /// data types, or a truncated value.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
