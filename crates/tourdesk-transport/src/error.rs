/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, TLS, connect, timeout)
    /// or the response body could not be read or decoded.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered 401. Collaborators should report this to the
    /// session manager instead of touching the Authorization slot.
    #[error("unauthorized: {body}")]
    Unauthorized {
        /// Raw response body for debugging.
        body: String,
    },

    /// The server answered with any other non-2xx status.
    #[error("API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A token contained bytes that are not allowed in an HTTP header.
    #[error("invalid authorization header value")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl TransportError {
    /// The HTTP status carried by this error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Unauthorized { .. } => Some(401),
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request(e) => e.status().map(|s| s.as_u16()),
            TransportError::InvalidHeader(_) => None,
        }
    }
}
