//! Wire types for the Tourdesk authentication API.
//!
//! This crate defines what the client and the back-office API exchange
//! during authentication:
//!
//! - **Types** ([`Credentials`], [`LoginResponse`], [`RefreshRequest`],
//!   [`RefreshResponse`], [`Role`], [`AgencyId`]): the JSON bodies of the
//!   login and refresh endpoints.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how values are converted
//!   to/from bytes. The session store uses the same codec to serialize the
//!   persisted session.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer knows nothing about HTTP or about session lifecycle.
//!
//! ```text
//! Transport (HTTP) → Protocol (bodies) → Session (identity + tokens)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AgencyId, Credentials, LoginResponse, RefreshRequest, RefreshResponse,
    Role,
};
