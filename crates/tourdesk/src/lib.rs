//! # Tourdesk
//!
//! Session and auth-token management for the Tourdesk agency back-office
//! client.
//!
//! Tourdesk owns the signed-in identity (role and agency scope), persists
//! it across restarts, refreshes the access token on a timer, and injects
//! it into every request made through the shared
//! [`ApiClient`](transport::ApiClient). Screens read the session through a
//! [`SessionContext`](session::SessionContext) and never touch tokens.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tourdesk::prelude::*;
//!
//! # async fn run() -> Result<(), TourdeskError> {
//! tourdesk::init_tracing();
//!
//! let office = BackOffice::builder()
//!     .config(ClientConfig::from_env()?)
//!     .build()?;
//!
//! if office.restore()?.is_none() {
//!     office
//!         .session()
//!         .login(&Credentials::new("amina@agence.tn", "s3cret"))
//!         .await?;
//! }
//! let dossiers: serde_json::Value = office.api().get_json("/dossiers").await?;
//! # let _ = dossiers;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::{BackOffice, BackOfficeBuilder, ConfiguredStore};
pub use config::{ClientConfig, ConfigError};
pub use error::TourdeskError;

pub use tourdesk_protocol as protocol;
pub use tourdesk_session as session;
pub use tourdesk_tick as tick;
pub use tourdesk_transport as transport;

/// Installs a `tracing` subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    pub use crate::{
        BackOffice, BackOfficeBuilder, ClientConfig, TourdeskError,
    };
    pub use tourdesk_protocol::{AgencyId, Credentials, Role};
    pub use tourdesk_session::{
        LogoutReason, RefreshOutcome, Session, SessionContext, SessionError,
        SessionEvent,
    };
    pub use tourdesk_transport::{ApiClient, TransportError};
}
