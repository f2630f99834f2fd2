//! Client session management for Tourdesk.
//!
//! This crate owns the lifecycle of the signed-in back-office user:
//!
//! 1. **Authentication**: exchanging credentials for tokens ([`AuthService`])
//! 2. **Session tracking**: the one active session and its identity
//!    ([`SessionManager`], [`Session`])
//! 3. **Persistence**: surviving restarts through a key/value store
//!    ([`KeyValueStore`], [`SessionStorage`])
//! 4. **Refresh**: replacing the access token on a timer, and logging
//!    out when that fails ([`SessionManager::refresh`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Views / API wrappers (above)  ← read SessionContext, report 401s
//!     ↕
//! Session Layer (this crate)    ← owns the session and the auth header
//!     ↕
//! Transport + Tick (below)      ← ApiClient, AuthorizationSlot, RepeatingTask
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod event;
mod manager;
mod redirect;
mod session;
mod store;

pub use auth::{AuthEndpoints, AuthService, HttpAuthService};
pub use error::SessionError;
pub use event::{LogoutReason, RefreshOutcome, SessionEvent};
pub use manager::{SessionContext, SessionManager};
pub use redirect::{Navigator, RedirectCoordinator};
pub use session::{Identity, Session, SessionConfig};
pub use store::{FileStore, KeyValueStore, MemoryStore, SessionStorage};
