//! Observable session transitions.

use tourdesk_protocol::{AgencyId, Role};

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to log out.
    UserRequested,
    /// The scheduled (or explicit) refresh failed.
    RefreshFailed,
    /// A collaborator's request came back 401.
    Unauthorized,
}

/// A transition published on the manager's broadcast channel.
///
/// Internal failures (a refresh failing on the timer task) have no
/// caller to return an error to; this channel is where they surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// `login` installed a new session.
    LoggedIn {
        role: Role,
        agency_scope: Option<AgencyId>,
    },
    /// `initialize` adopted the persisted session.
    Restored {
        role: Role,
        agency_scope: Option<AgencyId>,
    },
    /// The access token was replaced.
    Refreshed,
    /// The refresh exchange failed; a forced logout follows.
    RefreshFailed { reason: String },
    /// The session was removed.
    LoggedOut { reason: LogoutReason },
    /// The user was sent back to login after a forced logout.
    SessionExpired,
}

/// Result of a [`refresh`](crate::SessionManager::refresh) call that did
/// not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tokens were installed.
    Refreshed,
    /// There was no session to refresh.
    Skipped,
    /// The session changed (logout or a new login) while the exchange was
    /// in flight; its result was discarded.
    Stale,
}
