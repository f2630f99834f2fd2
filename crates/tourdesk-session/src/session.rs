//! Session types: the authenticated identity and its credentials.
//!
//! A [`Session`] pairs two halves with different lifetimes:
//! - the **tokens** (access + refresh), replaced on every refresh;
//! - the **identity** (role + agency scope), fixed at login.
//!
//! The identity lives behind an `Arc` so a refreshed session shares the
//! very same identity allocation as the session it replaced.

use std::fmt;
use std::sync::Arc;

use tourdesk_protocol::{AgencyId, LoginResponse, RefreshResponse, Role};
use tourdesk_tick::TickConfig;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Refresh timer settings. Default: every 15 minutes, no jitter.
    pub refresh: TickConfig,

    /// Key under which the serialized session is stored.
    pub storage_key: String,

    /// Capacity of the [`SessionEvent`](crate::SessionEvent) broadcast
    /// channel. Slow subscribers miss events beyond this.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh: TickConfig::default(),
            storage_key: "session".to_owned(),
            event_capacity: 16,
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Who the session belongs to: a role and, unless superadmin, an agency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    role: Role,
    agency_scope: Option<AgencyId>,
}

impl Identity {
    /// Builds an identity, enforcing the scope rule.
    ///
    /// # Errors
    /// [`SessionError::InvalidIdentity`] if `role` is not superadmin and
    /// `agency_scope` is `None` (or an empty string).
    pub fn new(
        role: Role,
        agency_scope: Option<AgencyId>,
    ) -> Result<Self, SessionError> {
        let agency_scope = agency_scope.filter(|a| !a.as_str().is_empty());
        if agency_scope.is_none() && !role.is_unscoped() {
            return Err(SessionError::InvalidIdentity(format!(
                "role {role} requires an agency scope"
            )));
        }
        Ok(Self { role, agency_scope })
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// The agency this identity is bound to; `None` only for superadmin.
    pub fn agency_scope(&self) -> Option<&AgencyId> {
        self.agency_scope.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The single active authenticated session.
///
/// Fields are private: the only ways to obtain a `Session` are the
/// validating constructors, so a half-initialised session cannot exist.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    refresh_token: String,
    identity: Arc<Identity>,
}

impl Session {
    /// Builds a session from its parts.
    ///
    /// # Errors
    /// [`SessionError::InvalidIdentity`] if either token is empty.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        identity: Identity,
    ) -> Result<Self, SessionError> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        if access_token.is_empty() {
            return Err(SessionError::InvalidIdentity(
                "access token is empty".into(),
            ));
        }
        if refresh_token.is_empty() {
            return Err(SessionError::InvalidIdentity(
                "refresh token is empty".into(),
            ));
        }
        Ok(Self {
            access_token,
            refresh_token,
            identity: Arc::new(identity),
        })
    }

    /// Validates a login response and turns it into a session.
    ///
    /// # Errors
    /// [`SessionError::InvalidIdentity`] if a token or the role is
    /// missing, or the scope rule is violated.
    pub fn from_login(response: LoginResponse) -> Result<Self, SessionError> {
        let role = response.role.ok_or_else(|| {
            SessionError::InvalidIdentity("response carries no role".into())
        })?;
        let identity = Identity::new(role, response.agency_scope)?;
        let access = response.access_token.unwrap_or_default();
        let refresh = response.refresh_token.unwrap_or_default();
        Self::new(access, refresh, identity)
    }

    /// Returns a copy with the tokens from a refresh response, sharing
    /// this session's identity. The refresh token is kept unless the
    /// server rotated it.
    ///
    /// # Errors
    /// [`SessionError::RefreshFailure`] if the response has no (or an
    /// empty) access token.
    pub fn with_refreshed(
        &self,
        response: RefreshResponse,
    ) -> Result<Self, SessionError> {
        let access_token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SessionError::RefreshFailure(
                    "response carries no access token".into(),
                )
            })?;
        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.refresh_token.clone());

        Ok(Self {
            access_token,
            refresh_token,
            identity: Arc::clone(&self.identity),
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn role(&self) -> &Role {
        self.identity.role()
    }

    pub fn agency_scope(&self) -> Option<&AgencyId> {
        self.identity.agency_scope()
    }

    /// The shared identity. Two sessions related by a refresh return
    /// pointer-equal `Arc`s.
    pub fn identity(&self) -> &Arc<Identity> {
        &self.identity
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("role", self.role())
            .field("agency_scope", &self.agency_scope())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(role: Option<Role>, scope: Option<&str>) -> LoginResponse {
        LoginResponse {
            access_token: Some("a-1".into()),
            refresh_token: Some("r-1".into()),
            role,
            agency_scope: scope.map(AgencyId::new),
        }
    }

    // =====================================================================
    // from_login()
    // =====================================================================

    #[test]
    fn test_from_login_agence_with_scope_succeeds() {
        let session =
            Session::from_login(login(Some(Role::Agence), Some("A1"))).unwrap();

        assert_eq!(session.access_token(), "a-1");
        assert_eq!(session.refresh_token(), "r-1");
        assert_eq!(session.role(), &Role::Agence);
        assert_eq!(session.agency_scope().unwrap().as_str(), "A1");
    }

    #[test]
    fn test_from_login_superadmin_without_scope_succeeds() {
        let session =
            Session::from_login(login(Some(Role::SuperAdmin), None)).unwrap();

        assert_eq!(session.role(), &Role::SuperAdmin);
        assert!(session.agency_scope().is_none());
    }

    #[test]
    fn test_from_login_scoped_roles_without_scope_fail() {
        for role in [
            Role::Agence,
            Role::Fournisseur,
            Role::Client,
            Role::Succursale,
            Role::Other("chauffeur".into()),
        ] {
            let result = Session::from_login(login(Some(role.clone()), None));
            assert!(
                matches!(result, Err(SessionError::InvalidIdentity(_))),
                "role {role} without scope should be rejected"
            );
        }
    }

    #[test]
    fn test_from_login_empty_scope_counts_as_missing() {
        let result = Session::from_login(login(Some(Role::Client), Some("")));
        assert!(matches!(result, Err(SessionError::InvalidIdentity(_))));
    }

    #[test]
    fn test_from_login_missing_role_fails() {
        let result = Session::from_login(login(None, Some("A1")));
        assert!(matches!(result, Err(SessionError::InvalidIdentity(_))));
    }

    #[test]
    fn test_from_login_missing_tokens_fail() {
        let mut resp = login(Some(Role::Agence), Some("A1"));
        resp.access_token = None;
        assert!(matches!(
            Session::from_login(resp),
            Err(SessionError::InvalidIdentity(_))
        ));

        let mut resp = login(Some(Role::Agence), Some("A1"));
        resp.refresh_token = Some(String::new());
        assert!(matches!(
            Session::from_login(resp),
            Err(SessionError::InvalidIdentity(_))
        ));
    }

    // =====================================================================
    // with_refreshed()
    // =====================================================================

    #[test]
    fn test_with_refreshed_replaces_tokens_and_shares_identity() {
        let session =
            Session::from_login(login(Some(Role::Agence), Some("A1"))).unwrap();

        let refreshed = session
            .with_refreshed(RefreshResponse {
                access_token: Some("a-2".into()),
                refresh_token: Some("r-2".into()),
            })
            .unwrap();

        assert_eq!(refreshed.access_token(), "a-2");
        assert_eq!(refreshed.refresh_token(), "r-2");
        assert!(Arc::ptr_eq(session.identity(), refreshed.identity()));
    }

    #[test]
    fn test_with_refreshed_keeps_refresh_token_without_rotation() {
        let session =
            Session::from_login(login(Some(Role::Agence), Some("A1"))).unwrap();

        let refreshed = session
            .with_refreshed(RefreshResponse {
                access_token: Some("a-2".into()),
                refresh_token: None,
            })
            .unwrap();

        assert_eq!(refreshed.refresh_token(), "r-1");
    }

    #[test]
    fn test_with_refreshed_missing_access_token_fails() {
        let session =
            Session::from_login(login(Some(Role::Agence), Some("A1"))).unwrap();

        let result = session.with_refreshed(RefreshResponse::default());

        assert!(matches!(result, Err(SessionError::RefreshFailure(_))));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let session =
            Session::from_login(login(Some(Role::Agence), Some("A1"))).unwrap();
        let printed = format!("{session:?}");

        assert!(!printed.contains("a-1"));
        assert!(!printed.contains("r-1"));
        assert!(printed.contains("Agence"));
    }
}
