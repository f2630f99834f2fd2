//! The authentication collaborator: login and refresh exchanges.
//!
//! The session manager does not care how credentials are checked; it
//! needs something implementing [`AuthService`]. Production code uses
//! [`HttpAuthService`], which posts to the back-office API. Tests plug in
//! an in-memory double.

use std::future::Future;

use tourdesk_protocol::{
    Credentials, LoginResponse, RefreshRequest, RefreshResponse,
};
use tourdesk_transport::{ApiClient, TransportError};

use crate::SessionError;

/// Exchanges credentials and refresh tokens with the auth server.
///
/// `Send + Sync + 'static` because the service is shared between the
/// caller's task and the refresh timer task.
///
/// # Example
///
/// ```rust
/// use tourdesk_protocol::{Credentials, LoginResponse, RefreshResponse, Role};
/// use tourdesk_session::{AuthService, SessionError};
///
/// /// Accepts one hard-coded superadmin. Only for demos.
/// struct DemoAuth;
///
/// impl AuthService for DemoAuth {
///     async fn login(
///         &self,
///         credentials: &Credentials,
///     ) -> Result<LoginResponse, SessionError> {
///         if credentials.secret != "demo" {
///             return Err(SessionError::InvalidCredentials("wrong password".into()));
///         }
///         Ok(LoginResponse {
///             access_token: Some("access".into()),
///             refresh_token: Some("refresh".into()),
///             role: Some(Role::SuperAdmin),
///             agency_scope: None,
///         })
///     }
///
///     async fn refresh(
///         &self,
///         _refresh_token: &str,
///     ) -> Result<RefreshResponse, SessionError> {
///         Ok(RefreshResponse {
///             access_token: Some("access-2".into()),
///             refresh_token: None,
///         })
///     }
/// }
/// ```
pub trait AuthService: Send + Sync + 'static {
    /// Exchanges credentials for tokens and an identity.
    ///
    /// # Returns
    /// - `Ok(LoginResponse)`: the server accepted; the body is validated
    ///   by the caller
    /// - `Err(SessionError::InvalidCredentials)`: the server rejected
    ///   the credentials
    /// - `Err(SessionError::InvalidIdentity)`: the server accepted but
    ///   the body is not a login response
    /// - `Err(SessionError::Transport)`: anything else went wrong
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginResponse, SessionError>> + Send;

    /// Exchanges a refresh token for a new access token.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshResponse, SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// HttpAuthService
// ---------------------------------------------------------------------------

/// Paths of the auth endpoints, relative to the API base URL.
#[derive(Debug, Clone)]
pub struct AuthEndpoints {
    pub login: String,
    pub refresh: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_owned(),
            refresh: "/auth/refresh".to_owned(),
        }
    }
}

/// [`AuthService`] backed by the back-office REST API.
#[derive(Debug, Clone)]
pub struct HttpAuthService {
    api: ApiClient,
    endpoints: AuthEndpoints,
}

impl HttpAuthService {
    pub fn new(api: ApiClient, endpoints: AuthEndpoints) -> Self {
        Self { api, endpoints }
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }
}

impl AuthService for HttpAuthService {
    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<LoginResponse, SessionError> {
        self.api
            .post_json(&self.endpoints.login, credentials)
            .await
            .map_err(|e| match e {
                TransportError::Unauthorized { body }
                | TransportError::Status {
                    status: 400 | 403,
                    body,
                } => SessionError::InvalidCredentials(body),
                TransportError::Request(e) if e.is_decode() => {
                    SessionError::InvalidIdentity(format!(
                        "login response has an unexpected shape: {e}"
                    ))
                }
                other => SessionError::Transport(other),
            })
    }

    async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshResponse, SessionError> {
        self.api
            .post_json(
                &self.endpoints.refresh,
                &RefreshRequest::new(refresh_token),
            )
            .await
            .map_err(|e| SessionError::RefreshFailure(e.to_string()))
    }
}
