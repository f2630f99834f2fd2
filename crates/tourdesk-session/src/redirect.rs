//! Sends the user back to a login screen.

use std::fmt;
use std::sync::Arc;

/// The navigation capability supplied by the view layer.
///
/// Any `Fn(&str) + Send + Sync` closure is a navigator.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn navigate(&self, path: &str) {
        self(path)
    }
}

/// Stateless adapter that routes to a login entry point.
///
/// Invoked by the session manager after a forced logout, and by view
/// code that hit an authorization error.
#[derive(Clone)]
pub struct RedirectCoordinator {
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl RedirectCoordinator {
    /// Route used when no explicit path is given.
    pub const DEFAULT_LOGIN_PATH: &'static str = "/login";

    pub fn new(navigator: impl Navigator) -> Self {
        Self {
            navigator: Arc::new(navigator),
            login_path: Self::DEFAULT_LOGIN_PATH.to_owned(),
        }
    }

    /// A coordinator that logs the redirect and navigates nowhere. For
    /// headless tools with no view layer.
    pub fn detached() -> Self {
        Self::new(|path: &str| {
            tracing::debug!(path, "redirect requested with no view attached");
        })
    }

    /// Replaces the default login route.
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Navigates to `path`, or to the default login route when `None`.
    /// Portals with their own login page (suppliers, branches) pass it
    /// explicitly.
    pub fn redirect_to_login(&self, path: Option<&str>) {
        let target = path.unwrap_or(&self.login_path);
        tracing::info!(target, "redirecting to login");
        self.navigator.navigate(target);
    }
}

impl fmt::Debug for RedirectCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectCoordinator")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}
