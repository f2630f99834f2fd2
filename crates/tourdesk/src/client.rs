//! `BackOffice` builder: one call wires the whole client stack.
//!
//! ```text
//!            ┌──────────── AuthorizationSlot ────────────┐
//!            │ writer                              reader │
//!            ↓                                            ↓
//!     SessionManager ── HttpAuthService ── ApiClient ── back-office API
//!            │
//!            ├── SessionStorage (MemoryStore | FileStore)
//!            ├── RepeatingTask (refresh timer)
//!            └── RedirectCoordinator
//! ```

use std::io;

use tourdesk_session::{
    FileStore, HttpAuthService, KeyValueStore, MemoryStore, Navigator,
    RedirectCoordinator, Session, SessionContext, SessionManager,
};
use tourdesk_transport::{ApiClient, AuthorizationSlot};

use crate::{ClientConfig, TourdeskError};

/// The store selected by [`ClientConfig::storage_dir`].
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    Memory(MemoryStore),
    File(FileStore),
}

impl KeyValueStore for ConfiguredStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match self {
            Self::Memory(store) => store.get(key),
            Self::File(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        match self {
            Self::Memory(store) => store.set(key, value),
            Self::File(store) => store.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match self {
            Self::Memory(store) => store.remove(key),
            Self::File(store) => store.remove(key),
        }
    }
}

/// Builder for a [`BackOffice`] client.
///
/// # Example
///
/// ```rust,ignore
/// use tourdesk::prelude::*;
///
/// let office = BackOffice::builder()
///     .config(ClientConfig::from_env()?)
///     .navigator(|path: &str| router.push(path))
///     .build()?;
/// office.restore()?;
/// ```
pub struct BackOfficeBuilder {
    config: ClientConfig,
    redirect: Option<RedirectCoordinator>,
}

impl BackOfficeBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            redirect: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Sets the navigation callback used for forced redirects to login.
    /// Without one, redirects are only logged.
    pub fn navigator(mut self, navigator: impl Navigator) -> Self {
        self.redirect = Some(RedirectCoordinator::new(navigator));
        self
    }

    /// Builds a client persisting to `config.storage_dir`, or to memory
    /// when none is set.
    pub fn build(self) -> Result<BackOffice<ConfiguredStore>, TourdeskError> {
        let store = match &self.config.storage_dir {
            Some(dir) => ConfiguredStore::File(FileStore::new(dir)),
            None => ConfiguredStore::Memory(MemoryStore::new()),
        };
        self.build_with_store(store)
    }

    /// Builds a client persisting to `store`.
    pub fn build_with_store<S: KeyValueStore>(
        self,
        store: S,
    ) -> Result<BackOffice<S>, TourdeskError> {
        let config = self.config;
        let (writer, reader) = AuthorizationSlot::new();
        let api = ApiClient::with_timeout(
            config.base_url.as_str(),
            reader,
            config.request_timeout(),
        )?;

        let redirect = self
            .redirect
            .unwrap_or_else(RedirectCoordinator::detached)
            .with_login_path(config.login_route.as_str());
        let auth = HttpAuthService::new(api.clone(), config.auth_endpoints());
        let session = SessionManager::new(
            auth,
            store,
            writer,
            redirect,
            config.session_config(),
        );

        tracing::debug!(base_url = %config.base_url, "back-office client built");
        Ok(BackOffice { api, session })
    }
}

impl Default for BackOfficeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured back-office client: an [`ApiClient`] whose requests
/// carry the current bearer token, and the [`SessionManager`] that owns
/// that token.
pub struct BackOffice<S: KeyValueStore> {
    api: ApiClient,
    session: SessionManager<HttpAuthService, S>,
}

impl BackOffice<ConfiguredStore> {
    /// Creates a new builder.
    pub fn builder() -> BackOfficeBuilder {
        BackOfficeBuilder::new()
    }
}

impl<S: KeyValueStore> BackOffice<S> {
    /// The API client for collaborators (list/detail screens).
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionManager<HttpAuthService, S> {
        &self.session
    }

    /// Read-only session view for collaborators.
    pub fn context(&self) -> SessionContext {
        self.session.context()
    }

    /// Adopts the persisted session, if any. Call once at startup.
    ///
    /// # Errors
    /// [`TickError::NoRuntime`](tourdesk_tick::TickError::NoRuntime) when
    /// called outside a Tokio runtime, where the refresh timer cannot
    /// run. Nothing is restored in that case.
    pub fn restore(&self) -> Result<Option<Session>, TourdeskError> {
        tourdesk_tick::ensure_runtime()?;
        Ok(self.session.initialize())
    }
}
