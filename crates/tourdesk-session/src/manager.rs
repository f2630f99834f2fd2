//! The session manager: owner of the one active session.
//!
//! Responsibilities:
//! - restoring a persisted session at startup (`initialize`)
//! - installing a session after login, removing it on logout
//! - keeping the shared Authorization header in step with the session
//! - refreshing the access token on a timer, failing closed
//!
//! # Concurrency
//!
//! `SessionManager` is a cheap `Clone` handle onto shared state. The
//! session itself sits behind a mutex that is only held for synchronous
//! updates, never across an `.await`; network exchanges run unlocked.
//! Lock order is always state → timer.
//!
//! # Generations
//!
//! Every login, logout and successful refresh bumps a generation
//! counter. `refresh` records the generation before its exchange and
//! drops the result if the counter moved in the meantime. A refresh that
//! completes after logout cannot bring the session back. A refresh that
//! fails after a newer login, or after an overlapping refresh already
//! rotated the tokens, cannot log the live session out.
//!
//! Two processes sharing one store may still both refresh; nothing here
//! coordinates across processes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::{broadcast, watch};
use tourdesk_protocol::{AgencyId, Credentials, Role};
use tourdesk_tick::RepeatingTask;
use tourdesk_transport::{
    AuthorizationReader, AuthorizationWriter, TransportError,
};

use crate::{
    AuthService, KeyValueStore, LogoutReason, RedirectCoordinator,
    RefreshOutcome, Session, SessionConfig, SessionError, SessionEvent,
    SessionStorage,
};

/// Mutable state guarded by one mutex.
struct State {
    session: Option<Session>,
    generation: u64,
}

struct Inner<A: AuthService, S: KeyValueStore> {
    auth: A,
    storage: SessionStorage<S>,
    header: AuthorizationWriter,
    redirect: RedirectCoordinator,
    state: Mutex<State>,
    timer: Mutex<RepeatingTask>,
    session_tx: watch::Sender<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl<A: AuthService, S: KeyValueStore> Inner<A, S> {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timer(&self) -> MutexGuard<'_, RepeatingTask> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Owns the in-memory session, its persisted copy, the Authorization
/// header, and the refresh timer.
///
/// ## Lifecycle
///
/// ```text
///            login() ok                     refresh() ok
///   [None] ─────────────→ [Some(session)] ──────────────┐
///     ↑                     │   ↑                       │
///     │ logout()            │   └───────────────────────┘
///     │ refresh() err       │
///     │ report_unauthorized │
///     └─────────────────────┘
/// ```
pub struct SessionManager<A: AuthService, S: KeyValueStore> {
    inner: Arc<Inner<A, S>>,
}

impl<A: AuthService, S: KeyValueStore> Clone for SessionManager<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: AuthService, S: KeyValueStore> SessionManager<A, S> {
    /// Creates a manager with no session.
    ///
    /// Taking the [`AuthorizationWriter`] by value makes this manager the
    /// only component able to change the Authorization header.
    pub fn new(
        auth: A,
        store: S,
        header: AuthorizationWriter,
        redirect: RedirectCoordinator,
        config: SessionConfig,
    ) -> Self {
        let (session_tx, _) = watch::channel(None);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            inner: Arc::new(Inner {
                auth,
                storage: SessionStorage::new(store, config.storage_key),
                header,
                redirect,
                state: Mutex::new(State {
                    session: None,
                    generation: 0,
                }),
                timer: Mutex::new(RepeatingTask::new(config.refresh)),
                session_tx,
                events,
            }),
        }
    }

    // =====================================================================
    // Lifecycle operations
    // =====================================================================

    /// Adopts the persisted session, if there is a valid one, and arms
    /// the refresh timer. Corrupt data is removed from the store and
    /// treated as no session. Never fails.
    ///
    /// Outside a Tokio runtime the session is still installed but no
    /// refresh timer can run; a warning is logged and the access token
    /// is only renewed by explicit [`refresh`](Self::refresh) calls.
    pub fn initialize(&self) -> Option<Session> {
        let restored = match self.inner.storage.load() {
            Ok(restored) => restored,
            Err(SessionError::CorruptPersistedSession(reason)) => {
                tracing::warn!(%reason, "discarding corrupt persisted session");
                if let Err(e) = self.inner.storage.clear() {
                    tracing::warn!(error = %e, "could not remove corrupt session");
                }
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted session");
                None
            }
        };

        let Some(session) = restored else {
            tracing::debug!("no persisted session");
            return None;
        };

        let event = SessionEvent::Restored {
            role: session.role().clone(),
            agency_scope: session.agency_scope().cloned(),
        };
        match self.install(session.clone(), event) {
            Ok(()) => {
                tracing::info!(role = %session.role(), "persisted session restored");
                Some(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "persisted session rejected");
                if let Err(e) = self.inner.storage.clear() {
                    tracing::warn!(error = %e, "could not remove rejected session");
                }
                None
            }
        }
    }

    /// Exchanges credentials for a new session and installs it,
    /// replacing any current one.
    ///
    /// # Errors
    /// - [`SessionError::InvalidCredentials`]: the server said no
    /// - [`SessionError::InvalidIdentity`]: the response was unusable
    /// - [`SessionError::Transport`]: the request itself failed
    ///
    /// On error the current session (if any) is left untouched. Like
    /// [`initialize`](Self::initialize), a login driven by an executor
    /// other than Tokio installs the session without a refresh timer.
    pub async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, SessionError> {
        tracing::debug!(identifier = %credentials.identifier, "login requested");

        let response = self.inner.auth.login(credentials).await.inspect_err(
            |e| tracing::info!(identifier = %credentials.identifier, error = %e, "login rejected"),
        )?;
        let session = Session::from_login(response).inspect_err(|e| {
            tracing::warn!(error = %e, "login response rejected");
        })?;

        let event = SessionEvent::LoggedIn {
            role: session.role().clone(),
            agency_scope: session.agency_scope().cloned(),
        };
        self.install(session.clone(), event)?;

        tracing::info!(
            role = %session.role(),
            agency = ?session.agency_scope().map(AgencyId::as_str),
            "session installed"
        );
        Ok(session)
    }

    /// Removes the session, its persisted copy, and the Authorization
    /// header, and cancels the refresh timer. Idempotent.
    pub fn logout(&self) {
        let mut state = self.inner.state();
        self.clear_locked(&mut state, LogoutReason::UserRequested);
    }

    /// Replaces the access token using the refresh token.
    ///
    /// Called by the timer on every tick; may also be called directly.
    ///
    /// # Errors
    /// [`SessionError::RefreshFailure`] if the exchange failed. By the
    /// time this returns, the session has already been logged out and
    /// the user redirected to login.
    pub async fn refresh(&self) -> Result<RefreshOutcome, SessionError> {
        let (generation, refresh_token) = {
            let state = self.inner.state();
            match &state.session {
                Some(session) => {
                    (state.generation, session.refresh_token().to_owned())
                }
                None => {
                    tracing::trace!("refresh skipped, no session");
                    return Ok(RefreshOutcome::Skipped);
                }
            }
        };

        let result = self.inner.auth.refresh(&refresh_token).await;

        let mut state = self.inner.state();
        let current = match state.session.as_ref() {
            Some(current)
                if state.generation == generation
                    && current.refresh_token() == refresh_token =>
            {
                current
            }
            _ => {
                tracing::debug!(
                    started = generation,
                    current = state.generation,
                    "discarding stale refresh result"
                );
                return Ok(RefreshOutcome::Stale);
            }
        };

        let refreshed = result
            .map_err(|e| match e {
                SessionError::RefreshFailure(_) => e,
                other => SessionError::RefreshFailure(other.to_string()),
            })
            .and_then(|response| current.with_refreshed(response))
            .and_then(|session| {
                self.inner
                    .header
                    .set_bearer(session.access_token())
                    .map_err(|e| SessionError::RefreshFailure(e.to_string()))?;
                Ok(session)
            });

        match refreshed {
            Ok(session) => {
                if let Err(e) = self.inner.storage.save(&session) {
                    tracing::warn!(error = %e, "could not persist refreshed session");
                }
                state.generation += 1;
                state.session = Some(session.clone());
                self.inner.session_tx.send_replace(Some(session));
                self.inner.publish(SessionEvent::Refreshed);
                tracing::debug!("access token refreshed");
                Ok(RefreshOutcome::Refreshed)
            }
            Err(err) => {
                tracing::warn!(error = %err, "refresh failed, forcing logout");
                self.inner.publish(SessionEvent::RefreshFailed {
                    reason: err.to_string(),
                });
                self.clear_locked(&mut state, LogoutReason::RefreshFailed);
                self.inner.publish(SessionEvent::SessionExpired);
                drop(state);

                self.inner.redirect.redirect_to_login(None);
                Err(err)
            }
        }
    }

    /// Forced logout after a collaborator's request was answered 401.
    ///
    /// Always redirects to login, even if no session was active.
    pub fn report_unauthorized(&self) {
        let had_session = {
            let mut state = self.inner.state();
            let had = self.clear_locked(&mut state, LogoutReason::Unauthorized);
            if had {
                self.inner.publish(SessionEvent::SessionExpired);
            }
            had
        };
        tracing::info!(had_session, "request unauthorized");
        self.inner.redirect.redirect_to_login(None);
    }

    /// Passes `result` through, calling [`report_unauthorized`] first
    /// when it is a 401.
    ///
    /// ```rust,ignore
    /// let hotels: Vec<Hotel> = manager.intercept(api.get_json("/hotels").await)?;
    /// ```
    ///
    /// [`report_unauthorized`]: Self::report_unauthorized
    pub fn intercept<T>(
        &self,
        result: Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        if let Err(TransportError::Unauthorized { .. }) = &result {
            self.report_unauthorized();
        }
        result
    }

    // =====================================================================
    // Read accessors
    // =====================================================================

    /// The current session, if any. No I/O.
    pub fn current_session(&self) -> Option<Session> {
        self.inner.state().session.clone()
    }

    /// A read-only handle for collaborators.
    pub fn context(&self) -> SessionContext {
        SessionContext {
            rx: self.inner.session_tx.subscribe(),
        }
    }

    /// Receives every session transition.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.session_tx.subscribe()
    }

    /// Receives [`SessionEvent`]s published after this call.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// A reader for the Authorization slot this manager writes, to build
    /// [`ApiClient`](tourdesk_transport::ApiClient)s from.
    pub fn authorization(&self) -> AuthorizationReader {
        self.inner.header.reader()
    }

    /// The coordinator used for forced redirects, for view code that hit
    /// an authorization error outside [`intercept`](Self::intercept).
    pub fn redirect(&self) -> &RedirectCoordinator {
        &self.inner.redirect
    }

    /// Whether the refresh timer is currently running.
    pub fn is_refresh_armed(&self) -> bool {
        self.inner.timer().is_armed()
    }

    /// The persisted-session adapter.
    pub fn storage(&self) -> &SessionStorage<S> {
        &self.inner.storage
    }

    // =====================================================================
    // Internals
    // =====================================================================

    /// Makes `session` current: header, store, timer, observers.
    fn install(
        &self,
        session: Session,
        event: SessionEvent,
    ) -> Result<(), SessionError> {
        let mut state = self.inner.state();

        // Checked first so a rejected token leaves the old session intact.
        self.inner
            .header
            .set_bearer(session.access_token())
            .map_err(|_| {
                SessionError::InvalidIdentity(
                    "access token is not a valid header value".into(),
                )
            })?;

        state.generation += 1;
        if let Err(e) = self.inner.storage.save(&session) {
            tracing::warn!(error = %e, "could not persist session");
        }
        state.session = Some(session.clone());
        self.arm_refresh_timer();
        self.inner.session_tx.send_replace(Some(session));
        self.inner.publish(event);
        Ok(())
    }

    /// Tears down the session while the caller holds the state lock.
    /// Returns whether a session existed.
    fn clear_locked(&self, state: &mut State, reason: LogoutReason) -> bool {
        state.generation += 1;
        let had_session = state.session.take().is_some();

        self.inner.timer().disarm();
        self.inner.header.clear();
        if let Err(e) = self.inner.storage.clear() {
            tracing::warn!(error = %e, "could not clear persisted session");
        }

        if had_session {
            self.inner.session_tx.send_replace(None);
            self.inner.publish(SessionEvent::LoggedOut { reason });
            tracing::info!(?reason, "session cleared");
        }
        had_session
    }

    /// (Re)starts the refresh timer. The timer holds only a weak
    /// reference, so dropping every manager handle stops it.
    fn arm_refresh_timer(&self) {
        let weak: Weak<Inner<A, S>> = Arc::downgrade(&self.inner);
        let armed = self.inner.timer().arm(move |info| {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                tracing::trace!(tick = info.tick, "scheduled refresh");
                let manager = SessionManager { inner };
                if let Err(e) = manager.refresh().await {
                    tracing::debug!(error = %e, "scheduled refresh ended the session");
                }
            }
        });

        if let Err(e) = armed {
            tracing::warn!(error = %e, "refresh timer not armed");
        }
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// Read-only view of the session for collaborators (screens, API
/// wrappers). Cloneable, and free of the manager's type parameters.
#[derive(Debug, Clone)]
pub struct SessionContext {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionContext {
    pub fn current(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.rx.borrow().as_ref().map(|s| s.role().clone())
    }

    pub fn agency_scope(&self) -> Option<AgencyId> {
        self.rx
            .borrow()
            .as_ref()
            .and_then(|s| s.agency_scope().cloned())
    }

    /// Waits for the next session transition and returns the new value.
    /// Returns `None` as well once the manager is gone.
    pub async fn changed(&mut self) -> Option<Session> {
        if self.rx.changed().await.is_err() {
            return None;
        }
        self.rx.borrow_and_update().clone()
    }
}
