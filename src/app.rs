//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is the process-wide context every orchestrator receives. It
//! holds the API seam, the credential store, and the two mutable models
//! (`Session`, `Workspace`), each behind its own mutex.
//!
//! Locks are only taken inside the synchronous `with_*` closures, so no lock
//! is ever held across an `.await`. An orchestrator reads what it needs,
//! releases, awaits the network, then re-locks to apply the result if its
//! ticket is still current.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ClientConfig;
use crate::net::api::{HttpApi, VisionApi};
use crate::net::types::{ApiError, Credential, Detection};
use crate::state::credential::{FileTokenStore, TokenStore};
use crate::state::results::{SortKey, SortSpec};
use crate::state::session::Session;
use crate::state::analysis::Workspace;

/// Shared client state. Clone is cheap; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn VisionApi>,
    pub tokens: Arc<dyn TokenStore>,
    session: Arc<Mutex<Session>>,
    workspace: Arc<Mutex<Workspace>>,
}

impl AppState {
    #[must_use]
    pub fn new(api: Arc<dyn VisionApi>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            tokens,
            session: Arc::new(Mutex::new(Session::default())),
            workspace: Arc::new(Mutex::new(Workspace::default())),
        }
    }

    /// Production wiring: HTTP transport plus file-backed credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let api = HttpApi::new(config.clone())?;
        let tokens = FileTokenStore::new(config.token_path.clone());
        Ok(Self::new(Arc::new(api), Arc::new(tokens)))
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut Self::lock(&self.session))
    }

    /// Run `f` with exclusive access to the workspace.
    pub fn with_workspace<R>(&self, f: impl FnOnce(&mut Workspace) -> R) -> R {
        f(&mut Self::lock(&self.workspace))
    }

    /// Snapshot of the session for rendering.
    #[must_use]
    pub fn session(&self) -> Session {
        self.with_session(|s| s.clone())
    }

    /// Snapshot of the workspace for rendering.
    #[must_use]
    pub fn workspace(&self) -> Workspace {
        self.with_workspace(|ws| ws.clone())
    }

    /// The credential, but only once the session guard has resolved it to an
    /// identity.
    #[must_use]
    pub fn validated_credential(&self) -> Option<Credential> {
        self.with_session(|s| if s.is_authenticated() { s.credential.clone() } else { None })
    }

    /// Select a results column (toggles direction on repeat).
    pub fn select_sort(&self, key: SortKey) -> SortSpec {
        self.with_workspace(|ws| ws.select_sort(key))
    }

    #[must_use]
    pub fn sorted_detections(&self) -> Vec<Detection> {
        self.with_workspace(|ws| ws.sorted_detections())
    }

    /// Replace the unsent chat input.
    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.with_workspace(|ws| ws.thread_mut().draft = text);
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
