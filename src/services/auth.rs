//! Session guard, account entry, and teardown.
//!
//! DESIGN
//! ======
//! The guard validates the held credential against `/api/auth/me` once per
//! credential. Login and signup feed a fresh credential into the same guard,
//! so identity always comes from the service and never from the login form.
//!
//! ERROR HANDLING
//! ==============
//! Auth failures are never retried. A rejected stored credential is wiped
//! from memory and from the token store. Login failures surface the
//! service's `detail` text when it sent one.

use tracing::{info, warn};

use crate::app::AppState;
use crate::net::types::{ApiError, User};
use crate::state::analysis::Workspace;
use crate::state::session::{Session, View};

/// Message shown when the service gave no better explanation.
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0}")]
    Rejected(String),
}

impl AuthError {
    fn from_api(err: &ApiError) -> Self {
        Self::Rejected(err.detail().unwrap_or(AUTH_FAILED_MESSAGE).to_owned())
    }
}

/// How a guard run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// Nothing stored; show login.
    NoCredential,
    Authenticated(User),
    /// The service refused the credential; it has been discarded.
    Rejected,
    /// The guard already ran for this credential (or was superseded while
    /// waiting); carries the current view.
    Settled(View),
}

impl GuardOutcome {
    #[must_use]
    pub fn view(&self) -> View {
        match self {
            Self::NoCredential | Self::Rejected => View::Unauthenticated,
            Self::Authenticated(_) => View::Dashboard,
            Self::Settled(view) => *view,
        }
    }
}

// =============================================================================
// SESSION GUARD
// =============================================================================

/// Validate the held credential, at most once per credential.
pub async fn init_session(state: &AppState) -> GuardOutcome {
    let start = state.with_session(|s| {
        if s.guard_started {
            return Err(GuardOutcome::Settled(s.view));
        }
        let Some(credential) = s.credential.clone().or_else(|| state.tokens.load()) else {
            s.clear();
            return Err(GuardOutcome::NoCredential);
        };
        if s.credential.is_none() {
            s.set(credential.clone());
        }
        s.guard_started = true;
        Ok(credential)
    });
    let credential = match start {
        Ok(credential) => credential,
        Err(outcome) => return outcome,
    };

    let result = state.api.me(&credential).await;

    // A login or logout may have replaced the credential while we waited.
    let superseded = state.with_session(|s| (s.credential.as_ref() != Some(&credential)).then_some(s.view));
    if let Some(view) = superseded {
        return GuardOutcome::Settled(view);
    }

    match result {
        Ok(user) => {
            info!(user_id = user.id, "session validated");
            state.with_session(|s| s.authenticate(user.clone()));
            GuardOutcome::Authenticated(user)
        }
        Err(e) => {
            warn!(error = %e, code = e.error_code(), retryable = e.retryable(), "stored credential rejected");
            logout(state);
            GuardOutcome::Rejected
        }
    }
}

// =============================================================================
// ACCOUNT ENTRY
// =============================================================================

/// Exchange email and password for a credential and validate it.
///
/// # Errors
///
/// Returns [`AuthError::Missing`] for blank fields and [`AuthError::Rejected`]
/// when the service refuses the login or the issued credential.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<View, AuthError> {
    if email.trim().is_empty() {
        return Err(AuthError::Missing("email"));
    }
    if password.is_empty() {
        return Err(AuthError::Missing("password"));
    }

    let credential = match state.api.login(email.trim(), password).await {
        Ok(credential) => credential,
        Err(e) => {
            warn!(error = %e, code = e.error_code(), retryable = e.retryable(), "login failed");
            state.with_session(|s| {
                if !s.is_authenticated() {
                    s.view = View::Unauthenticated;
                }
            });
            return Err(AuthError::from_api(&e));
        }
    };

    state.tokens.store(&credential);
    state.with_session(|s| s.set(credential));
    state.with_workspace(Workspace::clear);

    match init_session(state).await {
        GuardOutcome::Authenticated(_) | GuardOutcome::Settled(View::Dashboard) => Ok(View::Dashboard),
        _ => Err(AuthError::Rejected(AUTH_FAILED_MESSAGE.to_owned())),
    }
}

/// Create an account, then log in with the same credentials.
///
/// # Errors
///
/// Returns [`AuthError::PasswordMismatch`] without contacting the service
/// when `confirm` differs from `password`, otherwise as [`login`].
pub async fn signup(
    state: &AppState,
    email: &str,
    password: &str,
    confirm: &str,
    full_name: &str,
) -> Result<View, AuthError> {
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    if email.trim().is_empty() {
        return Err(AuthError::Missing("email"));
    }
    if password.is_empty() {
        return Err(AuthError::Missing("password"));
    }

    if let Err(e) = state.api.signup(email.trim(), password, full_name.trim()).await {
        warn!(error = %e, code = e.error_code(), retryable = e.retryable(), "signup failed");
        return Err(AuthError::from_api(&e));
    }
    info!("account created");
    login(state, email, password).await
}

// =============================================================================
// TEARDOWN
// =============================================================================

/// Forget the credential and identity and drop the workspace. In-flight
/// results become stale.
pub fn logout(state: &AppState) {
    state.tokens.clear();
    state.with_session(Session::clear);
    state.with_workspace(Workspace::clear);
    info!("session cleared");
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;
