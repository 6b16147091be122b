//! Auth-session state for the current client instance.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by the session guard and every authenticated call to coordinate
//! redirects and to read the bearer credential.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::net::types::{Credential, User};

/// Which top-level view the front end should show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    /// Credential is being validated; render nothing yet.
    #[default]
    Loading,
    /// No valid session: show login/signup.
    Unauthenticated,
    /// Authenticated workspace.
    Dashboard,
}

/// Credential + identity for the one session this client holds.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub credential: Option<Credential>,
    pub identity: Option<User>,
    pub view: View,
    /// True once the guard has started validating the current credential.
    pub guard_started: bool,
}

impl Session {
    /// Hold a freshly issued credential. Identity is unknown until the guard
    /// validates it.
    pub fn set(&mut self, credential: Credential) {
        self.credential = Some(credential);
        self.identity = None;
        self.view = View::Loading;
        self.guard_started = false;
    }

    /// Record the identity the credential resolved to.
    pub fn authenticate(&mut self, user: User) {
        self.identity = Some(user);
        self.view = View::Dashboard;
        self.guard_started = true;
    }

    /// Drop credential and identity and route to the unauthenticated view.
    pub fn clear(&mut self) {
        self.credential = None;
        self.identity = None;
        self.view = View::Unauthenticated;
        self.guard_started = true;
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some() && self.identity.is_some()
    }
}

/// Avatar initials: first letter of up to two words, upper-cased.
#[must_use]
pub fn initials(name: &str) -> String {
    let letters = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect::<String>();
    if letters.is_empty() { "?".to_owned() } else { letters }
}
