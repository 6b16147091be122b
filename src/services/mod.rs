//! Workflow orchestrators operating on [`AppState`](crate::app::AppState).
//!
//! ARCHITECTURE
//! ============
//! Each service owns one user-facing workflow. Services read what they need
//! from state, release every lock, await the network, and re-lock to apply
//! the outcome only if the request is still current. State models under
//! `crate::state` stay synchronous and free of I/O.

pub mod auth;
pub mod conversation;
pub mod detection;
pub mod intake;
