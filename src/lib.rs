//! # visionchat
//!
//! Client-side session and workflow controller for an image-detection +
//! follow-up chat service. Sequences login, upload, detection and chat, and
//! keeps every asynchronous result scoped to the image that issued it.
//!
//! The crate is UI-agnostic: a front end drives [`app::AppState`] through the
//! operations in [`services`] and renders the plain models in [`state`]. The
//! `cli/` crate is the terminal front end.

pub mod app;
pub mod config;
pub mod net;
pub mod services;
pub mod state;
