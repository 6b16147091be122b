//! Networking modules for the vision + chat REST service.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` defines the request seam and its `reqwest` transport, and `types`
//! defines the wire schema shared with the service.

pub mod api;
pub mod types;
