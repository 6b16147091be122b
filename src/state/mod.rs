//! Shared client-side state models.
//!
//! DESIGN
//! ======
//! State is split by domain (`session`, `analysis`, `chat`, `results`,
//! `credential`) so front ends can depend on small focused models. These are
//! plain data types; the async orchestration that mutates them lives in
//! `crate::services`.

pub mod analysis;
pub mod chat;
pub mod credential;
pub mod results;
pub mod session;
