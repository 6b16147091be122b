//! Detection orchestrator: one multipart request per accepted upload.
//!
//! ERROR HANDLING
//! ==============
//! Any failure (transport, status, decode) leaves the reset values in place
//! and raises the fixed failure notice. Nothing is retried; the user
//! re-uploads. Results whose ticket is stale touch nothing.

use tracing::{info, warn};

use crate::app::AppState;
use crate::net::types::Credential;
use crate::state::analysis::{ImageFile, Ticket};

/// What happened to an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The file was not an image (drop only); nothing changed.
    Ignored,
    /// No validated session; nothing changed.
    Unauthenticated,
    Detected { image_id: i64, detections: usize },
    /// Detection failed; the notice is showing.
    Failed,
    /// A newer upload or a removal superseded this one.
    Stale,
}

/// Run detection for the upload identified by `ticket`.
pub async fn detect(state: &AppState, ticket: Ticket, credential: &Credential, file: &ImageFile) -> UploadOutcome {
    let generation = ticket.generation;
    match state.api.detect(credential, file).await {
        Ok(response) => {
            let image_id = response.image_id;
            let detections = response.detections.len();
            if state.with_workspace(|ws| ws.apply_detection(ticket, response)) {
                info!(image_id, detections, generation, "detection complete");
                UploadOutcome::Detected { image_id, detections }
            } else {
                info!(image_id, generation, "discarding stale detection result");
                UploadOutcome::Stale
            }
        }
        Err(e) => {
            if state.with_workspace(|ws| ws.fail_detection(ticket)) {
                warn!(error = %e, code = e.error_code(), retryable = e.retryable(), file = %file.name, "detection failed");
                UploadOutcome::Failed
            } else {
                info!(generation, "discarding stale detection failure");
                UploadOutcome::Stale
            }
        }
    }
}

#[cfg(test)]
#[path = "detection_test.rs"]
mod detection_test;
