//! Upload intake: file picker, drag-and-drop, and image removal.

use tracing::debug;

use super::detection::{self, UploadOutcome};
use crate::app::AppState;
use crate::state::analysis::{ImageFile, Workspace};

/// Accept a file from the picker. The picker's own filter decides what is
/// offered, so the content type is not re-checked here.
pub async fn select_file(state: &AppState, file: ImageFile) -> UploadOutcome {
    let Some(credential) = state.validated_credential() else {
        debug!(file = %file.name, "upload without validated session ignored");
        return UploadOutcome::Unauthenticated;
    };
    // Reset happens before dispatch so no old result can land on the new file.
    let ticket = state.with_workspace(|ws| ws.begin_upload(file.clone()));
    detection::detect(state, ticket, &credential, &file).await
}

/// Accept a dropped file. Drops without an image-typed file are no-ops.
pub async fn drop_file(state: &AppState, file: Option<ImageFile>) -> UploadOutcome {
    match file {
        Some(file) if file.is_image() => select_file(state, file).await,
        Some(file) => {
            debug!(file = %file.name, content_type = %file.content_type, "non-image drop ignored");
            UploadOutcome::Ignored
        }
        None => UploadOutcome::Ignored,
    }
}

/// Drop the current image, its results, and its conversation.
pub fn remove_image(state: &AppState) {
    state.with_workspace(Workspace::clear);
    debug!("image removed");
}

#[cfg(test)]
#[path = "intake_test.rs"]
mod intake_test;
