//! Conversation orchestrator: questions about the analysed image.
//!
//! DESIGN
//! ======
//! Chat is optimistic. The question is appended before the request leaves and
//! the thread enters `pending`; a second question while pending is refused.
//! The reply is applied only if the ticket captured at send time still names
//! the live thread, so a reply for image A never lands in image B's thread.
//!
//! ERROR HANDLING
//! ==============
//! A failed request closes the turn with a fixed assistant message and is
//! not retried. The user may ask again.

use tracing::{info, warn};

use crate::app::AppState;
use crate::net::types::ChatRequest;
use crate::state::analysis::AskRejection;
use crate::state::chat::{ChatMessage, FALLBACK_REPLY};

/// What happened to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    /// The question was not sent; the thread is unchanged.
    Rejected(AskRejection),
    /// No validated session; the thread is unchanged.
    Unauthenticated,
    Answered,
    /// The request failed and the fallback reply was appended.
    FellBack,
    /// The thread was replaced before the reply arrived.
    Stale,
}

/// Ask `question` about the current image.
pub async fn ask(state: &AppState, question: &str) -> AskOutcome {
    let Some(credential) = state.validated_credential() else {
        return AskOutcome::Unauthenticated;
    };
    let (ticket, image_id) = match state.with_workspace(|ws| ws.begin_question(question)) {
        Ok(opened) => opened,
        Err(rejection) => return AskOutcome::Rejected(rejection),
    };

    let request = ChatRequest { question, image_id };
    let (reply, outcome) = match state.api.chat(&credential, request).await {
        Ok(response) => (ChatMessage::assistant(response.response), AskOutcome::Answered),
        Err(e) => {
            warn!(error = %e, code = e.error_code(), retryable = e.retryable(), image_id, "chat request failed");
            (ChatMessage::assistant(FALLBACK_REPLY), AskOutcome::FellBack)
        }
    };

    if state.with_workspace(|ws| ws.finish_question(ticket, reply)) {
        info!(image_id, ?outcome, "chat turn closed");
        outcome
    } else {
        info!(image_id, generation = ticket.generation, "discarding stale chat reply");
        AskOutcome::Stale
    }
}

/// Send whatever is in the thread's draft.
pub async fn ask_draft(state: &AppState) -> AskOutcome {
    let draft = state.with_workspace(|ws| ws.thread().draft.clone());
    ask(state, &draft).await
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod conversation_test;
