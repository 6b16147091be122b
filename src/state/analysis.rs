//! Analysis workspace: the uploaded image, its detections, and its thread.
//!
//! SYSTEM CONTEXT
//! ==============
//! One [`Workspace`] exists per client. Each accepted upload (and each
//! removal) starts a new generation. Async work is tagged with the generation
//! that issued it, and results from older generations are dropped on arrival
//! instead of being applied to an unrelated image.
//!
//! TRADE-OFFS
//! ==========
//! There is no cancellation. A superseded detection or chat request still
//! runs to completion; only its result is discarded.

#[cfg(test)]
#[path = "analysis_test.rs"]
mod analysis_test;

use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use uuid::Uuid;

use super::chat::{ChatMessage, ConversationThread};
use super::results::{SortKey, SortSpec, sorted, toggle};
use crate::net::types::{DetectResponse, Detection};

/// User-visible notice shown when detection fails.
pub const DETECTION_FAILED_NOTICE: &str = "Detection failed. Please try again.";

// =============================================================================
// IMAGE FILE
// =============================================================================

/// A file picked or dropped by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

impl ImageFile {
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self { name: name.into(), content_type: content_type.into(), bytes: bytes.into() }
    }

    /// Read a file from disk, inferring its type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, content_type_for(path), bytes))
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// MIME type for a path's extension; unknown extensions are opaque binary.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// DISPLAY HANDLES
// =============================================================================

/// Local handle for showing the picked file before the service answers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(format!("blob:{}", Uuid::new_v4()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PreviewHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnnotatedImageError {
    #[error("annotated image is not a base64 data URL")]
    NotDataUrl,
    #[error("annotated image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Service-rendered image with boxes drawn in, as a `data:` URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedImage(String);

impl AnnotatedImage {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type declared by the data URL.
    #[must_use]
    pub fn mime(&self) -> Option<&str> {
        let (header, _) = self.0.strip_prefix("data:")?.split_once(',')?;
        header.split(';').next().filter(|m| !m.is_empty())
    }

    /// Decode the base64 payload to raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is not a base64 `data:` URL.
    pub fn decode(&self) -> Result<Vec<u8>, AnnotatedImageError> {
        let (header, payload) = self
            .0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or(AnnotatedImageError::NotDataUrl)?;
        if !header.ends_with(";base64") {
            return Err(AnnotatedImageError::NotDataUrl);
        }
        Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
    }
}

// =============================================================================
// ANALYSIS CONTEXT
// =============================================================================

/// Everything known about the currently uploaded image.
#[derive(Clone, Debug)]
pub struct AnalysisContext {
    pub source: ImageFile,
    pub preview: PreviewHandle,
    pub image_id: Option<i64>,
    pub annotated_image: Option<AnnotatedImage>,
    pub detections: Vec<Detection>,
    pub in_flight: bool,
    pub notice: Option<String>,
}

impl AnalysisContext {
    fn new(source: ImageFile) -> Self {
        Self {
            source,
            preview: PreviewHandle::new(),
            image_id: None,
            annotated_image: None,
            detections: Vec::new(),
            in_flight: false,
            notice: None,
        }
    }
}

// =============================================================================
// WORKSPACE
// =============================================================================

/// Identity of the workspace a request was issued against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub image_id: Option<i64>,
}

/// Why a question was not sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AskRejection {
    /// Empty or whitespace-only question.
    EmptyQuestion,
    /// No image has been analysed yet.
    NoImage,
    /// The analysed image has no detections to talk about.
    NoDetections,
    /// A previous question is still awaiting its reply.
    Busy,
}

/// The analysis context, its conversation thread, and the result sort state.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    analysis: Option<AnalysisContext>,
    thread: ConversationThread,
    sort: Option<SortSpec>,
    generation: u64,
}

impl Workspace {
    #[must_use]
    pub fn analysis(&self) -> Option<&AnalysisContext> {
        self.analysis.as_ref()
    }

    #[must_use]
    pub fn thread(&self) -> &ConversationThread {
        &self.thread
    }

    pub fn thread_mut(&mut self) -> &mut ConversationThread {
        &mut self.thread
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn image_id(&self) -> Option<i64> {
        self.analysis.as_ref().and_then(|a| a.image_id)
    }

    #[must_use]
    pub fn detections(&self) -> &[Detection] {
        self.analysis
            .as_ref()
            .map(|a| a.detections.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_detecting(&self) -> bool {
        self.analysis.as_ref().is_some_and(|a| a.in_flight)
    }

    #[must_use]
    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    /// Select a result column, toggling direction on repeat selection.
    pub fn select_sort(&mut self, key: SortKey) -> SortSpec {
        let next = toggle(self.sort, key);
        self.sort = Some(next);
        next
    }

    /// Detections projected through the current sort.
    #[must_use]
    pub fn sorted_detections(&self) -> Vec<Detection> {
        sorted(self.detections(), self.sort)
    }

    /// Whether the chat input should accept a question right now.
    #[must_use]
    pub fn can_ask(&self) -> bool {
        self.image_id().is_some()
            && !self.detections().is_empty()
            && self.thread.bound_image_id() == self.image_id()
            && !self.thread.is_pending()
    }

    // -------------------------------------------------------------------------
    // upload / remove
    // -------------------------------------------------------------------------

    /// Start a new analysis cycle for `file` and mark detection in flight.
    ///
    /// Every downstream field and the thread are reset before the caller
    /// dispatches the detection request.
    pub fn begin_upload(&mut self, file: ImageFile) -> Ticket {
        self.generation += 1;
        let mut context = AnalysisContext::new(file);
        context.in_flight = true;
        self.analysis = Some(context);
        self.thread = ConversationThread::default();
        Ticket { generation: self.generation, image_id: None }
    }

    /// Return to the empty-intake state.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.analysis = None;
        self.thread = ConversationThread::default();
    }

    // -------------------------------------------------------------------------
    // detection results
    // -------------------------------------------------------------------------

    fn current_analysis(&mut self, ticket: Ticket) -> Option<&mut AnalysisContext> {
        if ticket.generation != self.generation {
            return None;
        }
        self.analysis.as_mut()
    }

    /// Store a detection result. Returns `false` if the ticket is stale.
    pub fn apply_detection(&mut self, ticket: Ticket, response: DetectResponse) -> bool {
        let Some(context) = self.current_analysis(ticket) else {
            return false;
        };
        context.image_id = Some(response.image_id);
        context.detections = response.detections;
        context.annotated_image = Some(AnnotatedImage::new(response.annotated_image));
        context.in_flight = false;
        context.notice = None;
        self.thread.bind(response.image_id);
        true
    }

    /// Record a detection failure. Returns `false` if the ticket is stale.
    pub fn fail_detection(&mut self, ticket: Ticket) -> bool {
        let Some(context) = self.current_analysis(ticket) else {
            return false;
        };
        context.in_flight = false;
        context.notice = Some(DETECTION_FAILED_NOTICE.to_owned());
        true
    }

    // -------------------------------------------------------------------------
    // chat turns
    // -------------------------------------------------------------------------

    /// Validate and open a chat turn, returning the ticket its reply must
    /// present.
    ///
    /// # Errors
    ///
    /// Returns an [`AskRejection`] and leaves the thread unchanged when the
    /// question cannot be sent.
    pub fn begin_question(&mut self, question: &str) -> Result<(Ticket, i64), AskRejection> {
        if question.trim().is_empty() {
            return Err(AskRejection::EmptyQuestion);
        }
        if self.detections().is_empty() {
            return Err(AskRejection::NoDetections);
        }
        let Some(image_id) = self.image_id() else {
            return Err(AskRejection::NoImage);
        };
        if self.thread.bound_image_id() != Some(image_id) {
            return Err(AskRejection::NoImage);
        }
        if self.thread.is_pending() {
            return Err(AskRejection::Busy);
        }
        self.thread.open_turn(question);
        Ok((Ticket { generation: self.generation, image_id: Some(image_id) }, image_id))
    }

    /// Close the turn opened under `ticket`. Returns `false` (and changes
    /// nothing) if the thread has since been replaced.
    pub fn finish_question(&mut self, ticket: Ticket, reply: ChatMessage) -> bool {
        if ticket.generation != self.generation || ticket.image_id != self.thread.bound_image_id() {
            return false;
        }
        self.thread.close_turn(reply);
        true
    }
}
