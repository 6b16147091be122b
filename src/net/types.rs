//! Wire DTOs and transport errors for the client/service boundary.
//!
//! DESIGN
//! ======
//! These types mirror the service's JSON payloads field for field so serde
//! decoding stays lossless. Identifiers arrive as JSON numbers and are
//! accepted in any integer-compatible form.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by service calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}")]
    Status { status: u16, detail: Option<String> },

    /// The response body could not be decoded.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// A login response carried no `access_token`.
    #[error("login response did not include an access token")]
    MissingToken,

    /// The credential could not be encoded as a header value.
    #[error("invalid credential header")]
    InvalidHeader,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Stable machine-readable code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_API_REQUEST",
            Self::Status { .. } => "E_API_STATUS",
            Self::Parse(_) => "E_API_PARSE",
            Self::MissingToken => "E_MISSING_TOKEN",
            Self::InvalidHeader => "E_INVALID_HEADER",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether a later identical request could plausibly succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }

    /// Server-provided `detail` text, if the failure carried one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

// =============================================================================
// CREDENTIAL
// =============================================================================

/// Opaque bearer token proving an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// The authenticated user as returned by `/api/auth/me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Service-assigned user identifier.
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    /// Login email.
    pub email: String,
    /// Display name; may be empty.
    #[serde(default)]
    pub full_name: String,
}

impl User {
    /// Name to show in the UI, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() { &self.email } else { &self.full_name }
    }
}

/// Body of a `/api/auth/login` response. The token is optional on the wire so
/// its absence can be reported as an auth failure instead of a parse error.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Form fields for `/api/auth/signup`.
#[derive(Clone, Debug, Serialize)]
pub struct SignupForm<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
}

/// Url-encoded fields for `/api/auth/login`.
#[derive(Clone, Debug, Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

// =============================================================================
// DETECTION
// =============================================================================

/// One recognized object instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label (e.g. `"cat"`).
    pub class_name: String,
    /// Normalized score in `[0, 1]`.
    pub confidence: f64,
    /// `[x1, y1, x2, y2]` in image pixel coordinates.
    pub bbox: [f64; 4],
}

/// Body of a `/api/detect` response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DetectResponse {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub image_id: i64,
    #[serde(default)]
    pub detections: Vec<Detection>,
    /// Displayable image reference, a `data:image/jpeg;base64,...` URL.
    pub annotated_image: String,
}

// =============================================================================
// CHAT
// =============================================================================

/// Fields for `/api/chat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatRequest<'a> {
    pub question: &'a str,
    pub image_id: i64,
}

/// Body of a `/api/chat` response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

// =============================================================================
// ERROR BODY
// =============================================================================

/// Extract a human-readable `detail` from an error body.
///
/// The service sends either `{"detail": "text"}` or a validation list
/// `{"detail": [{"msg": "..."}, ...]}`.
#[must_use]
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        serde_json::Value::Array(items) => {
            let messages = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect::<Vec<_>>();
            if messages.is_empty() { None } else { Some(messages.join("; ")) }
        }
        _ => None,
    }
}

fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            if let Some(float) = number.as_f64()
                && float.is_finite()
                && float.fract() == 0.0
                && float >= i64::MIN as f64
                && float <= i64::MAX as f64
            {
                return Ok(float as i64);
            }
            Err(D::Error::custom("expected integer-compatible number"))
        }
        _ => Err(D::Error::custom("expected number")),
    }
}
