//! REST API seam for the detection + chat service.
//!
//! DESIGN
//! ======
//! Orchestrators depend on the [`VisionApi`] trait, never on `reqwest`
//! directly, so the workflow can be driven by an in-memory double in tests.
//! [`HttpApi`] is the production transport.
//!
//! ERROR HANDLING
//! ==============
//! Every transport, status and decode failure becomes an [`ApiError`]. Callers
//! decide how a failure maps onto UI state; nothing here retries.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::types::{
    ApiError, ChatRequest, ChatResponse, Credential, DetectResponse, LoginForm, LoginResponse, SignupForm, User,
    error_detail,
};
use crate::config::ClientConfig;
use crate::state::analysis::ImageFile;

pub const SIGNUP_PATH: &str = "/api/auth/signup";
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const ME_PATH: &str = "/api/auth/me";
pub const DETECT_PATH: &str = "/api/detect";
pub const CHAT_PATH: &str = "/api/chat";

/// Request/response contract of the remote service.
#[async_trait::async_trait]
pub trait VisionApi: Send + Sync {
    /// Create an account. The response body is not consumed.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the service rejects it.
    async fn signup(&self, email: &str, password: &str, full_name: &str) -> Result<(), ApiError>;

    /// Exchange email + password for a bearer credential.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingToken`] if the response carries no token.
    async fn login(&self, email: &str, password: &str) -> Result<Credential, ApiError>;

    /// Resolve a credential to the current user.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the credential is rejected or the call fails.
    async fn me(&self, credential: &Credential) -> Result<User, ApiError>;

    /// Upload an image and run object detection on it.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status or decode failure.
    async fn detect(&self, credential: &Credential, image: &ImageFile) -> Result<DetectResponse, ApiError>;

    /// Ask a question about a previously detected image.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status or decode failure.
    async fn chat(&self, credential: &Credential, request: ChatRequest<'_>) -> Result<ChatResponse, ApiError>;
}

// =============================================================================
// HTTP TRANSPORT
// =============================================================================

/// `reqwest`-backed implementation of [`VisionApi`].
pub struct HttpApi {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpApi {
    /// Build the HTTP client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        check_status(status, text)
    }
}

#[async_trait::async_trait]
impl VisionApi for HttpApi {
    async fn signup(&self, email: &str, password: &str, full_name: &str) -> Result<(), ApiError> {
        let form = SignupForm { email, password, full_name };
        self.send(self.http.post(self.config.endpoint(SIGNUP_PATH)).form(&form))
            .await?;
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<Credential, ApiError> {
        let form = LoginForm { username: email, password };
        let text = self
            .send(self.http.post(self.config.endpoint(LOGIN_PATH)).form(&form))
            .await?;
        let body: LoginResponse = decode(&text)?;
        credential_from_login(body)
    }

    async fn me(&self, credential: &Credential) -> Result<User, ApiError> {
        let request = self
            .http
            .get(self.config.endpoint(ME_PATH))
            .header(AUTHORIZATION, bearer_header(credential)?);
        let text = self.send(request).await?;
        decode(&text)
    }

    async fn detect(&self, credential: &Credential, image: &ImageFile) -> Result<DetectResponse, ApiError> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let request = self
            .http
            .post(self.config.endpoint(DETECT_PATH))
            .header(AUTHORIZATION, bearer_header(credential)?)
            .multipart(Form::new().part("file", part));
        let text = self.send(request).await?;
        decode(&text)
    }

    async fn chat(&self, credential: &Credential, request: ChatRequest<'_>) -> Result<ChatResponse, ApiError> {
        let request = self
            .http
            .post(self.config.endpoint(CHAT_PATH))
            .header(AUTHORIZATION, bearer_header(credential)?)
            .form(&request);
        let text = self.send(request).await?;
        decode(&text)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn bearer_header(credential: &Credential) -> Result<HeaderValue, ApiError> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {}", credential.as_str())).map_err(|_| ApiError::InvalidHeader)?;
    value.set_sensitive(true);
    Ok(value)
}

fn check_status(status: u16, text: String) -> Result<String, ApiError> {
    if (200..300).contains(&status) {
        Ok(text)
    } else {
        Err(ApiError::Status { status, detail: error_detail(&text) })
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

fn credential_from_login(body: LoginResponse) -> Result<Credential, ApiError> {
    body.access_token
        .filter(|token| !token.trim().is_empty())
        .map(Credential::new)
        .ok_or(ApiError::MissingToken)
}
