//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Where to send the browser to start sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    pub url: String,
}

/// Tokens handed back to the console by the provider's redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Request to change one editor field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEditRequest<F> {
    pub field: F,
    pub value: String,
}

/// Result of a console command together with the session it left behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse<O, S> {
    pub outcome: O,
    pub session: S,
}

/// Health check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}
