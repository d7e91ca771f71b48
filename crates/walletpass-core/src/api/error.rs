use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No access token set on the client")]
    MissingToken,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - check the service account key and issuer permissions: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// `{"error": {"code": 409, "message": "...", "status": "ALREADY_EXISTS"}}`
#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GoogleErrorBody {
    Api {
        message: String,
        #[serde(default)]
        status: Option<String>,
    },
    // OAuth token endpoint: {"error": "invalid_grant", "error_description": "..."}
    OAuth(String),
}

#[derive(Debug, Deserialize)]
struct OAuthErrorDescription {
    #[serde(default)]
    error_description: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the human-readable message out of a Google error body, falling
    /// back to the (truncated) raw body.
    pub fn message_from_body(body: &str) -> String {
        match serde_json::from_str::<GoogleErrorEnvelope>(body) {
            Ok(GoogleErrorEnvelope {
                error: GoogleErrorBody::Api { message, status },
            }) => match status {
                Some(status) => format!("{} ({})", message, status),
                None => message,
            },
            Ok(GoogleErrorEnvelope {
                error: GoogleErrorBody::OAuth(code),
            }) => {
                let description = serde_json::from_str::<OAuthErrorDescription>(body)
                    .ok()
                    .and_then(|d| d.error_description);
                match description {
                    Some(description) => format!("{}: {}", code, description),
                    None => code,
                }
            }
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::message_from_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::AlreadyExists(message),
            429 => ApiError::RateLimited(message),
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}
