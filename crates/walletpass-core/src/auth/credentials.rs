use std::fmt;
use std::path::{Path, PathBuf};

use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use thiserror::Error;

/// Token endpoint used when the key file does not name one.
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Service account key not found at {0}")]
    Missing(PathBuf),

    #[error("Failed to read service account key {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed service account key: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Service account key has an empty {0}")]
    EmptyField(&'static str),

    #[error("Service account private key is not a usable RSA key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
}

/// A service-account key file as downloaded from the Cloud console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: Option<String>,
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// Keeps the PEM out of logs and error chains.
impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, CredentialsError> {
        if !path.exists() {
            return Err(CredentialsError::Missing(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| {
            CredentialsError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, CredentialsError> {
        let key: ServiceAccountKey = serde_json::from_str(json)?;
        if key.client_email.trim().is_empty() {
            return Err(CredentialsError::EmptyField("client_email"));
        }
        if key.private_key.trim().is_empty() {
            return Err(CredentialsError::EmptyField("private_key"));
        }
        key.encoding_key()?;
        Ok(key)
    }

    /// RS256 signing key.
    pub fn encoding_key(&self) -> Result<EncodingKey, CredentialsError> {
        EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(CredentialsError::InvalidKey)
    }
}
