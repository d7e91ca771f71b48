use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ServiceAccountKey;
use crate::api::client::{check_response, http_client};

/// OAuth scope for issuing and updating passes.
pub const WALLET_SCOPE: &str = "https://www.googleapis.com/auth/wallet_object.issuer";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the grant assertion. Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub struct SessionData {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check if the token will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        Utc::now() > self.expires_at - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_minutes().max(0)
    }
}

#[derive(Debug, Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

pub struct Session {
    key: ServiceAccountKey,
    client: Client,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        Ok(Self {
            key,
            client: http_client()?,
            data: None,
        })
    }

    /// Signed assertion for the JWT-bearer grant.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = GrantClaims {
            iss: &self.key.client_email,
            scope: WALLET_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.key.encoding_key()?)
            .context("Failed to sign token grant assertion")
    }

    /// Return a valid access token, fetching a new one when the cached
    /// token is missing or about to expire.
    pub async fn access_token(&mut self) -> Result<String> {
        if let Some(ref data) = self.data {
            if !data.needs_refresh() {
                return Ok(data.access_token.clone());
            }
            debug!(minutes_left = data.minutes_until_expiry(), "Access token expiring, refreshing");
        }

        let data = self.fetch_token().await?;
        let token = data.access_token.clone();
        self.data = Some(data);
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<SessionData> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        debug!(
            token_uri = %self.key.token_uri,
            email = %self.key.client_email,
            "Requesting access token"
        );

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("Failed to send token request")?;

        let response = check_response(response).await?;

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        Ok(SessionData {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
