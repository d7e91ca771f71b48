//! API client for the Google Wallet objects REST API.
//!
//! This module provides the `WalletClient` struct for making authenticated
//! requests against the offer class/object collections and the batch
//! endpoint. Each public operation has a matching `*_request` builder so the
//! exact request can be inspected without sending it.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, Request, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::batch::{BatchRequest, BatchResponse};
use super::ApiError;
use crate::models::{ObjectState, OfferClass, OfferObject};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Version prefix of the REST collections
const API_PATH: &str = "/walletobjects/v1";

const BATCH_PATH: &str = "/batch";

const OFFER_CLASS_COLLECTION: &str = "offerClass";
const OFFER_OBJECT_COLLECTION: &str = "offerObject";

/// Build the shared HTTP client.
pub(crate) fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

/// Check if response is successful, returning an error with body if not.
pub(crate) async fn check_response(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        warn!(url = %url, status = %status, "Request failed");
        Err(ApiError::from_status(status, &body))
    }
}

/// A class or object as returned by the API.
#[derive(Debug, Clone)]
pub struct SavedResource {
    pub id: String,
    /// Full response body, including fields not modelled locally.
    pub body: serde_json::Value,
}

/// Result of an insert that first checks whether the resource exists.
#[derive(Debug, Clone)]
pub enum Upsert {
    Existing(SavedResource),
    Inserted(SavedResource),
}

impl Upsert {
    pub fn resource(&self) -> &SavedResource {
        match self {
            Upsert::Existing(saved) | Upsert::Inserted(saved) => saved,
        }
    }

    pub fn into_resource(self) -> SavedResource {
        match self {
            Upsert::Existing(saved) | Upsert::Inserted(saved) => saved,
        }
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_not_found)
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    id: String,
}

/// API client for Google Wallet.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct WalletClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl WalletClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new WalletClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let token = self.token.as_ref().ok_or(ApiError::MissingToken)?;
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        Ok(headers)
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}{}/{}", self.base_url, API_PATH, collection)
    }

    fn resource_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .request(method, url)
            .headers(self.auth_headers()?))
    }

    // ------------------------------------------------------------------------
    // Request builders
    // ------------------------------------------------------------------------

    pub fn insert_class_request(&self, class: &OfferClass) -> Result<Request> {
        Ok(self
            .request(Method::POST, &self.collection_url(OFFER_CLASS_COLLECTION))?
            .json(class)
            .build()?)
    }

    pub fn get_class_request(&self, id: &str) -> Result<Request> {
        Ok(self
            .request(Method::GET, &self.resource_url(OFFER_CLASS_COLLECTION, id))?
            .build()?)
    }

    pub fn insert_object_request(&self, object: &OfferObject) -> Result<Request> {
        Ok(self
            .request(Method::POST, &self.collection_url(OFFER_OBJECT_COLLECTION))?
            .json(object)
            .build()?)
    }

    pub fn get_object_request(&self, id: &str) -> Result<Request> {
        Ok(self
            .request(Method::GET, &self.resource_url(OFFER_OBJECT_COLLECTION, id))?
            .build()?)
    }

    pub fn patch_object_request(&self, id: &str, patch: &OfferObject) -> Result<Request> {
        Ok(self
            .request(Method::PATCH, &self.resource_url(OFFER_OBJECT_COLLECTION, id))?
            .json(patch)
            .build()?)
    }

    pub fn batch_request(&self, batch: &BatchRequest) -> Result<Request> {
        let url = format!("{}{}", self.base_url, BATCH_PATH);
        Ok(self
            .request(Method::POST, &url)?
            .header(header::CONTENT_TYPE, batch.content_type())
            .body(batch.encode())
            .build()?)
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    async fn send(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(method = %method, url = %url, "Sending request");

        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        Ok(check_response(response).await?)
    }

    async fn send_for_resource(&self, request: Request) -> Result<SavedResource> {
        let url = request.url().clone();
        let body: serde_json::Value = self
            .send(request)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))?;

        let ResourceId { id } = serde_json::from_value(body.clone())
            .map_err(|e| ApiError::InvalidResponse(format!("Response has no id: {}", e)))?;

        Ok(SavedResource { id, body })
    }

    pub async fn insert_class(&self, class: &OfferClass) -> Result<SavedResource> {
        let saved = self
            .send_for_resource(self.insert_class_request(class)?)
            .await?;
        info!(id = %saved.id, "Inserted offer class");
        Ok(saved)
    }

    pub async fn get_class(&self, id: &str) -> Result<SavedResource> {
        self.send_for_resource(self.get_class_request(id)?).await
    }

    /// Insert the class unless a GET finds it already. Only a 404 from the
    /// lookup leads to the insert; other lookup errors are returned.
    pub async fn insert_class_if_absent(&self, class: &OfferClass) -> Result<Upsert> {
        match self.get_class(&class.id).await {
            Ok(existing) => {
                debug!(id = %existing.id, "Offer class already exists");
                Ok(Upsert::Existing(existing))
            }
            Err(e) if is_not_found(&e) => Ok(Upsert::Inserted(self.insert_class(class).await?)),
            Err(e) => Err(e.context("Unable to look up class")),
        }
    }

    pub async fn insert_object(&self, object: &OfferObject) -> Result<SavedResource> {
        let saved = self
            .send_for_resource(self.insert_object_request(object)?)
            .await?;
        info!(id = %saved.id, "Inserted offer object");
        Ok(saved)
    }

    pub async fn get_object(&self, id: &str) -> Result<SavedResource> {
        self.send_for_resource(self.get_object_request(id)?).await
    }

    pub async fn insert_object_if_absent(&self, object: &OfferObject) -> Result<Upsert> {
        match self.get_object(&object.id).await {
            Ok(existing) => {
                debug!(id = %existing.id, "Offer object already exists");
                Ok(Upsert::Existing(existing))
            }
            Err(e) if is_not_found(&e) => Ok(Upsert::Inserted(self.insert_object(object).await?)),
            Err(e) => Err(e.context("Unable to look up object")),
        }
    }

    pub async fn patch_object(&self, id: &str, patch: &OfferObject) -> Result<SavedResource> {
        let saved = self
            .send_for_resource(self.patch_object_request(id, patch)?)
            .await?;
        info!(id = %saved.id, "Patched offer object");
        Ok(saved)
    }

    /// Set the object's state to expired. When a valid time interval is
    /// already set the pass would also expire on its own within a day of
    /// the interval's end.
    pub async fn expire_object(&self, id: &str) -> Result<SavedResource> {
        self.patch_object(id, &OfferObject::state_patch(ObjectState::Expired))
            .await
    }

    pub async fn batch(&self, batch: &BatchRequest) -> Result<BatchResponse> {
        debug!(operations = batch.len(), "Sending batch");
        let response = self.send(self.batch_request(batch)?).await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = response
            .text()
            .await
            .context("Failed to read batch response body")?;

        let parsed = BatchResponse::parse(&content_type, &text)?;
        info!(
            parts = parsed.parts.len(),
            all_succeeded = parsed.all_succeeded(),
            "Batch completed"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::sample_offer_class;

    const BASE: &str = "https://walletobjects.googleapis.com/";

    fn body_json(request: &Request) -> serde_json::Value {
        let bytes = request
            .body()
            .and_then(|b| b.as_bytes())
            .expect("request should have an in-memory body");
        serde_json::from_slice(bytes).unwrap()
    }

    fn bearer(request: &Request) -> &str {
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[test]
    fn test_requires_token() {
        let client = WalletClient::new(BASE).unwrap();
        let err = client.get_class_request("1.cls").unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::MissingToken)));
    }

    #[test]
    fn test_insert_class_request() {
        let client = WalletClient::new(BASE).unwrap().with_token("tok".to_string());
        let class = sample_offer_class("338", "cls");
        let request = client.insert_class_request(&class).unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://walletobjects.googleapis.com/walletobjects/v1/offerClass"
        );
        assert_eq!(bearer(&request), "Bearer tok");
        assert_eq!(body_json(&request), serde_json::to_value(&class).unwrap());
    }

    #[test]
    fn test_expire_patch_request() {
        let client = WalletClient::new(BASE).unwrap().with_token("tok".to_string());
        let request = client
            .patch_object_request("338.obj", &OfferObject::state_patch(ObjectState::Expired))
            .unwrap();

        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(
            request.url().as_str(),
            "https://walletobjects.googleapis.com/walletobjects/v1/offerObject/338.obj"
        );
        assert_eq!(body_json(&request), serde_json::json!({"state": "EXPIRED"}));
    }

    #[test]
    fn test_get_object_request() {
        let client = WalletClient::new(BASE).unwrap().with_token("tok".to_string());
        let request = client.get_object_request("338.obj").unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert!(request.body().is_none());
        assert!(request.url().path().ends_with("/offerObject/338.obj"));
    }

    #[test]
    fn test_batch_request() {
        let client = WalletClient::new(BASE).unwrap().with_token("tok".to_string());
        let objects = vec![OfferObject::new(
            "338.a".to_string(),
            "338.cls".to_string(),
            ObjectState::Active,
        )];
        let batch = BatchRequest::create_objects(&objects).unwrap();
        let request = client.batch_request(&batch).unwrap();

        assert_eq!(request.url().as_str(), "https://walletobjects.googleapis.com/batch");
        assert_eq!(
            request.headers().get(header::CONTENT_TYPE).unwrap(),
            "multipart/mixed; boundary=batch_createobjectbatch"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(std::str::from_utf8(body).unwrap(), batch.encode());
    }
}
