//! `multipart/mixed` batch requests.
//!
//! A batch body is a list of parts, each holding one embedded request line
//! and JSON body. The response mirrors it: one part per request, each
//! holding an embedded HTTP response.

use reqwest::Method;
use serde::Serialize;

use super::ApiError;
use crate::models::OfferObject;

pub const CREATE_OBJECTS_BOUNDARY: &str = "batch_createobjectbatch";
pub const OFFER_OBJECT_PATH: &str = "/walletobjects/v1/offerObject";

#[derive(Debug, Clone)]
struct BatchOperation {
    method: Method,
    path: String,
    body: String,
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    boundary: String,
    operations: Vec<BatchOperation>,
}

impl BatchRequest {
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            operations: Vec::new(),
        }
    }

    /// One insert per object, all under the create-objects boundary.
    pub fn create_objects(objects: &[OfferObject]) -> Result<Self, serde_json::Error> {
        let mut batch = Self::new(CREATE_OBJECTS_BOUNDARY);
        for object in objects {
            batch.push(Method::POST, OFFER_OBJECT_PATH, object)?;
        }
        Ok(batch)
    }

    pub fn push<T: Serialize>(
        &mut self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<(), serde_json::Error> {
        self.operations.push(BatchOperation {
            method,
            path: path.to_string(),
            body: serde_json::to_string(body)?,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }

    pub fn encode(&self) -> String {
        let mut data = String::new();
        for op in &self.operations {
            data.push_str(&format!("--{}\n", self.boundary));
            data.push_str("Content-Type: application/json\n\n");
            data.push_str(&format!("{} {}\n\n", op.method, op.path));
            data.push_str(&op.body);
            data.push_str("\n\n");
        }
        data.push_str(&format!("--{}--", self.boundary));
        data
    }
}

/// One embedded response from a batch.
#[derive(Debug, Clone)]
pub struct BatchPart {
    pub status: u16,
    pub body: Option<serde_json::Value>,
    pub raw_body: String,
}

impl BatchPart {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `id` of the created resource, if the part carries one.
    pub fn resource_id(&self) -> Option<&str> {
        self.body.as_ref()?.get("id")?.as_str()
    }
}

#[derive(Debug, Clone)]
pub struct BatchResponse {
    pub parts: Vec<BatchPart>,
    pub raw: String,
}

impl BatchResponse {
    pub fn parse(content_type: &str, body: &str) -> Result<Self, ApiError> {
        let boundary = boundary_from_content_type(content_type).ok_or_else(|| {
            ApiError::InvalidResponse(format!(
                "Batch response has no multipart boundary (content type: {})",
                content_type
            ))
        })?;

        // Delimiters only count at the start of a line
        let normalized = format!("\n{}", body.replace("\r\n", "\n"));
        let delimiter = format!("\n--{}", boundary);

        let mut parts = Vec::new();
        // First segment is the preamble
        for segment in normalized.split(delimiter.as_str()).skip(1) {
            if segment.starts_with("--") {
                break;
            }
            parts.push(parse_part(segment)?);
        }

        Ok(Self {
            parts,
            raw: body.to_string(),
        })
    }

    pub fn all_succeeded(&self) -> bool {
        self.parts.iter().all(BatchPart::is_success)
    }
}

fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
}

fn parse_part(segment: &str) -> Result<BatchPart, ApiError> {
    // Line end of the delimiter itself
    let segment = segment.strip_prefix('\n').unwrap_or(segment);

    // Part headers (possibly none), then the embedded HTTP response
    let embedded = match segment.strip_prefix('\n') {
        Some(rest) => rest,
        None => segment
            .split_once("\n\n")
            .map(|(_, rest)| rest)
            .ok_or_else(|| {
                ApiError::InvalidResponse("Batch part is missing its header block".to_string())
            })?,
    };

    let (head, body) = embedded.split_once("\n\n").unwrap_or((embedded, ""));
    let status_line = head.lines().next().unwrap_or_default();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| {
            ApiError::InvalidResponse(format!("Bad status line in batch part: {:?}", status_line))
        })?;

    let raw_body = body.trim().to_string();
    let body = if raw_body.is_empty() {
        None
    } else {
        serde_json::from_str(&raw_body).ok()
    };

    Ok(BatchPart {
        status,
        body,
        raw_body,
    })
}
