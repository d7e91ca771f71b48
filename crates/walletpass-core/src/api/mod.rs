//! REST API client module for the Google Wallet objects API.
//!
//! This module provides the `WalletClient` for inserting, reading and
//! patching offer classes and objects, plus the multipart batch codec.
//!
//! Requests carry an OAuth bearer token obtained from a service-account
//! `Session` (see `crate::auth`).

pub mod batch;
pub mod client;
pub mod error;

pub use batch::{BatchPart, BatchRequest, BatchResponse};
pub use client::{SavedResource, Upsert, WalletClient};
pub use error::ApiError;
