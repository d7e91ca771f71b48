//! Core library for walletpass.
//!
//! Everything needed to talk to the Google Wallet objects API as an issuer:
//!
//! - `auth`: service-account keys and OAuth access tokens
//! - `api`: the REST client, its error type and the multipart batch codec
//! - `models`: offer class/object resources
//! - `jwt`: signed "save to wallet" tokens and links
//! - `config`: file + environment configuration
//! - `ids` / `samples`: resource id helpers and the demo payloads

pub mod api;
pub mod auth;
pub mod config;
pub mod ids;
pub mod jwt;
pub mod models;
pub mod samples;

pub use api::{ApiError, WalletClient};
pub use auth::{ServiceAccountKey, Session};
pub use config::{Config, Settings};
pub use jwt::{PassSigner, SavePayload};
