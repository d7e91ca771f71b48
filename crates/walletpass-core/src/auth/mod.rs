//! Authentication module for service-account credentials and access tokens.
//!
//! This module provides:
//! - `ServiceAccountKey`: the parsed key file from the Cloud console
//! - `Session`: OAuth access tokens obtained with the JWT-bearer grant,
//!   cached until shortly before they expire
//!
//! The same key also signs save-to-wallet tokens (see `crate::jwt`).

pub mod credentials;
pub mod session;

pub use credentials::{CredentialsError, ServiceAccountKey};
pub use session::{Session, SessionData, WALLET_SCOPE};
