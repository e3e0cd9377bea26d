//! Access layer for the local game client service.
//!
//! The client service listens on loopback with a self-signed certificate and a
//! per-launch token. This crate discovers that token from the running process,
//! issues authenticated requests and decodes the handful of payloads the
//! automations care about.

pub mod connection;
pub mod credential;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod service;

pub use connection::ClientConnection;
pub use credential::{Credential, CredentialProvider, ProcessInspector};
pub use error::{FailureKind, ServiceError};
pub use service::{HttpServiceClient, Payload, ServiceClient};

pub use reqwest::Method;
