use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{method} {path} failed with HTTP {status}")]
    Status {
        method: Method,
        path: String,
        status: u16,
        body: Value,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected payload on {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Client initialization failed: {0}")]
    Init(String),
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthorized,
    NotFound,
    Rejected,
    Transport,
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            ServiceError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self.status() {
            Some(401) => FailureKind::Unauthorized,
            Some(404) => FailureKind::NotFound,
            Some(_) => FailureKind::Rejected,
            None => match self {
                ServiceError::Decode { .. } => FailureKind::Rejected,
                _ => FailureKind::Transport,
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == FailureKind::Unauthorized
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == FailureKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(code: u16) -> ServiceError {
        ServiceError::Status {
            method: Method::GET,
            path: "/lol-champ-select/v1/session".to_string(),
            status: code,
            body: json!({"message": "nope"}),
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(status(401).kind(), FailureKind::Unauthorized);
        assert_eq!(status(404).kind(), FailureKind::NotFound);
        assert_eq!(status(500).kind(), FailureKind::Rejected);
        assert_eq!(
            ServiceError::Transport("connection refused".into()).kind(),
            FailureKind::Transport
        );
    }

    #[test]
    fn test_display_mentions_route() {
        let message = status(404).to_string();
        assert!(message.contains("GET /lol-champ-select/v1/session"));
        assert!(message.contains("404"));
    }
}
