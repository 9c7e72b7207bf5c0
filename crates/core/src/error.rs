use chrono::Utc;
use serde::Serialize;
use std::fmt;

/// Closed error taxonomy shared by the services. Each kind carries a
/// human-readable detail string; the HTTP boundary maps kinds to statuses
/// as a total function over this enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Malformed date string, start > end, or span over the supported window.
    InvalidRange(String),
    /// A resolved filter or lookup yielded nothing.
    NotFound(String),
    /// Caller-supplied input failed validation (e.g. blank geocode query).
    InvalidInput(String),
    /// The record already exists or was saved too recently.
    Conflict(String),
    /// A provider or record-store call failed or timed out.
    Upstream(String),
}

impl ServiceError {
    pub fn upstream(detail: impl Into<String>) -> Self {
        ServiceError::Upstream(detail.into())
    }

    pub fn detail(&self) -> &str {
        match self {
            ServiceError::InvalidRange(d)
            | ServiceError::NotFound(d)
            | ServiceError::InvalidInput(d)
            | ServiceError::Conflict(d)
            | ServiceError::Upstream(d) => d,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::InvalidRange(_) | ServiceError::InvalidInput(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Upstream(_) => 502,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ServiceError::InvalidRange(_) => "Invalid range",
            ServiceError::NotFound(_) => "Not found",
            ServiceError::InvalidInput(_) => "Invalid input",
            ServiceError::Conflict(_) => "Conflict",
            ServiceError::Upstream(_) => "Upstream service error",
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::InvalidRange(d) => write!(f, "invalid range: {d}"),
            ServiceError::NotFound(d) => write!(f, "not found: {d}"),
            ServiceError::InvalidInput(d) => write!(f, "invalid input: {d}"),
            ServiceError::Conflict(d) => write!(f, "conflict: {d}"),
            ServiceError::Upstream(d) => write!(f, "upstream error: {d}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Wire shape of an error response, shared by all three services.
#[derive(Debug, Clone, Serialize)]
pub struct HttpErrorInfo {
    pub status_code: u16,
    pub message: String,
    pub detail: Option<String>,
    pub timestamp: String,
}

impl HttpErrorInfo {
    pub fn from_service_error(err: &ServiceError) -> Self {
        Self {
            status_code: err.status_code(),
            message: err.message().to_string(),
            detail: Some(err.detail().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            message: "Internal Server Error".to_string(),
            detail: Some(detail.into()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status_code: 503,
            message: "Service Unavailable".to_string(),
            detail: Some("database is not reachable".to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_total() {
        assert_eq!(ServiceError::InvalidRange("x".into()).status_code(), 400);
        assert_eq!(ServiceError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ServiceError::Conflict("x".into()).status_code(), 409);
        assert_eq!(ServiceError::Upstream("x".into()).status_code(), 502);
    }

    #[test]
    fn display_includes_detail() {
        let err = ServiceError::InvalidRange("start must be on or before end".into());
        assert!(err.to_string().contains("start must be on or before end"));
    }

    #[test]
    fn error_body_carries_kind_and_detail() {
        let err = ServiceError::NotFound("no such range".into());
        let body = HttpErrorInfo::from_service_error(&err);
        assert_eq!(body.status_code, 404);
        assert_eq!(body.message, "Not found");
        assert_eq!(body.detail.as_deref(), Some("no such range"));
    }
}
