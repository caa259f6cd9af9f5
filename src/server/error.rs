//! Client-facing error taxonomy.
//!
//! Every error body carries a stable machine-readable `code` next to
//! the human-readable `error` text, so clients branch on codes instead
//! of string-matching prose. Provider failures never reach this type;
//! adapters absorb them into empty results before a handler can see
//! them.

use crate::model::id::InvalidIdentifier;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    NotFound {
        message: &'static str,
        code: &'static str,
    },
    #[error("{message}")]
    BadRequest {
        message: &'static str,
        code: &'static str,
    },
    #[error("Service is under maintenance")]
    Maintenance,
}

impl ApiError {
    pub fn lyrics_not_found() -> Self {
        Self::NotFound {
            message: "Lyrics not found",
            code: "LYRICS_NOT_FOUND",
        }
    }

    pub fn stream_not_found() -> Self {
        Self::NotFound {
            message: "Audio stream not found",
            code: "STREAM_NOT_FOUND",
        }
    }

    pub fn track_not_found() -> Self {
        Self::NotFound {
            message: "Track not found",
            code: "TRACK_NOT_FOUND",
        }
    }

    pub fn missing_query() -> Self {
        Self::BadRequest {
            message: "Missing or empty query parameter",
            code: "MISSING_QUERY",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound { code, .. } | ApiError::BadRequest { code, .. } => code,
            ApiError::Maintenance => "MAINTENANCE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<InvalidIdentifier> for ApiError {
    fn from(_: InvalidIdentifier) -> Self {
        Self::BadRequest {
            message: "Invalid track id",
            code: "INVALID_ID",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id;

    #[test]
    fn codes_and_statuses_line_up() {
        assert_eq!(ApiError::lyrics_not_found().code(), "LYRICS_NOT_FOUND");
        assert_eq!(
            ApiError::lyrics_not_found().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::missing_query().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Maintenance.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn invalid_identifier_maps_to_bad_request() {
        let err = ApiError::from(id::decode("nope").unwrap_err());
        assert_eq!(err.code(), "INVALID_ID");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
