//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes. Every response carries
//! a Vietnamese `user_message` for display to shop staff.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::approval::WorkflowError;
use crate::export::ExportError;
use crate::storage::StorageError;
use crate::variance::VarianceError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Variance report error
    #[error("{0}")]
    Variance(#[from] VarianceError),

    /// Approval workflow error
    #[error("{0}")]
    Workflow(#[from] WorkflowError),

    /// Export error
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub user_message: String,
}

const MSG_VALIDATION: &str = "Dữ liệu không hợp lệ. Vui lòng kiểm tra lại.";
const MSG_NOT_FOUND: &str = "Không tìm thấy dữ liệu yêu cầu.";
const MSG_DUPLICATE: &str = "Dữ liệu đã tồn tại.";
const MSG_ALREADY_DECIDED: &str = "Yêu cầu này đã được xử lý trước đó.";
const MSG_NO_SUGGESTION: &str = "Báo cáo chênh lệch này không có đề xuất điều chỉnh.";
const MSG_UNAVAILABLE: &str = "Không thể kết nối cơ sở dữ liệu. Vui lòng thử lại sau.";
const MSG_INTERNAL: &str = "Đã xảy ra lỗi hệ thống. Vui lòng thử lại sau.";

type Classification = (StatusCode, &'static str, &'static str);

fn classify_storage(err: &StorageError) -> Classification {
    match err {
        StorageError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", MSG_NOT_FOUND),
        StorageError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE", MSG_DUPLICATE),
        StorageError::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            MSG_UNAVAILABLE,
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            MSG_INTERNAL,
        ),
    }
}

impl ApiError {
    /// HTTP status, stable error code and end-user message
    fn classify(&self) -> Classification {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", MSG_VALIDATION),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", MSG_NOT_FOUND),
            ApiError::Storage(e) => classify_storage(e),
            ApiError::Variance(VarianceError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", MSG_VALIDATION)
            }
            ApiError::Variance(VarianceError::Storage(e)) => classify_storage(e),
            ApiError::Workflow(WorkflowError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", MSG_VALIDATION)
            }
            ApiError::Workflow(WorkflowError::AlreadyDecided { .. }) => {
                (StatusCode::CONFLICT, "ALREADY_DECIDED", MSG_ALREADY_DECIDED)
            }
            ApiError::Workflow(WorkflowError::NoSuggestion(_)) => {
                (StatusCode::CONFLICT, "NO_SUGGESTION", MSG_NO_SUGGESTION)
            }
            ApiError::Workflow(WorkflowError::Storage(e)) => classify_storage(e),
            ApiError::Export(ExportError::UnknownDataset(_) | ExportError::UnknownFormat(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", MSG_VALIDATION)
            }
            ApiError::Export(ExportError::Storage(e)) => classify_storage(e),
            ApiError::Export(ExportError::Encode(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR", MSG_INTERNAL)
            }
            ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", MSG_INTERNAL)
            }
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR", MSG_INTERNAL),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.classify().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, user_message) = self.classify();

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
                user_message: user_message.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ApprovalStatus;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StorageError::not_found("Product", 3)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StorageError::duplicate("Product", "SP1")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(StorageError::Unavailable("down".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(WorkflowError::AlreadyDecided {
                id: 1,
                status: ApprovalStatus::Approved
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(VarianceError::Storage(StorageError::not_found("Product", 9))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ExportError::UnknownFormat("pdf".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
