use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// A single field-level validation problem.
///
/// Validation errors are collected before any side effect and returned as a
/// complete set, not just the first offender.
#[derive(Debug, Clone, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Malformed or missing input fields, caught before any side effect
    #[error("Validation failed: {}", format_issues(.0))]
    Validation(Vec<FieldIssue>),

    /// A requested product is missing, inactive, or belongs to another store
    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    /// Stock cannot cover the requested quantity
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Tax period has already been closed and locked
    #[error("Tax period already closed: {0}")]
    AlreadyClosed(String),

    /// Report requested against a period that is still open
    #[error("Tax period not closed: {0}")]
    PeriodNotClosed(String),

    /// Resource not found (or not owned by the caller's store)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or unresolved store/user context
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unit of work exceeded its wall-clock budget; nothing was committed
    #[error("Transaction timed out: {0}")]
    TransactionTimeout(String),

    /// Frozen period aggregates and live data disagree
    #[error("Data integrity violation: {0}")]
    Integrity(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    /// Machine-checkable error kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_failed",
            AppError::ProductUnavailable(_) => "product_unavailable",
            AppError::InsufficientStock { .. } => "insufficient_stock",
            AppError::AlreadyClosed(_) => "already_closed",
            AppError::PeriodNotClosed(_) => "period_not_closed",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::TransactionTimeout(_) => "transaction_timeout",
            AppError::Integrity(_) => "integrity_violation",
            AppError::Database(_) => "database_error",
            AppError::Configuration(_) => "configuration_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldIssue::new(field, msg)])
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        let mut body = serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
                "code": status_code.as_u16(),
            }
        });

        if let AppError::Validation(issues) = self {
            body["error"]["issues"] = serde_json::json!(issues);
        }

        HttpResponse::build(status_code).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::ProductUnavailable(_)
            | AppError::InsufficientStock { .. }
            | AppError::AlreadyClosed(_)
            | AppError::PeriodNotClosed(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::TransactionTimeout(_)
            | AppError::Integrity(_)
            | AppError::Database(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
