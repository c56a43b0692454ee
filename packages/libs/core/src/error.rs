//! 공통 에러 타입
//!
//! reqgen 전체에서 사용되는 에러 타입을 정의합니다.

use std::collections::BTreeMap;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// reqgen 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Descriptor Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("descriptor parse error: {message}")]
    DescriptorParse { message: String },

    #[error("descriptor validation error: {message}")]
    DescriptorValidation { message: String },

    #[error("duplicate table name: {name}")]
    DuplicateTable { name: String },

    #[error("invalid field type: {type_name}")]
    InvalidFieldType { type_name: String },

    #[error("unknown field: table '{table}' has no field '{field}'")]
    UnknownField { table: String, field: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Request Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("operation '{operation}' is not enabled for table '{table}'")]
    OperationDisabled { table: String, operation: String },

    #[error("lookup key '{key}' is not allowed (allowed: {allowed:?})")]
    InvalidKey { key: String, allowed: Vec<String> },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("validation failed: {errors:?}")]
    Validation { errors: BTreeMap<String, String> },

    #[error("hook rejected request: {message}")]
    Hook { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Result Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("record not found in '{table}'")]
    NotFound { table: String },

    #[error("unexpected row shape: expected {expected} columns, got {actual}")]
    RowShape { expected: usize, actual: usize },

    // ─────────────────────────────────────────────────────────────────────────────
    // Database Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("database connection error: {message}")]
    Connection { message: String },

    #[error("database timeout: {message}")]
    Timeout { message: String },

    #[error("constraint violation: {message}")]
    Constraint { message: String },

    #[error("database error: {message}")]
    Database { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // IO/Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("export error: {message}")]
    Export { message: String },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 단일 필드 검증 에러 생성
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), message.into());
        Error::Validation { errors }
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::InvalidKey { .. }
            | Error::BadRequest { .. }
            | Error::Validation { .. }
            | Error::Hook { .. }
            | Error::Json(_) => 400,

            // 404 Not Found
            Error::NotFound { .. } | Error::OperationDisabled { .. } => 404,

            // 409 Conflict
            Error::Constraint { .. } => 409,

            // 503 Service Unavailable
            Error::Connection { .. } => 503,

            // 504 Gateway Timeout
            Error::Timeout { .. } => 504,

            // 500 Internal Server Error
            _ => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::DescriptorParse { .. } => "DESCRIPTOR_PARSE_ERROR",
            Error::DescriptorValidation { .. } => "DESCRIPTOR_VALIDATION_ERROR",
            Error::DuplicateTable { .. } => "DUPLICATE_TABLE",
            Error::InvalidFieldType { .. } => "INVALID_FIELD_TYPE",
            Error::UnknownField { .. } => "UNKNOWN_FIELD",
            Error::OperationDisabled { .. } => "OPERATION_DISABLED",
            Error::InvalidKey { .. } => "INVALID_KEY",
            Error::BadRequest { .. } => "BAD_REQUEST",
            Error::Validation { .. } => "VALIDATION_FAILED",
            Error::Hook { .. } => "HOOK_REJECTED",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::RowShape { .. } => "ROW_SHAPE_ERROR",
            Error::Connection { .. } => "DATABASE_CONNECTION_ERROR",
            Error::Timeout { .. } => "DATABASE_TIMEOUT",
            Error::Constraint { .. } => "CONSTRAINT_VIOLATION",
            Error::Database { .. } => "DATABASE_ERROR",
            Error::Export { .. } => "EXPORT_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }

    /// 재시도로 해결될 수 있는 에러인지
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connection { .. } | Error::Timeout { .. })
    }

    /// 레코드 없음 에러인지
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::validation("email", "cannot be blank").status_code(), 400);
        assert_eq!(Error::NotFound { table: "users".into() }.status_code(), 404);
        assert_eq!(Error::Constraint { message: "dup".into() }.status_code(), 409);
        assert_eq!(Error::Timeout { message: "slow".into() }.status_code(), 504);
        assert_eq!(Error::Database { message: "boom".into() }.status_code(), 500);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Connection { message: "refused".into() }.is_retryable());
        assert!(Error::Timeout { message: "slow".into() }.is_retryable());
        assert!(!Error::Constraint { message: "dup".into() }.is_retryable());
        assert!(!Error::NotFound { table: "users".into() }.is_retryable());
    }

    #[test]
    fn test_validation_helper() {
        let err = Error::validation("name", "cannot be blank");
        match err {
            Error::Validation { errors } => {
                assert_eq!(errors.get("name").map(String::as_str), Some("cannot be blank"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
