use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Internal => "INTERNAL",
        };
        write!(f, "{}", s)
    }
}

impl ErrorCode {
    /// Validation failures are the caller's to fix; everything else aborts the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorCode::InvalidArgument)
    }
}

pub trait ClinigraphError: std::error::Error {
    fn error_code(&self) -> ErrorCode;
}
