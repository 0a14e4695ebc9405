use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use rust_decimal::Decimal;
use serde_json::json;

/// Stable classification surfaced to callers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
pub enum ErrorKind {
    Validation,
    BusinessRule,
    NotFound,
    Unexpected,
}

#[derive(Debug, Display)]
pub enum LeaveError {
    /// Missing or malformed input.
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "an existing leave request already covers the selected dates")]
    Overlap,

    #[display(
        fmt = "insufficient leave balance: requested {} hours, remaining {} hours",
        requested,
        remaining
    )]
    InsufficientBalance { requested: Decimal, remaining: Decimal },

    /// Raised by the ledger when a debit would exceed the entitlement.
    #[display(
        fmt = "leave balance exceeded: debit of {} hours leaves only {} hours available",
        requested,
        available
    )]
    BalanceExceeded { requested: Decimal, available: Decimal },

    #[display(fmt = "it is not your turn to decide this request; expected role {}", expected)]
    NotYourTurn { expected: String },

    #[display(fmt = "approvers cannot decide their own leave requests")]
    SelfApproval,

    #[display(fmt = "{}", _0)]
    NotPermitted(String),

    #[display(fmt = "leave request {} is already {}", id, status)]
    AlreadyDecided { id: u64, status: String },

    /// Any other business rule.
    #[display(fmt = "{}", _0)]
    Rule(String),

    #[display(fmt = "{} not found", _0)]
    NotFound(String),

    /// Detail is logged where the error is created and never shown to callers.
    #[display(fmt = "internal error")]
    Internal(String),
}

impl std::error::Error for LeaveError {}

impl LeaveError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LeaveError::Validation(msg.into())
    }

    pub fn rule(msg: impl Into<String>) -> Self {
        LeaveError::Rule(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        LeaveError::NotFound(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LeaveError::Validation(_) => ErrorKind::Validation,
            LeaveError::NotFound(_) => ErrorKind::NotFound,
            LeaveError::Internal(_) => ErrorKind::Unexpected,
            _ => ErrorKind::BusinessRule,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LeaveError::Validation(_) => "validation_error",
            LeaveError::Overlap => "leave_overlap",
            LeaveError::InsufficientBalance { .. } => "insufficient_balance",
            LeaveError::BalanceExceeded { .. } => "balance_exceeded",
            LeaveError::NotYourTurn { .. } => "not_your_turn",
            LeaveError::SelfApproval => "self_approval",
            LeaveError::NotPermitted(_) => "not_permitted",
            LeaveError::AlreadyDecided { .. } => "already_decided",
            LeaveError::Rule(_) => "business_rule",
            LeaveError::NotFound(_) => "not_found",
            LeaveError::Internal(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for LeaveError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "Database operation failed");
        LeaveError::Internal(err.to_string())
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::NotYourTurn { .. }
            | LeaveError::SelfApproval
            | LeaveError::NotPermitted(_) => StatusCode::FORBIDDEN,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }))
    }
}

pub type LeaveResult<T> = Result<T, LeaveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn classifies_errors() {
        assert_eq!(LeaveError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(LeaveError::Overlap.kind(), ErrorKind::BusinessRule);
        assert_eq!(LeaveError::SelfApproval.kind(), ErrorKind::BusinessRule);
        assert_eq!(LeaveError::not_found("leave request 1").kind(), ErrorKind::NotFound);
        assert_eq!(LeaveError::Internal("db down".into()).kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn maps_status_codes() {
        assert_eq!(LeaveError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(LeaveError::Overlap.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            LeaveError::NotYourTurn { expected: "HR".into() }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(LeaveError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            LeaveError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn hides_internal_detail() {
        let err = LeaveError::Internal("connection refused at 10.0.0.3".into());
        assert_eq!(err.to_string(), "internal error");
    }

    #[test]
    fn formats_balance_messages() {
        let err = LeaveError::InsufficientBalance {
            requested: dec!(16),
            remaining: dec!(8),
        };
        assert_eq!(
            err.to_string(),
            "insufficient leave balance: requested 16 hours, remaining 8 hours"
        );
    }
}
