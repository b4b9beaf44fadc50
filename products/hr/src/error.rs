use platform_api::ApiError;
use platform_authz::AuthzError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::state::TransitionError;

pub type HrResult<T> = Result<T, HrError>;

#[derive(Debug, Error)]
pub enum HrError {
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{message}")]
    Conflict {
        message: String,
        field: Option<&'static str>,
    },
    #[error("{message}")]
    Invalid {
        message: String,
        field: Option<&'static str>,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("database error: {0}")]
    Db(DbErr),
}

impl HrError {
    pub fn conflict(message: impl Into<String>, field: Option<&'static str>) -> Self {
        Self::Conflict {
            message: message.into(),
            field,
        }
    }

    pub fn invalid(message: impl Into<String>, field: &'static str) -> Self {
        Self::Invalid {
            message: message.into(),
            field: Some(field),
        }
    }
}

impl From<DbErr> for HrError {
    fn from(err: DbErr) -> Self {
        // Unique indexes are the last line of defence against racing writers.
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => HrError::Conflict {
                field: unique_violation_field(&detail),
                message: "record conflicts with an existing entry".into(),
            },
            _ => HrError::Db(err),
        }
    }
}

impl From<AuthzError> for HrError {
    fn from(err: AuthzError) -> Self {
        HrError::Forbidden(err.to_string())
    }
}

/// Best-effort mapping from a driver's unique-violation text to the payload
/// field the client should highlight.
fn unique_violation_field(detail: &str) -> Option<&'static str> {
    let detail = detail.to_ascii_lowercase();
    if detail.contains("employee_code") {
        Some("employeeId")
    } else if detail.contains("work_email") {
        Some("workEmail")
    } else if detail.contains("account_id") {
        Some("accountId")
    } else if detail.contains("email") {
        Some("email")
    } else {
        None
    }
}

impl From<HrError> for ApiError {
    fn from(err: HrError) -> Self {
        match err {
            HrError::Forbidden(message) => ApiError::forbidden(message),
            HrError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            HrError::Conflict { message, field } => ApiError::conflict(message, field),
            HrError::Invalid { message, field } => ApiError::invalid(message, field),
            HrError::Transition(err) => ApiError::conflict(err.to_string(), None),
            HrError::Db(err) => ApiError::internal(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_names_the_field() {
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: employees.employee_code"),
            Some("employeeId")
        );
        assert_eq!(
            unique_violation_field(
                "duplicate key value violates unique constraint \"employees_work_email_key\""
            ),
            Some("workEmail")
        );
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: employees.email"),
            Some("email")
        );
        assert_eq!(unique_violation_field("something else"), None);
    }

    #[test]
    fn api_mapping_keeps_the_taxonomy() {
        let api: ApiError = HrError::NotFound("notification").into();
        assert_eq!(api.code(), "NOT_FOUND");
        assert_eq!(api.to_string(), "notification not found");

        let api: ApiError = HrError::conflict("taken", Some("employeeId")).into();
        assert_eq!(api.code(), "CONFLICT");
        assert_eq!(api.field(), Some("employeeId"));
    }
}
