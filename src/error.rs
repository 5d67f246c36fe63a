//! Request-scoped error taxonomy.
//!
//! None of these are fatal to the process. Form routes map them through
//! `ResponseError`; the JSON API wraps them in `api::ApiError`.

use crate::form::FormErrors;
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;

#[derive(Debug)]
pub enum AppError {
    /// Submitted data violates a field constraint, including uniqueness.
    Validation(FormErrors),
    /// An owner-gated action was attempted without a principal.
    LoginRequired,
    /// The principal is known but not allowed to act on the resource.
    Forbidden(String),
    NotFound(&'static str),
    Database(DbErr),
    Internal(String),
}

impl AppError {
    /// Shortcut for a single field violation.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FormErrors::default();
        errors.add(field, message);
        AppError::Validation(errors)
    }

    /// Turns a unique-index rejection on one of `fields` into the matching
    /// field error. Anything else stays a database error.
    pub fn unique_conflict(err: DbErr, fields: &[(&str, &str)]) -> Self {
        if is_unique_violation(&err) {
            let text = err.to_string();
            if let Some((field, message)) = fields.iter().find(|(field, _)| text.contains(field)) {
                log::info!("unique index rejected {}: {}", field, text);
                return AppError::field(field, *message);
            }
        }
        AppError::Database(err)
    }
}

/// SQLite reports `UNIQUE constraint failed: table.column`, PostgreSQL
/// `duplicate key value violates unique constraint "table_column_key"`.
pub fn is_unique_violation(err: &DbErr) -> bool {
    err.to_string().to_lowercase().contains("unique constraint")
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            AppError::LoginRequired => write!(f, "Login required"),
            AppError::Forbidden(msg) => write!(f, "{}", msg),
            AppError::NotFound(what) => write!(f, "{} not found", what),
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<DbErr> for AppError {
    fn from(e: DbErr) -> Self {
        AppError::Database(e)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LoginRequired => StatusCode::FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // Form routes send anonymous users to authenticate.
            AppError::LoginRequired => HttpResponse::Found()
                .append_header((header::LOCATION, "/login"))
                .finish(),
            AppError::Validation(errors) => HttpResponse::UnprocessableEntity()
                .json(serde_json::json!({ "violations": errors })),
            AppError::Database(e) => {
                log::error!("Database error: {}", e);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }
            _ => HttpResponse::build(self.status_code())
                .json(serde_json::json!({ "error": self.to_string() })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_conflict_maps_to_field() {
        let sqlite = DbErr::Exec("UNIQUE constraint failed: users.email".to_owned());
        match AppError::unique_conflict(sqlite, &[("username", "taken"), ("email", "registered")]) {
            AppError::Validation(errors) => {
                assert_eq!(errors.get("email"), ["registered"]);
                assert!(errors.get("username").is_empty());
            }
            other => panic!("expected a validation error, got {:?}", other),
        }

        let postgres = DbErr::Query(
            "error returned from database: duplicate key value violates unique constraint \"themes_title_key\"".to_owned(),
        );
        assert!(matches!(
            AppError::unique_conflict(postgres, &[("title", "taken")]),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_other_errors_stay_database_errors() {
        let slug = DbErr::Exec("UNIQUE constraint failed: themes.slug".to_owned());
        assert!(matches!(
            AppError::unique_conflict(slug, &[("title", "taken")]),
            AppError::Database(_)
        ));

        let conn = DbErr::Conn("connection refused".to_owned());
        assert!(!is_unique_violation(&conn));
    }
}
