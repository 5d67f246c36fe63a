//! JSON resource API for themes and websites.
//!
//! Collections are paginated by `PAGE_SIZE`. Session cookies authenticate
//! the caller; there are no per-resource tokens on this surface.

pub mod themes;
pub mod websites;

use crate::error::AppError;
use crate::permission::Denial;
use crate::service::Mutation;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;

pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    themes::configure(conf);
    websites::configure(conf);
}

/// `AppError` with API semantics: a missing login is a 401, not a redirect.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError(e)
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        ApiError(denial.into())
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        ApiError(e.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::LoginRequired => StatusCode::UNAUTHORIZED,
            ref e => e.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self.0 {
            AppError::LoginRequired => HttpResponse::Unauthorized()
                .json(serde_json::json!({ "error": self.0.to_string() })),
            ref e => e.error_response(),
        }
    }
}

pub type ApiResult = Result<HttpResponse, ApiError>;

/// The API always passes a valid token, so a skipped mutation is a bug.
pub(crate) fn applied<T>(mutation: Mutation<T>) -> Result<T, ApiError> {
    mutation
        .applied()
        .ok_or_else(|| ApiError(AppError::Internal("API mutation was skipped".to_owned())))
}
