pub mod account;
pub mod index;
pub mod login;
pub mod logout;
pub mod theme;
pub mod website;

use crate::error::AppError;
use crate::form::{render, FormErrors, FormType};
use crate::service::Mutation;
use actix_web::http::header;
use actix_web::HttpResponse;
use serde::Deserialize;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    index::configure(conf);
    account::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    // `/themes/new` must resolve before `/themes/{slug}`.
    theme::configure(conf);
    website::configure(conf);
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

/// Only the anti-forgery token, for POST routes without other fields.
#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// 303 to `location`, the answer to every successful form submission.
pub fn see_other(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub fn show_form<F: FormType>(form: &F, action: impl Into<String>, token: String) -> HttpResponse {
    HttpResponse::Ok().json(render(form, action, token, &FormErrors::default()))
}

/// Redirects after a mutation, or re-renders the submitted form with its
/// field errors. A skipped mutation redirects like an applied one.
pub fn respond<T, F: FormType>(
    result: Result<Mutation<T>, AppError>,
    form: &F,
    action: impl Into<String>,
    token: String,
    location: impl FnOnce(Option<&T>) -> String,
) -> Result<HttpResponse, AppError> {
    match result {
        Ok(Mutation::Applied(value)) => Ok(see_other(location(Some(&value)))),
        Ok(Mutation::Skipped) => Ok(see_other(location(None))),
        Err(AppError::Validation(errors)) => {
            Ok(HttpResponse::UnprocessableEntity().json(render(form, action, token, &errors)))
        }
        Err(e) => Err(e),
    }
}
