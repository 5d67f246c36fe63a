use super::{respond, see_other, show_form};
use crate::error::AppError;
use crate::form::{render, FormErrors, LoginForm, RegisterForm};
use crate::middleware::{ClientCtx, Intent};
use crate::service::{accounts, Mutation};
use crate::session;
use actix_session::Session;
use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_login)
        .service(post_login)
        .service(view_register)
        .service(post_register);
}

pub const BAD_CREDENTIALS: &str = "Invalid username or password.";

#[get("/login")]
pub async fn view_login(client: ClientCtx) -> HttpResponse {
    if client.is_user() {
        return see_other("/themes");
    }
    show_form(
        &LoginForm::default(),
        "/login",
        client.intent_token(Intent::Login, 0),
    )
}

#[post("/login")]
pub async fn post_login(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    cookies: Session,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    if !client.check_intent(Intent::Login, 0, &form.csrf_token).is_valid() {
        log::warn!("Ignoring login: anti-forgery token missing or mismatched");
        return Ok(see_other("/themes"));
    }

    match session::authenticate(db.get_ref(), &form.username, &form.password).await? {
        Some(user) => {
            session::login(&cookies, user.id)?;
            log::debug!("user {} logged in", user.id);
            Ok(see_other("/themes"))
        }
        None => {
            log::debug!("login failure for {}", form.username);
            let mut errors = FormErrors::default();
            errors.add("username", BAD_CREDENTIALS);
            Ok(HttpResponse::UnprocessableEntity().json(render(
                &form.into_inner(),
                "/login",
                client.intent_token(Intent::Login, 0),
                &errors,
            )))
        }
    }
}

#[get("/register")]
pub async fn view_register(client: ClientCtx) -> HttpResponse {
    if client.is_user() {
        return see_other("/themes");
    }
    show_form(
        &RegisterForm::default(),
        "/register",
        client.intent_token(Intent::Register, 0),
    )
}

/// Creates the account and signs the new user in.
#[post("/register")]
pub async fn post_register(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    cookies: Session,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let check = client.check_intent(Intent::Register, 0, &form.csrf_token);
    let result = accounts::register(db.get_ref(), form.clone(), check).await;

    if let Ok(Mutation::Applied(user)) = &result {
        session::login(&cookies, user.id)?;
    }

    respond(
        result,
        &form,
        "/register",
        client.intent_token(Intent::Register, 0),
        |_| "/themes".to_owned(),
    )
}
