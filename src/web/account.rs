use super::{respond, see_other, show_form, TokenForm};
use crate::error::AppError;
use crate::form::{EditPasswordForm, UserSettingsForm};
use crate::middleware::{ClientCtx, Intent};
use crate::service::{accounts, follows, Mutation};
use crate::session;
use actix_session::Session;
use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(settings_form)
        .service(update_settings)
        .service(edit_password_form)
        .service(update_password)
        .service(delete_account)
        .service(view_following);
}

#[get("/account/settings")]
pub async fn settings_form(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let principal = client.require_login()?;
    let user = accounts::get(db.get_ref(), principal.id).await?;

    Ok(show_form(
        &UserSettingsForm::from_model(&user),
        "/account/settings",
        client.intent_token(Intent::Settings, principal.id),
    ))
}

#[post("/account/settings")]
pub async fn update_settings(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Form<UserSettingsForm>,
) -> Result<HttpResponse, AppError> {
    let principal = client.require_login()?;
    let form = form.into_inner();
    let check = client.check_intent(Intent::Settings, principal.id, &form.csrf_token);
    let result = accounts::update_settings(db.get_ref(), Some(principal), form.clone(), check).await;

    respond(
        result,
        &form,
        "/account/settings",
        client.intent_token(Intent::Settings, principal.id),
        |_| "/account/settings".to_owned(),
    )
}

#[get("/account/edit-password")]
pub async fn edit_password_form(client: ClientCtx) -> Result<HttpResponse, AppError> {
    let principal = client.require_login()?;
    Ok(show_form(
        &EditPasswordForm::default(),
        "/account/edit-password",
        client.intent_token(Intent::Password, principal.id),
    ))
}

/// A changed password ends the session; the user signs in again.
#[post("/account/edit-password")]
pub async fn update_password(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    session: Session,
    form: web::Form<EditPasswordForm>,
) -> Result<HttpResponse, AppError> {
    let principal = client.require_login()?;
    let form = form.into_inner();
    let check = client.check_intent(Intent::Password, principal.id, &form.csrf_token);
    let result = accounts::change_password(db.get_ref(), Some(principal), form.clone(), check).await;

    if let Ok(Mutation::Applied(())) = &result {
        session::logout(&session);
    }

    respond(
        result,
        &form,
        "/account/edit-password",
        client.intent_token(Intent::Password, principal.id),
        |_| "/login".to_owned(),
    )
}

#[post("/account/delete/{id}")]
pub async fn delete_account(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<TokenForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let check = client.check_intent(Intent::DeleteAccount, id, &form.csrf_token);

    if accounts::delete_account(db.get_ref(), client.principal(), id, check)
        .await?
        .is_applied()
    {
        session::logout(&session);
    }
    Ok(see_other("/"))
}

#[get("/account/following")]
pub async fn view_following(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let themes = follows::following(db.get_ref(), client.principal()).await?;
    Ok(HttpResponse::Ok().json(themes))
}
