use super::{respond, see_other, show_form, TokenForm};
use crate::error::AppError;
use crate::form::WebsiteForm;
use crate::middleware::{ClientCtx, Intent};
use crate::permission::{self, Action};
use crate::service::{themes as theme_service, websites as website_service};
use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(new_website_form)
        .service(create_website)
        .service(edit_website_form)
        .service(update_website)
        .service(delete_website)
        .service(moderate_website);
}

#[derive(Debug, Deserialize)]
pub struct ModerateForm {
    /// `approve` or `reject`.
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[get("/themes/{slug}/websites/new")]
pub async fn new_website_form(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let theme = theme_service::get_by_slug(db.get_ref(), &path).await?;
    permission::can_create_website(client.principal(), &theme)?;

    Ok(show_form(
        &WebsiteForm::default(),
        format!("/themes/{}/websites/new", theme.slug),
        client.intent_token(Intent::NewWebsite, theme.id),
    ))
}

#[post("/themes/{slug}/websites/new")]
pub async fn create_website(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    form: web::Form<WebsiteForm>,
) -> Result<HttpResponse, AppError> {
    let theme = theme_service::get_by_slug(db.get_ref(), &path).await?;
    let form = form.into_inner();
    let check = client.check_intent(Intent::NewWebsite, theme.id, &form.csrf_token);
    let result =
        website_service::create(db.get_ref(), client.principal(), theme.id, form.clone(), check)
            .await;

    respond(
        result,
        &form,
        format!("/themes/{}/websites/new", theme.slug),
        client.intent_token(Intent::NewWebsite, theme.id),
        |_| format!("/themes/{}", theme.slug),
    )
}

#[get("/websites/{id}/edit")]
pub async fn edit_website_form(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let (website, theme) = website_service::get_with_theme(db.get_ref(), id).await?;
    permission::check_website(client.principal(), Action::Edit, &website, &theme)?;

    Ok(show_form(
        &WebsiteForm::from_model(&website),
        format!("/websites/{}/edit", id),
        client.intent_token(Intent::EditWebsite, id),
    ))
}

#[post("/websites/{id}/edit")]
pub async fn update_website(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<WebsiteForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let (_, theme) = website_service::get_with_theme(db.get_ref(), id).await?;
    // Moving between themes is only offered by the API.
    let form = WebsiteForm {
        theme: None,
        ..form.into_inner()
    };
    let check = client.check_intent(Intent::EditWebsite, id, &form.csrf_token);
    let result =
        website_service::update(db.get_ref(), client.principal(), id, form.clone(), check).await;

    respond(
        result,
        &form,
        format!("/websites/{}/edit", id),
        client.intent_token(Intent::EditWebsite, id),
        |_| format!("/themes/{}", theme.slug),
    )
}

#[post("/websites/{id}/delete")]
pub async fn delete_website(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<TokenForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let (_, theme) = website_service::get_with_theme(db.get_ref(), id).await?;
    let check = client.check_intent(Intent::DeleteWebsite, id, &form.csrf_token);
    website_service::delete(db.get_ref(), client.principal(), id, check).await?;
    Ok(see_other(format!("/themes/{}", theme.slug)))
}

#[post("/websites/{id}/moderate")]
pub async fn moderate_website(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<ModerateForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let approve = match form.decision.as_str() {
        "approve" => true,
        "reject" => false,
        _ => return Err(AppError::field("decision", "Choose approve or reject.")),
    };

    let (_, theme) = website_service::get_with_theme(db.get_ref(), id).await?;
    let check = client.check_intent(Intent::Moderate, id, &form.csrf_token);
    website_service::moderate(db.get_ref(), client.principal(), id, approve, check).await?;
    Ok(see_other(format!("/themes/{}", theme.slug)))
}
