use super::{respond, see_other, show_form, PageQuery, TokenForm};
use crate::error::AppError;
use crate::form::ThemeForm;
use crate::middleware::{ClientCtx, Intent};
use crate::permission::{self, Action};
use crate::service::{follows, tags, themes as theme_service, Page};
use crate::view::{Approval, ThemeView, WebsiteView};
use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_themes)
        .service(new_theme_form)
        .service(create_theme)
        .service(edit_theme_form)
        .service(update_theme)
        .service(delete_theme)
        .service(follow_theme)
        .service(unfollow_theme)
        .service(redirect_new_website)
        .service(view_theme);
}

#[derive(Serialize)]
pub struct ThemeIndex {
    pub themes: Page<ThemeView>,
    /// Link to the creation form, for users.
    pub new_theme: Option<&'static str>,
}

/// What the viewer may do with a theme. Tokens are only handed out for
/// permitted actions.
#[derive(Default, Serialize)]
pub struct ThemeActions {
    pub edit: Option<String>,
    pub delete_token: Option<String>,
    pub add_website: Option<String>,
    pub follow_token: Option<String>,
    pub unfollow_token: Option<String>,
}

#[derive(Serialize)]
pub struct WebsiteItem {
    #[serde(flatten)]
    pub website: WebsiteView,
    pub edit: Option<String>,
    pub delete_token: Option<String>,
    pub moderate_token: Option<String>,
}

#[derive(Serialize)]
pub struct ThemePage {
    pub theme: ThemeView,
    pub websites: Vec<WebsiteItem>,
    pub actions: ThemeActions,
}

#[get("/themes")]
pub async fn view_themes(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let themes = theme_service::list(
        db.get_ref(),
        client.principal(),
        &Default::default(),
        query.page.unwrap_or(1),
    )
    .await?;

    Ok(HttpResponse::Ok().json(ThemeIndex {
        themes,
        new_theme: client.is_user().then(|| "/themes/new"),
    }))
}

#[get("/themes/new")]
pub async fn new_theme_form(client: ClientCtx) -> Result<HttpResponse, AppError> {
    permission::can_create_theme(client.principal())?;
    Ok(show_form(
        &ThemeForm::default(),
        "/themes/new",
        client.intent_token(Intent::NewTheme, 0),
    ))
}

#[post("/themes/new")]
pub async fn create_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Form<ThemeForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let check = client.check_intent(Intent::NewTheme, 0, &form.csrf_token);
    let result = theme_service::create(db.get_ref(), client.principal(), form.clone(), check).await;

    respond(
        result,
        &form,
        "/themes/new",
        client.intent_token(Intent::NewTheme, 0),
        |theme| match theme {
            Some(theme) => format!("/themes/{}", theme.slug),
            None => "/themes".to_owned(),
        },
    )
}

#[get("/themes/{id}/edit")]
pub async fn edit_theme_form(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let theme = theme_service::get(db.get_ref(), id).await?;
    permission::check_theme(client.principal(), Action::Edit, &theme)?;
    let tags = tags::tags_for_theme(db.get_ref(), id).await?;

    Ok(show_form(
        &ThemeForm::from_model(&theme, &tags),
        format!("/themes/{}/edit", id),
        client.intent_token(Intent::EditTheme, id),
    ))
}

#[post("/themes/{id}/edit")]
pub async fn update_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<ThemeForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let current = theme_service::get(db.get_ref(), id).await?;
    let form = form.into_inner();
    let check = client.check_intent(Intent::EditTheme, id, &form.csrf_token);
    let result =
        theme_service::update(db.get_ref(), client.principal(), id, form.clone(), check).await;

    respond(
        result,
        &form,
        format!("/themes/{}/edit", id),
        client.intent_token(Intent::EditTheme, id),
        |theme| format!("/themes/{}", theme.unwrap_or(&current).slug),
    )
}

#[post("/themes/{id}/delete")]
pub async fn delete_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<TokenForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let check = client.check_intent(Intent::DeleteTheme, id, &form.csrf_token);
    theme_service::delete(db.get_ref(), client.principal(), id, check).await?;
    Ok(see_other("/themes"))
}

#[post("/themes/{id}/follow")]
pub async fn follow_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<TokenForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let theme = theme_service::get(db.get_ref(), id).await?;
    let check = client.check_intent(Intent::Follow, id, &form.csrf_token);
    follows::follow(db.get_ref(), client.principal(), id, check).await?;
    Ok(see_other(format!("/themes/{}", theme.slug)))
}

#[post("/themes/{id}/unfollow")]
pub async fn unfollow_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<TokenForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let theme = theme_service::get(db.get_ref(), id).await?;
    let check = client.check_intent(Intent::Unfollow, id, &form.csrf_token);
    follows::unfollow(db.get_ref(), client.principal(), id, check).await?;
    Ok(see_other(format!("/themes/{}", theme.slug)))
}

#[get("/themes/{slug}/new")]
pub async fn redirect_new_website(path: web::Path<String>) -> HttpResponse {
    see_other(format!("/themes/{}/websites/new", path.into_inner()))
}

#[get("/themes/{slug}")]
pub async fn view_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let detail = theme_service::show(db.get_ref(), client.principal(), &path).await?;
    let principal = client.principal();
    let theme = &detail.model;
    let is_theme_owner = permission::is_owner(principal, theme);

    let mut actions = ThemeActions::default();
    if permission::check_theme(principal, Action::Edit, theme).is_ok() {
        actions.edit = Some(format!("/themes/{}/edit", theme.id));
    }
    if permission::check_theme(principal, Action::Delete, theme).is_ok() {
        actions.delete_token = Some(client.intent_token(Intent::DeleteTheme, theme.id));
    }
    if permission::can_create_website(principal, theme).is_ok() {
        actions.add_website = Some(format!("/themes/{}/websites/new", theme.slug));
    }
    if client.is_user() {
        if detail.theme.followed_by_current_user {
            actions.unfollow_token = Some(client.intent_token(Intent::Unfollow, theme.id));
        } else {
            actions.follow_token = Some(client.intent_token(Intent::Follow, theme.id));
        }
    }

    let websites = detail
        .websites
        .into_iter()
        .map(|website| {
            let own = client.get_id() == Some(website.owner_id);
            let pending = website.approval == Approval::Pending;
            WebsiteItem {
                edit: own.then(|| format!("/websites/{}/edit", website.id)),
                delete_token: own.then(|| client.intent_token(Intent::DeleteWebsite, website.id)),
                moderate_token: (is_theme_owner && pending)
                    .then(|| client.intent_token(Intent::Moderate, website.id)),
                website,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(ThemePage {
        theme: detail.theme,
        websites,
        actions,
    }))
}
