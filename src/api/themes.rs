use super::{applied, ApiError, ApiResult};
use crate::error::AppError;
use crate::form::ThemeForm;
use crate::middleware::{ClientCtx, TokenCheck};
use crate::permission;
use crate::service::themes::{self as theme_service, ThemeFilter};
use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::{DatabaseConnection, Order};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_themes)
        .service(create_theme)
        .service(get_theme)
        .service(update_theme)
        .service(delete_theme);
}

#[derive(Debug, Default, Deserialize)]
pub struct ThemeQuery {
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner: Option<i32>,
    #[serde(rename = "order[websitesCount]")]
    pub order_websites_count: Option<String>,
    pub page: Option<u64>,
}

pub(crate) fn parse_order(value: &str) -> Result<Order, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "asc" => Ok(Order::Asc),
        "desc" => Ok(Order::Desc),
        _ => Err(AppError::field(
            "order[websitesCount]",
            "The value must be asc or desc.",
        )),
    }
}

impl ThemeQuery {
    fn filter(&self) -> Result<ThemeFilter, AppError> {
        Ok(ThemeFilter {
            title: self.title.clone(),
            description: self.description.clone(),
            owner: self.owner,
            websites_count: self
                .order_websites_count
                .as_deref()
                .map(parse_order)
                .transpose()?,
        })
    }
}

#[get("/api/themes")]
pub async fn list_themes(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<ThemeQuery>,
) -> ApiResult {
    let filter = query.filter()?;
    let page = theme_service::list(
        db.get_ref(),
        client.principal(),
        &filter,
        query.page.unwrap_or(1),
    )
    .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/api/themes")]
pub async fn create_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<ThemeForm>,
) -> ApiResult {
    let theme = applied(
        theme_service::create(
            db.get_ref(),
            client.principal(),
            body.into_inner(),
            TokenCheck::Valid,
        )
        .await?,
    )?;
    let mut views = theme_service::project(db.get_ref(), client.principal(), vec![theme]).await?;
    Ok(HttpResponse::Created().json(views.pop()))
}

#[get("/api/themes/{id}")]
pub async fn get_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> ApiResult {
    let theme = theme_service::get(db.get_ref(), path.into_inner()).await?;
    // Private themes do not exist for other users.
    if !permission::can_view_theme(client.principal(), &theme) {
        return Err(ApiError(AppError::NotFound("Theme")));
    }

    let mut views = theme_service::project(db.get_ref(), client.principal(), vec![theme]).await?;
    Ok(HttpResponse::Ok().json(views.pop()))
}

#[put("/api/themes/{id}")]
pub async fn update_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<ThemeForm>,
) -> ApiResult {
    let theme = applied(
        theme_service::update(
            db.get_ref(),
            client.principal(),
            path.into_inner(),
            body.into_inner(),
            TokenCheck::Valid,
        )
        .await?,
    )?;
    let mut views = theme_service::project(db.get_ref(), client.principal(), vec![theme]).await?;
    Ok(HttpResponse::Ok().json(views.pop()))
}

#[delete("/api/themes/{id}")]
pub async fn delete_theme(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> ApiResult {
    applied(
        theme_service::delete(
            db.get_ref(),
            client.principal(),
            path.into_inner(),
            TokenCheck::Valid,
        )
        .await?,
    )?;
    Ok(HttpResponse::NoContent().finish())
}
