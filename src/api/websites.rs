use super::{applied, ApiError, ApiResult};
use crate::error::AppError;
use crate::form::WebsiteForm;
use crate::middleware::{ClientCtx, TokenCheck};
use crate::permission;
use crate::service::websites::{self as website_service, WebsiteFilter};
use crate::view::WebsiteView;
use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_websites)
        .service(create_website)
        .service(get_website)
        .service(update_website)
        .service(delete_website);
}

#[derive(Debug, Default, Deserialize)]
pub struct WebsiteQuery {
    pub url: Option<String>,
    pub theme: Option<i32>,
    pub owner: Option<i32>,
    pub page: Option<u64>,
}

#[get("/api/websites")]
pub async fn list_websites(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<WebsiteQuery>,
) -> ApiResult {
    let query = query.into_inner();
    let filter = WebsiteFilter {
        url: query.url,
        theme: query.theme,
        owner: query.owner,
    };
    let page = website_service::list(
        db.get_ref(),
        client.principal(),
        &filter,
        query.page.unwrap_or(1),
    )
    .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// The target theme comes from the body, so the create rule runs after decoding.
#[post("/api/websites")]
pub async fn create_website(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<WebsiteForm>,
) -> ApiResult {
    let form = body.into_inner();
    let theme_id = form
        .theme
        .ok_or_else(|| AppError::field("theme", "This value should not be blank."))?;

    let website = applied(
        website_service::create(
            db.get_ref(),
            client.principal(),
            theme_id,
            form,
            TokenCheck::Valid,
        )
        .await?,
    )?;
    Ok(HttpResponse::Created().json(WebsiteView::from(&website)))
}

#[get("/api/websites/{id}")]
pub async fn get_website(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> ApiResult {
    let (website, theme) = website_service::get_with_theme(db.get_ref(), path.into_inner()).await?;
    if !permission::can_view_website(client.principal(), &website, &theme) {
        return Err(ApiError(AppError::NotFound("Website")));
    }
    Ok(HttpResponse::Ok().json(WebsiteView::from(&website)))
}

#[put("/api/websites/{id}")]
pub async fn update_website(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<WebsiteForm>,
) -> ApiResult {
    let website = applied(
        website_service::update(
            db.get_ref(),
            client.principal(),
            path.into_inner(),
            body.into_inner(),
            TokenCheck::Valid,
        )
        .await?,
    )?;
    Ok(HttpResponse::Ok().json(WebsiteView::from(&website)))
}

#[delete("/api/websites/{id}")]
pub async fn delete_website(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> ApiResult {
    applied(
        website_service::delete(
            db.get_ref(),
            client.principal(),
            path.into_inner(),
            TokenCheck::Valid,
        )
        .await?,
    )?;
    Ok(HttpResponse::NoContent().finish())
}
