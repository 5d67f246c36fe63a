use super::see_other;
use crate::app_config;
use crate::middleware::ClientCtx;
use actix_web::{get, HttpResponse, Responder};
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[get("/")]
pub async fn view_index(client: ClientCtx) -> impl Responder {
    if client.is_user() {
        return see_other("/themes");
    }

    let site = app_config::site();
    HttpResponse::Ok().json(json!({
        "name": site.name,
        "description": site.description,
        "links": {
            "themes": "/themes",
            "login": "/login",
            "register": "/register",
        },
    }))
}
