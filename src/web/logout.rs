use super::see_other;
use crate::middleware::ClientCtx;
use crate::session;
use actix_web::{get, Responder};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_logout);
}

#[get("/logout")]
pub async fn view_logout(client: ClientCtx, cookies: actix_session::Session) -> impl Responder {
    match client.get_id() {
        Some(id) => log::debug!("view_logout: user {} logged out", id),
        None => log::debug!("view_logout: no user in session (already logged out?)"),
    }

    session::logout(&cookies);
    see_other("/")
}
