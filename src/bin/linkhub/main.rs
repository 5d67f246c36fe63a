use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use linkhub::middleware::ClientCtx;
use rand::{distributions::Alphanumeric, Rng};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    linkhub::app_config::init();

    let db_config = linkhub::app_config::database();
    let db = linkhub::db::connect(&db_config.effective_url(), db_config.max_connections)
        .await
        .context("Failed to connect to the database")?;

    if db_config.create_schema {
        linkhub::db::create_schema(&db)
            .await
            .context("Failed to create the database schema")?;
    }

    let security = linkhub::app_config::security();
    let secret_key = if security.secret_key.len() >= 64 {
        Key::from(security.secret_key.as_bytes())
    } else {
        let random_string: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(128)
            .map(char::from)
            .collect();
        log::warn!("security.secret_key is missing or shorter than 64 bytes.\r\nThis means the key used for signing session cookies will invalidate every time the application is restarted.\r\n\r\nNeed a key? How about:\r\n{}", random_string);
        Key::from(random_string.as_bytes())
    };

    let bind = linkhub::app_config::site().bind;
    log::info!("Listening on {}", bind);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(db.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(security.secure_cookies)
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(linkhub::api::configure)
            .configure(linkhub::web::configure)
    })
    .bind(&bind)?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    if let Err(e) = dotenv::dotenv() {
        // A missing .env is normal outside development.
        eprintln!("No .env loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();
}
