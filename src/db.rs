//! Database connection and schema setup.

use crate::orm::{follows, tags, theme_tags, themes, users, websites};
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};

/// Opens a connection pool.
pub async fn connect(url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(max_connections).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    log::info!("Connected to database ({:?})", db.get_database_backend());
    Ok(db)
}

/// Creates every table that does not exist yet, parents before children.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // One follow per (user, theme).
    let mut follows_table = schema.create_table_from_entity(follows::Entity);
    follows_table.index(
        Index::create()
            .unique()
            .col(follows::Column::FollowedById)
            .col(follows::Column::TargetId),
    );

    let statements = vec![
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(themes::Entity),
        schema.create_table_from_entity(websites::Entity),
        follows_table,
        schema.create_table_from_entity(tags::Entity),
        schema.create_table_from_entity(theme_tags::Entity),
    ];

    for mut stmt in statements {
        stmt.if_not_exists();
        db.execute(backend.build(&stmt)).await?;
    }

    Ok(())
}
