//! SeaORM entities.

pub mod follows;
pub mod tags;
pub mod theme_tags;
pub mod themes;
pub mod users;
pub mod websites;
