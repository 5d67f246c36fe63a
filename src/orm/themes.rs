//! SeaORM Entity for themes table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "themes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
    /// Only the owner may see the theme and add links to it.
    pub private: bool,
    /// Other users may contribute links.
    pub open: bool,
    /// Contributions from other users wait for the owner's approval.
    pub approve: bool,
    pub owner_id: i32,
    /// Cached `COUNT(websites)`. Rewritten by `lifecycle::refresh_websites_count`.
    pub websites_count: i32,
    pub created_at: DateTime,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owner,
    #[sea_orm(has_many = "super::websites::Entity")]
    Websites,
    #[sea_orm(has_many = "super::follows::Entity")]
    Followers,
    #[sea_orm(has_many = "super::theme_tags::Entity")]
    ThemeTags,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::websites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Websites.def()
    }
}

impl Related<super::follows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Followers.def()
    }
}

impl Related<super::theme_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ThemeTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
