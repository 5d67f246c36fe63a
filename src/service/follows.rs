//! Users following themes. Following is idempotent in both directions.

use super::{now, skipped, themes as theme_service, Mutation};
use crate::error::{is_unique_violation, AppError};
use crate::middleware::{Intent, TokenCheck};
use crate::orm::{follows, themes};
use crate::permission::{self, Action};
use crate::principal::Principal;
use crate::view::ThemeView;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr};

pub async fn is_following<C>(db: &C, user_id: i32, theme_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    Ok(follows::Entity::find()
        .filter(follows::Column::FollowedById.eq(user_id))
        .filter(follows::Column::TargetId.eq(theme_id))
        .one(db)
        .await?
        .is_some())
}

pub async fn follow(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    theme_id: i32,
    token: TokenCheck,
) -> Result<Mutation<themes::Model>, AppError> {
    let principal = principal.ok_or(AppError::LoginRequired)?;
    let theme = theme_service::get(db, theme_id).await?;
    permission::check_theme(Some(principal), Action::View, &theme)?;
    if !token.is_valid() {
        return skipped(Intent::Follow, theme_id);
    }

    if !is_following(db, principal.id, theme_id).await? {
        let inserted = follows::ActiveModel {
            followed_by_id: Set(principal.id),
            target_id: Set(theme_id),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(db)
        .await;
        match inserted {
            Ok(_) => log::debug!("user {} follows theme {}", principal.id, theme_id),
            // A concurrent submit stored the same follow first.
            Err(e) if is_unique_violation(&e) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Mutation::Applied(theme))
}

pub async fn unfollow(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    theme_id: i32,
    token: TokenCheck,
) -> Result<Mutation<themes::Model>, AppError> {
    let principal = principal.ok_or(AppError::LoginRequired)?;
    let theme = theme_service::get(db, theme_id).await?;
    if !token.is_valid() {
        return skipped(Intent::Unfollow, theme_id);
    }

    follows::Entity::delete_many()
        .filter(follows::Column::FollowedById.eq(principal.id))
        .filter(follows::Column::TargetId.eq(theme_id))
        .exec(db)
        .await?;

    Ok(Mutation::Applied(theme))
}

/// Themes the principal follows and can still see, most recently followed first.
pub async fn following(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
) -> Result<Vec<ThemeView>, AppError> {
    let principal = principal.ok_or(AppError::LoginRequired)?;

    let theme_ids: Vec<i32> = follows::Entity::find()
        .filter(follows::Column::FollowedById.eq(principal.id))
        .order_by_desc(follows::Column::CreatedAt)
        .order_by_desc(follows::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|f| f.target_id)
        .collect();

    if theme_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut found = themes::Entity::find()
        .filter(themes::Column::Id.is_in(theme_ids.clone()))
        .filter(theme_service::visible_condition(Some(principal)))
        .all(db)
        .await?;
    found.sort_by_key(|t| theme_ids.iter().position(|id| *id == t.id));

    Ok(theme_service::project(db, Some(principal), found).await?)
}
