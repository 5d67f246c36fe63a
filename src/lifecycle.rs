//! Steps that run around persistence: before create, before flush and after
//! load. Services call them explicitly at fixed points inside their
//! transaction.

use crate::constants::RESERVED_SLUGS;
use crate::error::AppError;
use crate::orm::{follows, themes, websites};
use crate::permission::UserOwned;
use crate::principal::Principal;
use crate::slug::{disambiguate, slugify};
use sea_orm::{entity::*, query::*, sea_query::Expr, ConnectionTrait, DbErr};
use std::collections::HashSet;

/// Stamps the principal as owner of a new resource. An owner that is already
/// set is never replaced.
pub fn assign_owner<T: UserOwned>(
    resource: &mut T,
    principal: Option<&Principal>,
) -> Result<(), AppError> {
    if resource.owner_id().is_some() {
        return Ok(());
    }

    match principal {
        Some(p) => {
            resource.set_owner_id(p.id);
            Ok(())
        }
        None => {
            log::error!("assign_owner called without a principal; creation must be gated first");
            Err(AppError::LoginRequired)
        }
    }
}

/// Derives a slug for `title` that no other theme uses. `exclude_id` is the
/// theme being renamed, whose current slug does not count as taken.
pub async fn assign_slug<C>(db: &C, title: &str, exclude_id: Option<i32>) -> Result<String, DbErr>
where
    C: ConnectionTrait,
{
    let base = slugify(title);

    let mut query = themes::Entity::find().filter(themes::Column::Slug.starts_with(&base));
    if let Some(id) = exclude_id {
        query = query.filter(themes::Column::Id.ne(id));
    }

    let mut taken: HashSet<String> = query
        .all(db)
        .await?
        .into_iter()
        .map(|theme| theme.slug)
        .collect();
    taken.extend(RESERVED_SLUGS.iter().map(|s| s.to_string()));

    Ok(disambiguate(&base, &taken))
}

/// Rewrites `themes.websites_count` from the live number of websites.
pub async fn refresh_websites_count<C>(db: &C, theme_id: i32) -> Result<i32, DbErr>
where
    C: ConnectionTrait,
{
    let count = websites::Entity::find()
        .filter(websites::Column::ThemeId.eq(theme_id))
        .count(db)
        .await? as i32;

    themes::Entity::update_many()
        .col_expr(themes::Column::WebsitesCount, Expr::value(count))
        .filter(themes::Column::Id.eq(theme_id))
        .exec(db)
        .await?;

    log::debug!("theme {} websites_count = {}", theme_id, count);
    Ok(count)
}

/// Ids among `theme_ids` that the principal follows. Guests follow nothing.
pub async fn followed_theme_ids<C>(
    db: &C,
    principal: Option<&Principal>,
    theme_ids: &[i32],
) -> Result<HashSet<i32>, DbErr>
where
    C: ConnectionTrait,
{
    let principal = match principal {
        Some(p) if !theme_ids.is_empty() => p,
        _ => return Ok(HashSet::new()),
    };

    Ok(follows::Entity::find()
        .filter(follows::Column::FollowedById.eq(principal.id))
        .filter(follows::Column::TargetId.is_in(theme_ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|follow| follow.target_id)
        .collect())
}
