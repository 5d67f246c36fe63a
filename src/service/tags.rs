//! Ordered tags attached to themes.

use crate::orm::{tags, theme_tags};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use std::collections::HashMap;

/// Replaces the tags of a theme with `names`, in that order. Tags are created
/// on first use and shared between themes.
pub async fn sync_theme_tags<C>(db: &C, theme_id: i32, names: &[String]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    theme_tags::Entity::delete_many()
        .filter(theme_tags::Column::ThemeId.eq(theme_id))
        .exec(db)
        .await?;

    for (position, name) in names.iter().enumerate() {
        let existing = tags::Entity::find()
            .filter(tags::Column::Name.eq(name.as_str()))
            .one(db)
            .await?;

        let tag_id = match existing {
            Some(tag) => tag.id,
            None => {
                tags::ActiveModel {
                    name: Set(name.to_owned()),
                    ..Default::default()
                }
                .insert(db)
                .await?
                .id
            }
        };

        theme_tags::ActiveModel {
            theme_id: Set(theme_id),
            tag_id: Set(tag_id),
            position: Set(position as i32),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Fetches tags for multiple themes at once (for listings).
pub async fn tags_for_themes<C>(
    db: &C,
    theme_ids: &[i32],
) -> Result<HashMap<i32, Vec<String>>, DbErr>
where
    C: ConnectionTrait,
{
    if theme_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = theme_tags::Entity::find()
        .filter(theme_tags::Column::ThemeId.is_in(theme_ids.to_vec()))
        .order_by_asc(theme_tags::Column::Position)
        .all(db)
        .await?;

    if links.is_empty() {
        return Ok(HashMap::new());
    }

    let tag_ids: Vec<i32> = links.iter().map(|link| link.tag_id).collect();
    let names: HashMap<i32, String> = tags::Entity::find()
        .filter(tags::Column::Id.is_in(tag_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|tag| (tag.id, tag.name))
        .collect();

    let mut result: HashMap<i32, Vec<String>> = HashMap::new();
    for link in links {
        if let Some(name) = names.get(&link.tag_id) {
            result
                .entry(link.theme_id)
                .or_default()
                .push(name.to_owned());
        }
    }

    Ok(result)
}

pub async fn tags_for_theme<C>(db: &C, theme_id: i32) -> Result<Vec<String>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(tags_for_themes(db, &[theme_id])
        .await?
        .remove(&theme_id)
        .unwrap_or_default())
}

/// Removes the tag links of the given themes. Tags themselves are kept.
pub async fn detach_themes<C>(db: &C, theme_ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if theme_ids.is_empty() {
        return Ok(());
    }

    theme_tags::Entity::delete_many()
        .filter(theme_tags::Column::ThemeId.is_in(theme_ids.to_vec()))
        .exec(db)
        .await?;
    Ok(())
}
