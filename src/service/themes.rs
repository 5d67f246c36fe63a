use super::{filter_text, now, page_index, skipped, tags, websites, Mutation, Page};
use crate::constants::PAGE_SIZE;
use crate::error::AppError;
use crate::form::{FormErrors, ThemeForm};
use crate::lifecycle::{assign_owner, assign_slug, followed_theme_ids};
use crate::middleware::{Intent, TokenCheck};
use crate::orm::{follows, themes};
use crate::permission::{self, Action};
use crate::principal::Principal;
use crate::view::{ThemeView, WebsiteView};
use sea_orm::{
    entity::*, query::*, Condition, ConnectionTrait, DatabaseConnection, DbErr, Order,
    PaginatorTrait, TransactionTrait,
};
use serde::Serialize;
use validator::Validate;

pub const TITLE_TAKEN: &str = "This title is already used by another theme.";

#[derive(Clone, Debug, Default)]
pub struct ThemeFilter {
    /// Partial match.
    pub title: Option<String>,
    /// Partial match.
    pub description: Option<String>,
    pub owner: Option<i32>,
    /// Orders by `websites_count` instead of newest first.
    pub websites_count: Option<Order>,
}

/// A theme with its visible websites.
#[derive(Clone, Debug, Serialize)]
pub struct ThemeDetail {
    #[serde(skip)]
    pub model: themes::Model,
    pub theme: ThemeView,
    pub websites: Vec<WebsiteView>,
}

/// Themes the principal may see: every public theme and their own private ones.
pub(crate) fn visible_condition(principal: Option<&Principal>) -> Condition {
    let condition = Condition::any().add(themes::Column::Private.eq(false));
    match principal {
        Some(p) => condition.add(themes::Column::OwnerId.eq(p.id)),
        None => condition,
    }
}

pub async fn get<C>(db: &C, id: i32) -> Result<themes::Model, AppError>
where
    C: ConnectionTrait,
{
    themes::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Theme"))
}

pub async fn get_by_slug<C>(db: &C, slug: &str) -> Result<themes::Model, AppError>
where
    C: ConnectionTrait,
{
    themes::Entity::find()
        .filter(themes::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Theme"))
}

/// Attaches tags and follow state to a batch of themes with two queries.
pub async fn project<C>(
    db: &C,
    principal: Option<&Principal>,
    models: Vec<themes::Model>,
) -> Result<Vec<ThemeView>, DbErr>
where
    C: ConnectionTrait,
{
    let ids: Vec<i32> = models.iter().map(|t| t.id).collect();
    let mut tags = tags::tags_for_themes(db, &ids).await?;
    let followed = followed_theme_ids(db, principal, &ids).await?;

    Ok(models
        .iter()
        .map(|t| {
            ThemeView::project(
                t,
                tags.remove(&t.id).unwrap_or_default(),
                followed.contains(&t.id),
            )
        })
        .collect())
}

pub async fn list(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    filter: &ThemeFilter,
    page: u64,
) -> Result<Page<ThemeView>, AppError> {
    let page = page.max(1);
    let mut query = themes::Entity::find().filter(visible_condition(principal));

    if let Some(title) = filter_text(&filter.title) {
        query = query.filter(themes::Column::Title.contains(title));
    }
    if let Some(description) = filter_text(&filter.description) {
        query = query.filter(themes::Column::Description.contains(description));
    }
    if let Some(owner) = filter.owner {
        query = query.filter(themes::Column::OwnerId.eq(owner));
    }
    query = match &filter.websites_count {
        Some(order) => query
            .order_by(themes::Column::WebsitesCount, order.clone())
            .order_by_desc(themes::Column::Id),
        None => query
            .order_by_desc(themes::Column::CreatedAt)
            .order_by_desc(themes::Column::Id),
    };

    let paginator = query.paginate(db, PAGE_SIZE as usize);
    let total_items = paginator.num_items().await? as u64;
    let models = match page_index(page, total_items) {
        Some(index) => paginator.fetch_page(index).await?,
        None => Vec::new(),
    };

    Ok(Page::new(
        project(db, principal, models).await?,
        page,
        total_items,
    ))
}

/// Resolves a theme by slug for display, with the websites the principal may see.
pub async fn show(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    slug: &str,
) -> Result<ThemeDetail, AppError> {
    let theme = get_by_slug(db, slug).await?;
    permission::check_theme(principal, Action::View, &theme)?;

    let websites = websites::list_for_theme(db, principal, &theme)
        .await?
        .iter()
        .map(WebsiteView::from)
        .collect();
    let mut views = project(db, principal, vec![theme.clone()]).await?;
    let view = views.pop().ok_or(AppError::NotFound("Theme"))?;

    Ok(ThemeDetail {
        model: theme,
        theme: view,
        websites,
    })
}

async fn check_title<C>(db: &C, title: &str, exclude_id: Option<i32>) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    let mut query = themes::Entity::find().filter(themes::Column::Title.eq(title));
    if let Some(id) = exclude_id {
        query = query.filter(themes::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(AppError::field("title", TITLE_TAKEN));
    }
    Ok(())
}

fn validate(form: ThemeForm) -> Result<ThemeForm, AppError> {
    let form = form.normalized();
    form.validate()
        .map_err(|e| AppError::Validation(FormErrors::from(e)))?;
    Ok(form)
}

pub async fn create(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    form: ThemeForm,
    token: TokenCheck,
) -> Result<Mutation<themes::Model>, AppError> {
    permission::can_create_theme(principal)?;
    if !token.is_valid() {
        return skipped(Intent::NewTheme, 0);
    }
    let form = validate(form)?;
    check_title(db, &form.title, None).await?;

    let txn = db.begin().await?;

    let mut theme = themes::ActiveModel {
        title: Set(form.title.to_owned()),
        description: Set(form.description.to_owned()),
        slug: Set(assign_slug(&txn, &form.title, None).await?),
        private: Set(form.private),
        open: Set(form.open),
        approve: Set(form.approve),
        websites_count: Set(0),
        created_at: Set(now()),
        updated_at: Set(None),
        ..Default::default()
    };
    assign_owner(&mut theme, principal)?;
    let theme = theme
        .insert(&txn)
        .await
        .map_err(|e| AppError::unique_conflict(e, &[("title", TITLE_TAKEN)]))?;

    if let Some(names) = form.tag_names() {
        tags::sync_theme_tags(&txn, theme.id, &names).await?;
    }

    txn.commit().await?;
    log::info!("theme {} created as {}", theme.id, theme.slug);
    Ok(Mutation::Applied(theme))
}

pub async fn update(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    id: i32,
    form: ThemeForm,
    token: TokenCheck,
) -> Result<Mutation<themes::Model>, AppError> {
    let theme = get(db, id).await?;
    permission::check_theme(principal, Action::Edit, &theme)?;
    if !token.is_valid() {
        return skipped(Intent::EditTheme, id);
    }
    let form = validate(form)?;
    check_title(db, &form.title, Some(id)).await?;

    let txn = db.begin().await?;

    let title_changed = form.title != theme.title;
    let mut active: themes::ActiveModel = theme.into();
    if title_changed {
        active.slug = Set(assign_slug(&txn, &form.title, Some(id)).await?);
    }
    active.title = Set(form.title.to_owned());
    active.description = Set(form.description.to_owned());
    active.private = Set(form.private);
    active.open = Set(form.open);
    active.approve = Set(form.approve);
    active.updated_at = Set(Some(now()));
    let theme = active
        .update(&txn)
        .await
        .map_err(|e| AppError::unique_conflict(e, &[("title", TITLE_TAKEN)]))?;

    if let Some(names) = form.tag_names() {
        tags::sync_theme_tags(&txn, id, &names).await?;
    }

    txn.commit().await?;
    Ok(Mutation::Applied(theme))
}

/// Removes rows that reference the given themes, then the themes.
pub(crate) async fn delete_with_children<C>(db: &C, theme_ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if theme_ids.is_empty() {
        return Ok(());
    }

    websites::delete_in_themes(db, theme_ids).await?;
    follows::Entity::delete_many()
        .filter(follows::Column::TargetId.is_in(theme_ids.to_vec()))
        .exec(db)
        .await?;
    tags::detach_themes(db, theme_ids).await?;
    themes::Entity::delete_many()
        .filter(themes::Column::Id.is_in(theme_ids.to_vec()))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn delete(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    id: i32,
    token: TokenCheck,
) -> Result<Mutation<themes::Model>, AppError> {
    let theme = get(db, id).await?;
    permission::check_theme(principal, Action::Delete, &theme)?;
    if !token.is_valid() {
        return skipped(Intent::DeleteTheme, id);
    }

    let txn = db.begin().await?;
    delete_with_children(&txn, &[id]).await?;
    txn.commit().await?;

    log::info!("theme {} deleted", id);
    Ok(Mutation::Applied(theme))
}
