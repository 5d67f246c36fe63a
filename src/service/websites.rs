use super::{filter_text, now, page_index, skipped, themes as theme_service, Mutation, Page};
use crate::constants::PAGE_SIZE;
use crate::error::AppError;
use crate::form::{FormErrors, WebsiteForm};
use crate::lifecycle::{assign_owner, refresh_websites_count};
use crate::middleware::{Intent, TokenCheck};
use crate::orm::{themes, websites};
use crate::permission::{self, Action};
use crate::principal::Principal;
use crate::view::WebsiteView;
use sea_orm::{
    entity::*, query::*, Condition, ConnectionTrait, DatabaseConnection, DbErr, PaginatorTrait,
    TransactionTrait,
};
use validator::Validate;

pub const URL_TAKEN: &str = "This link has already been added to this theme.";
pub const ALREADY_MODERATED: &str = "This link has already been moderated.";

#[derive(Clone, Debug, Default)]
pub struct WebsiteFilter {
    /// Partial match.
    pub url: Option<String>,
    pub theme: Option<i32>,
    pub owner: Option<i32>,
}

/// Published websites, plus pending ones for their author and for the owner
/// of the theme. Expects `themes` to be joined.
fn listed_condition(principal: Option<&Principal>) -> Condition {
    let published = Condition::any().add(websites::Column::Approved.eq(true));
    match principal {
        Some(p) => published.add(
            Condition::all()
                .add(websites::Column::Approved.is_null())
                .add(
                    Condition::any()
                        .add(websites::Column::OwnerId.eq(p.id))
                        .add(themes::Column::OwnerId.eq(p.id)),
                ),
        ),
        None => published,
    }
}

pub async fn get<C>(db: &C, id: i32) -> Result<websites::Model, AppError>
where
    C: ConnectionTrait,
{
    websites::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Website"))
}

/// A website together with the theme it belongs to.
pub async fn get_with_theme<C>(db: &C, id: i32) -> Result<(websites::Model, themes::Model), AppError>
where
    C: ConnectionTrait,
{
    match websites::Entity::find_by_id(id)
        .find_also_related(themes::Entity)
        .one(db)
        .await?
    {
        Some((website, Some(theme))) => Ok((website, theme)),
        Some((website, None)) => {
            log::error!("website {} references missing theme {}", website.id, website.theme_id);
            Err(AppError::NotFound("Theme"))
        }
        None => Err(AppError::NotFound("Website")),
    }
}

/// Websites of one theme in the order they are displayed, newest first.
pub async fn list_for_theme<C>(
    db: &C,
    principal: Option<&Principal>,
    theme: &themes::Model,
) -> Result<Vec<websites::Model>, DbErr>
where
    C: ConnectionTrait,
{
    websites::Entity::find()
        .inner_join(themes::Entity)
        .filter(websites::Column::ThemeId.eq(theme.id))
        .filter(listed_condition(principal))
        .order_by_desc(websites::Column::Id)
        .all(db)
        .await
}

pub async fn list(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    filter: &WebsiteFilter,
    page: u64,
) -> Result<Page<WebsiteView>, AppError> {
    let page = page.max(1);
    let mut query = websites::Entity::find()
        .inner_join(themes::Entity)
        .filter(theme_service::visible_condition(principal))
        .filter(listed_condition(principal));

    if let Some(url) = filter_text(&filter.url) {
        query = query.filter(websites::Column::Url.contains(url));
    }
    if let Some(theme) = filter.theme {
        query = query.filter(websites::Column::ThemeId.eq(theme));
    }
    if let Some(owner) = filter.owner {
        query = query.filter(websites::Column::OwnerId.eq(owner));
    }

    let paginator = query
        .order_by_desc(websites::Column::Id)
        .paginate(db, PAGE_SIZE as usize);
    let total_items = paginator.num_items().await? as u64;
    let models = match page_index(page, total_items) {
        Some(index) => paginator.fetch_page(index).await?,
        None => Vec::new(),
    };
    let items = models
        .iter()
        .map(WebsiteView::from)
        .collect();

    Ok(Page::new(items, page, total_items))
}

async fn check_url<C>(
    db: &C,
    theme_id: i32,
    url: &str,
    exclude_id: Option<i32>,
) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    let mut query = websites::Entity::find()
        .filter(websites::Column::ThemeId.eq(theme_id))
        .filter(websites::Column::Url.eq(url));
    if let Some(id) = exclude_id {
        query = query.filter(websites::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(AppError::field("url", URL_TAKEN));
    }
    Ok(())
}

fn validate(form: WebsiteForm) -> Result<WebsiteForm, AppError> {
    let form = form.normalized();
    form.validate()
        .map_err(|e| AppError::Validation(FormErrors::from(e)))?;
    Ok(form)
}

pub async fn create(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    theme_id: i32,
    form: WebsiteForm,
    token: TokenCheck,
) -> Result<Mutation<websites::Model>, AppError> {
    let theme = theme_service::get(db, theme_id).await?;
    permission::can_create_website(principal, &theme)?;
    let principal = principal.ok_or(AppError::LoginRequired)?;
    if !token.is_valid() {
        return skipped(Intent::NewWebsite, theme_id);
    }
    let form = validate(form)?;
    check_url(db, theme_id, &form.url, None).await?;

    let txn = db.begin().await?;

    let mut website = websites::ActiveModel {
        url: Set(form.url.to_owned()),
        comment: Set(form.comment.to_owned()),
        theme_id: Set(theme_id),
        approved: Set(permission::initial_approval(principal, &theme)),
        created_at: Set(now()),
        ..Default::default()
    };
    assign_owner(&mut website, Some(principal))?;
    let website = website.insert(&txn).await?;
    refresh_websites_count(&txn, theme_id).await?;

    txn.commit().await?;
    log::info!("website {} added to theme {}", website.id, theme_id);
    Ok(Mutation::Applied(website))
}

/// Edits a website. When `form.theme` names another theme the website moves
/// there, which requires the right to add links to it.
pub async fn update(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    id: i32,
    form: WebsiteForm,
    token: TokenCheck,
) -> Result<Mutation<websites::Model>, AppError> {
    let (website, theme) = get_with_theme(db, id).await?;
    permission::check_website(principal, Action::Edit, &website, &theme)?;
    let principal = principal.ok_or(AppError::LoginRequired)?;
    if !token.is_valid() {
        return skipped(Intent::EditWebsite, id);
    }
    let form = validate(form)?;

    let target = match form.theme {
        Some(target_id) if target_id != theme.id => {
            let target = theme_service::get(db, target_id).await?;
            permission::can_create_website(Some(principal), &target)?;
            Some(target)
        }
        _ => None,
    };
    let target_id = target.as_ref().map(|t| t.id).unwrap_or(theme.id);
    check_url(db, target_id, &form.url, Some(id)).await?;

    let txn = db.begin().await?;

    let mut active: websites::ActiveModel = website.into();
    active.url = Set(form.url.to_owned());
    active.comment = Set(form.comment.to_owned());
    if let Some(target) = &target {
        active.theme_id = Set(target.id);
        active.approved = Set(permission::initial_approval(principal, target));
    }
    let website = active.update(&txn).await?;

    if target.is_some() {
        refresh_websites_count(&txn, theme.id).await?;
        refresh_websites_count(&txn, target_id).await?;
    }

    txn.commit().await?;
    Ok(Mutation::Applied(website))
}

/// Deletes a website and returns the theme it belonged to.
pub async fn delete(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    id: i32,
    token: TokenCheck,
) -> Result<Mutation<themes::Model>, AppError> {
    let (website, theme) = get_with_theme(db, id).await?;
    permission::check_website(principal, Action::Delete, &website, &theme)?;
    if !token.is_valid() {
        return skipped(Intent::DeleteWebsite, id);
    }

    let txn = db.begin().await?;
    websites::Entity::delete_many()
        .filter(websites::Column::Id.eq(id))
        .exec(&txn)
        .await?;
    let count = refresh_websites_count(&txn, theme.id).await?;
    txn.commit().await?;

    log::info!("website {} deleted, theme {} now has {}", id, theme.id, count);
    Ok(Mutation::Applied(themes::Model {
        websites_count: count,
        ..theme
    }))
}

/// Approves or rejects a pending website. Rejection is final.
pub async fn moderate(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    id: i32,
    approve: bool,
    token: TokenCheck,
) -> Result<Mutation<(websites::Model, themes::Model)>, AppError> {
    let (website, theme) = get_with_theme(db, id).await?;
    permission::check_website(principal, Action::Moderate, &website, &theme)?;
    if !token.is_valid() {
        return skipped(Intent::Moderate, id);
    }
    if website.approved.is_some() {
        return Err(AppError::field("approved", ALREADY_MODERATED));
    }

    let mut active: websites::ActiveModel = website.into();
    active.approved = Set(Some(approve));
    let website = active.update(db).await?;

    log::info!(
        "website {} {} by theme owner",
        id,
        if approve { "approved" } else { "rejected" }
    );
    Ok(Mutation::Applied((website, theme)))
}

/// Deletes every website of the given themes.
pub(crate) async fn delete_in_themes<C>(db: &C, theme_ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    websites::Entity::delete_many()
        .filter(websites::Column::ThemeId.is_in(theme_ids.to_vec()))
        .exec(db)
        .await?;
    Ok(())
}
