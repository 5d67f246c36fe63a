//! Registration, account settings, password change and account removal.

use super::{now, skipped, themes as theme_service, Mutation};
use crate::constants::ROLE_USER;
use crate::error::AppError;
use crate::form::{EditPasswordForm, FormErrors, RegisterForm, UserSettingsForm};
use crate::lifecycle::refresh_websites_count;
use crate::middleware::{Intent, TokenCheck};
use crate::orm::{follows, themes, users, websites};
use crate::principal::Principal;
use crate::session::hash_password;
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait,
};
use std::collections::BTreeSet;
use validator::Validate;

pub const USERNAME_TAKEN: &str = "This username is already taken.";
pub const EMAIL_TAKEN: &str = "This email address is already registered.";
pub const OWN_ACCOUNT_ONLY: &str = "You can only delete your own account.";

pub async fn get<C>(db: &C, id: i32) -> Result<users::Model, AppError>
where
    C: ConnectionTrait,
{
    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("User"))
}

async fn check_unique<C>(
    db: &C,
    username: &str,
    email: &str,
    exclude_id: Option<i32>,
) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    let mut errors = FormErrors::default();

    let mut by_name = users::Entity::find().filter(users::Column::Username.eq(username));
    let mut by_email = users::Entity::find().filter(users::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        by_name = by_name.filter(users::Column::Id.ne(id));
        by_email = by_email.filter(users::Column::Id.ne(id));
    }

    if by_name.one(db).await?.is_some() {
        errors.add("username", USERNAME_TAKEN);
    }
    if by_email.one(db).await?.is_some() {
        errors.add("email", EMAIL_TAKEN);
    }

    errors.into_result().map_err(AppError::Validation)
}

/// A concurrent registration can still win the race past `check_unique`.
fn account_conflict(err: DbErr) -> AppError {
    AppError::unique_conflict(err, &[("username", USERNAME_TAKEN), ("email", EMAIL_TAKEN)])
}

pub async fn register(
    db: &DatabaseConnection,
    form: RegisterForm,
    token: TokenCheck,
) -> Result<Mutation<users::Model>, AppError> {
    if !token.is_valid() {
        return skipped(Intent::Register, 0);
    }
    let form = form.normalized();
    form.check().map_err(AppError::Validation)?;
    check_unique(db, &form.username, &form.email, None).await?;

    let user = users::ActiveModel {
        username: Set(form.username.to_owned()),
        email: Set(form.email.to_owned()),
        password: Set(hash_password(&form.password)?),
        role: Set(ROLE_USER.to_owned()),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(account_conflict)?;

    log::info!("user {} registered", user.id);
    Ok(Mutation::Applied(user))
}

pub async fn update_settings(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    form: UserSettingsForm,
    token: TokenCheck,
) -> Result<Mutation<users::Model>, AppError> {
    let principal = principal.ok_or(AppError::LoginRequired)?;
    if !token.is_valid() {
        return skipped(Intent::Settings, principal.id);
    }
    let form = form.normalized();
    form.validate()
        .map_err(|e| AppError::Validation(FormErrors::from(e)))?;
    check_unique(db, &form.username, &form.email, Some(principal.id)).await?;

    let mut user: users::ActiveModel = get(db, principal.id).await?.into();
    user.username = Set(form.username.to_owned());
    user.email = Set(form.email.to_owned());
    let user = user.update(db).await.map_err(account_conflict)?;
    Ok(Mutation::Applied(user))
}

/// Stores a new password hash. The caller must end the session afterwards.
pub async fn change_password(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    form: EditPasswordForm,
    token: TokenCheck,
) -> Result<Mutation<()>, AppError> {
    let principal = principal.ok_or(AppError::LoginRequired)?;
    if !token.is_valid() {
        return skipped(Intent::Password, principal.id);
    }
    form.check().map_err(AppError::Validation)?;

    let mut user: users::ActiveModel = get(db, principal.id).await?.into();
    user.password = Set(hash_password(&form.new_password)?);
    user.update(db).await?;

    log::info!("user {} changed their password", principal.id);
    Ok(Mutation::Applied(()))
}

/// Deletes the account with its follows, websites and themes. Themes of other
/// users that lose websites get their counters recomputed.
pub async fn delete_account(
    db: &DatabaseConnection,
    principal: Option<&Principal>,
    id: i32,
    token: TokenCheck,
) -> Result<Mutation<()>, AppError> {
    let principal = principal.ok_or(AppError::LoginRequired)?;
    if principal.id != id {
        return Err(AppError::Forbidden(OWN_ACCOUNT_ONLY.to_owned()));
    }
    if !token.is_valid() {
        return skipped(Intent::DeleteAccount, id);
    }

    let txn = db.begin().await?;

    let owned_themes: Vec<i32> = themes::Entity::find()
        .filter(themes::Column::OwnerId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();

    let touched: BTreeSet<i32> = websites::Entity::find()
        .filter(websites::Column::OwnerId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|w| w.theme_id)
        .filter(|theme_id| !owned_themes.contains(theme_id))
        .collect();

    follows::Entity::delete_many()
        .filter(follows::Column::FollowedById.eq(id))
        .exec(&txn)
        .await?;
    websites::Entity::delete_many()
        .filter(websites::Column::OwnerId.eq(id))
        .exec(&txn)
        .await?;
    theme_service::delete_with_children(&txn, &owned_themes).await?;
    for theme_id in &touched {
        refresh_websites_count(&txn, *theme_id).await?;
    }
    users::Entity::delete_many()
        .filter(users::Column::Id.eq(id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    log::info!(
        "user {} deleted with {} themes, {} other themes recounted",
        id,
        owned_themes.len(),
        touched.len()
    );
    Ok(Mutation::Applied(()))
}
