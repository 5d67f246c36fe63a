//! Password hashing and the session cookie that carries the logged in user.

use crate::error::AppError;
use crate::orm::users;
use crate::principal::Principal;
use actix_session::Session;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

const SESSION_USER_KEY: &str = "user_id";

pub fn get_argon2() -> Argon2<'static> {
    Argon2::default()
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    get_argon2()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// False for a wrong password and for a stored value that is not a PHC string.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: stored hash is unreadable: {}", e);
            false
        }
    }
}

/// Looks the user up by name and checks the password.
pub async fn authenticate<C>(
    db: &C,
    username: &str,
    password: &str,
) -> Result<Option<users::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username.trim()))
        .one(db)
        .await?;

    Ok(user.filter(|u| verify_password(password, &u.password)))
}

/// Binds the session to `user_id` under a fresh session key.
pub fn login(session: &Session, user_id: i32) -> Result<(), AppError> {
    session
        .insert(SESSION_USER_KEY, user_id)
        .map_err(|e| AppError::Internal(format!("Failed to store session: {}", e)))?;
    session.renew();
    Ok(())
}

/// Drops every value in the session, including the anti-forgery secret.
pub fn logout(session: &Session) {
    session.purge();
}

/// Resolves the principal behind a session cookie. A cookie that names a
/// deleted user is treated as a guest.
pub async fn principal_from_session<C>(session: &Session, db: &C) -> Option<Principal>
where
    C: ConnectionTrait,
{
    let user_id = match session.get::<i32>(SESSION_USER_KEY) {
        Ok(Some(id)) => id,
        Ok(None) => return None,
        Err(e) => {
            log::error!("principal_from_session: unreadable session: {}", e);
            return None;
        }
    };

    match users::Entity::find_by_id(user_id).one(db).await {
        Ok(Some(user)) => Some(Principal::from(&user)),
        Ok(None) => {
            log::debug!("principal_from_session: user {} no longer exists", user_id);
            None
        }
        Err(e) => {
            log::error!("principal_from_session: {}", e);
            None
        }
    }
}
