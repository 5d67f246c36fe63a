//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use linkhub::form::{ThemeForm, WebsiteForm};
use linkhub::middleware::TokenCheck;
use linkhub::orm::{themes, users, websites};
use linkhub::principal::Principal;
use linkhub::service;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

pub const TEST_PASSWORD: &str = "password123";

/// Create a user with `TEST_PASSWORD` and return it as the acting principal.
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> Result<Principal, DbErr> {
    let password = linkhub::session::hash_password(TEST_PASSWORD)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    let user = users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@test.com", username)),
        password: Set(password),
        role: Set(linkhub::constants::ROLE_USER.to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Principal::from(&user))
}

pub fn theme_form(title: &str) -> ThemeForm {
    ThemeForm {
        title: title.to_string(),
        description: Some(format!("All about {}", title)),
        ..Default::default()
    }
}

/// Create a theme through the service, as the given owner.
pub async fn create_test_theme(
    db: &DatabaseConnection,
    owner: &Principal,
    form: ThemeForm,
) -> themes::Model {
    service::themes::create(db, Some(owner), form, TokenCheck::Valid)
        .await
        .expect("Failed to create theme")
        .applied()
        .expect("Theme creation was skipped")
}

pub fn website_form(url: &str) -> WebsiteForm {
    WebsiteForm {
        url: url.to_string(),
        comment: Some("Worth a visit".to_string()),
        ..Default::default()
    }
}

/// Add a website to a theme through the service.
pub async fn create_test_website(
    db: &DatabaseConnection,
    owner: &Principal,
    theme_id: i32,
    url: &str,
) -> websites::Model {
    service::websites::create(db, Some(owner), theme_id, website_form(url), TokenCheck::Valid)
        .await
        .expect("Failed to create website")
        .applied()
        .expect("Website creation was skipped")
}

/// Reload a theme to observe its stored counter.
pub async fn reload_theme(db: &DatabaseConnection, id: i32) -> themes::Model {
    themes::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("Failed to query theme")
        .expect("Theme not found")
}
