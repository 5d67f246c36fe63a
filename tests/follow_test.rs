//! Integration tests for following themes

mod common;

use common::{database::*, fixtures::*};
use linkhub::error::AppError;
use linkhub::form::ThemeForm;
use linkhub::middleware::TokenCheck;
use linkhub::orm::follows;
use linkhub::service::{self, themes::ThemeFilter, Mutation};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

#[actix_rt::test]
async fn test_follow_is_idempotent() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let bob = create_test_user(&db, "bob").await.expect("Failed to create user");
    let theme = create_test_theme(&db, &alice, theme_form("Popular")).await;

    for _ in 0..2 {
        let result = service::follows::follow(&db, Some(&bob), theme.id, TokenCheck::Valid)
            .await
            .expect("Failed to follow");
        assert!(result.is_applied());
    }

    assert_eq!(follows::Entity::find().count(&db).await.unwrap(), 1);
    assert!(service::follows::is_following(&db, bob.id, theme.id).await.unwrap());

    service::follows::unfollow(&db, Some(&bob), theme.id, TokenCheck::Valid)
        .await
        .expect("Failed to unfollow");
    service::follows::unfollow(&db, Some(&bob), theme.id, TokenCheck::Valid)
        .await
        .expect("Unfollowing twice should not error");
    assert_eq!(follows::Entity::find().count(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_schema_rejects_duplicate_follow_rows() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let bob = create_test_user(&db, "bob").await.expect("Failed to create user");
    let theme = create_test_theme(&db, &alice, theme_form("Popular")).await;

    service::follows::follow(&db, Some(&bob), theme.id, TokenCheck::Valid)
        .await
        .expect("Failed to follow");

    let duplicate = follows::ActiveModel {
        followed_by_id: Set(bob.id),
        target_id: Set(theme.id),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect_err("a second follow row should be rejected");

    assert!(linkhub::error::is_unique_violation(&duplicate));
    assert_eq!(follows::Entity::find().count(&db).await.unwrap(), 1);
}

#[actix_rt::test]
async fn test_follow_requires_login_and_valid_token() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let bob = create_test_user(&db, "bob").await.expect("Failed to create user");
    let theme = create_test_theme(&db, &alice, theme_form("Popular")).await;

    let as_guest = service::follows::follow(&db, None, theme.id, TokenCheck::Valid).await;
    assert!(matches!(as_guest, Err(AppError::LoginRequired)));

    let tampered = service::follows::follow(&db, Some(&bob), theme.id, TokenCheck::Invalid)
        .await
        .expect("Skipped follow should not error");
    assert_eq!(tampered, Mutation::Skipped);
    assert_eq!(follows::Entity::find().count(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_private_theme_cannot_be_followed_by_others() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let bob = create_test_user(&db, "bob").await.expect("Failed to create user");
    let theme = create_test_theme(
        &db,
        &alice,
        ThemeForm {
            private: true,
            ..theme_form("Hidden")
        },
    )
    .await;

    let result = service::follows::follow(&db, Some(&bob), theme.id, TokenCheck::Valid).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[actix_rt::test]
async fn test_followed_by_current_user_projection() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let bob = create_test_user(&db, "bob").await.expect("Failed to create user");
    let followed = create_test_theme(&db, &alice, theme_form("Followed")).await;
    let ignored = create_test_theme(&db, &alice, theme_form("Ignored")).await;

    service::follows::follow(&db, Some(&bob), followed.id, TokenCheck::Valid)
        .await
        .expect("Failed to follow");

    let flags = |page: linkhub::service::Page<linkhub::view::ThemeView>| {
        page.items
            .into_iter()
            .map(|t| (t.id, t.followed_by_current_user))
            .collect::<Vec<_>>()
    };

    let for_bob = service::themes::list(&db, Some(&bob), &ThemeFilter::default(), 1)
        .await
        .unwrap();
    assert_eq!(flags(for_bob), vec![(ignored.id, false), (followed.id, true)]);

    let for_alice = service::themes::list(&db, Some(&alice), &ThemeFilter::default(), 1)
        .await
        .unwrap();
    assert_eq!(flags(for_alice), vec![(ignored.id, false), (followed.id, false)]);

    let for_guest = service::themes::list(&db, None, &ThemeFilter::default(), 1)
        .await
        .unwrap();
    assert_eq!(flags(for_guest), vec![(ignored.id, false), (followed.id, false)]);

    let detail = service::themes::show(&db, Some(&bob), &followed.slug)
        .await
        .unwrap();
    assert!(detail.theme.followed_by_current_user);
}

#[actix_rt::test]
async fn test_following_lists_most_recent_first() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let bob = create_test_user(&db, "bob").await.expect("Failed to create user");
    let first = create_test_theme(&db, &alice, theme_form("First")).await;
    let second = create_test_theme(&db, &alice, theme_form("Second")).await;

    service::follows::follow(&db, Some(&bob), second.id, TokenCheck::Valid)
        .await
        .expect("Failed to follow");
    service::follows::follow(&db, Some(&bob), first.id, TokenCheck::Valid)
        .await
        .expect("Failed to follow");

    let following = service::follows::following(&db, Some(&bob)).await.unwrap();
    let ids: Vec<i32> = following.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert!(following.iter().all(|t| t.followed_by_current_user));

    let as_guest = service::follows::following(&db, None).await;
    assert!(matches!(as_guest, Err(AppError::LoginRequired)));
}
