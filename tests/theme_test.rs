//! Integration tests for theme creation, renaming and removal

mod common;

use common::{database::*, fixtures::*};
use linkhub::error::AppError;
use linkhub::form::ThemeForm;
use linkhub::middleware::TokenCheck;
use linkhub::orm::{follows, theme_tags, themes, websites};
use linkhub::service::{self, themes::ThemeFilter, Mutation};
use sea_orm::{ActiveModelTrait, EntityTrait, Order, PaginatorTrait, Set};

#[actix_rt::test]
async fn test_create_theme_assigns_owner_and_slug() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");

    let theme = create_test_theme(&db, &alice, theme_form("Rust Crates")).await;

    assert_eq!(theme.owner_id, alice.id);
    assert_eq!(theme.slug, "rust-crates");
    assert_eq!(theme.websites_count, 0);
    assert!(theme.updated_at.is_none());
}

#[actix_rt::test]
async fn test_colliding_slug_gets_suffix() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");

    let first = create_test_theme(&db, &alice, theme_form("Rust")).await;
    let second = create_test_theme(&db, &alice, theme_form("Rust!")).await;

    assert_eq!(first.slug, "rust");
    assert_eq!(second.slug, "rust-2");
}

#[actix_rt::test]
async fn test_create_theme_requires_login() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let result = service::themes::create(&db, None, theme_form("Anonymous"), TokenCheck::Valid).await;

    assert!(matches!(result, Err(AppError::LoginRequired)));
    assert_eq!(themes::Entity::find().count(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_blank_title_is_rejected_without_writing() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");

    let result =
        service::themes::create(&db, Some(&alice), theme_form("   "), TokenCheck::Valid).await;

    match result {
        Err(AppError::Validation(errors)) => assert!(errors.has("title")),
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert_eq!(themes::Entity::find().count(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_duplicate_title_is_rejected() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    create_test_theme(&db, &alice, theme_form("Recipes")).await;

    let result =
        service::themes::create(&db, Some(&alice), theme_form("Recipes"), TokenCheck::Valid).await;

    match result {
        Err(AppError::Validation(errors)) => {
            assert_eq!(errors.get("title"), [service::themes::TITLE_TAKEN])
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[actix_rt::test]
async fn test_title_clash_at_write_time_is_a_field_error() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    create_test_theme(&db, &alice, theme_form("Recipes")).await;

    // A second writer that got past the lookup before the first one committed.
    let err = themes::ActiveModel {
        title: Set("Recipes".to_string()),
        slug: Set("recipes-2".to_string()),
        private: Set(false),
        open: Set(false),
        approve: Set(false),
        owner_id: Set(alice.id),
        websites_count: Set(0),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect_err("unique index should reject the duplicate title");

    match AppError::unique_conflict(err, &[("title", service::themes::TITLE_TAKEN)]) {
        AppError::Validation(errors) => {
            assert_eq!(errors.get("title"), [service::themes::TITLE_TAKEN])
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert_eq!(themes::Entity::find().count(&db).await.unwrap(), 1);
}

#[actix_rt::test]
async fn test_reserved_route_segment_is_never_a_slug() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");

    let theme = create_test_theme(&db, &alice, theme_form("New")).await;
    assert_eq!(theme.slug, "new-2");

    let shown = service::themes::show(&db, None, "new-2").await.unwrap();
    assert_eq!(shown.theme.title, "New");
}

#[actix_rt::test]
async fn test_rename_regenerates_slug_and_stamps_update() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let theme = create_test_theme(&db, &alice, theme_form("Old Name")).await;

    let updated = service::themes::update(
        &db,
        Some(&alice),
        theme.id,
        theme_form("New Name"),
        TokenCheck::Valid,
    )
    .await
    .expect("Failed to update theme")
    .applied()
    .expect("Update was skipped");

    assert_eq!(updated.slug, "new-name");
    assert_eq!(updated.created_at, theme.created_at);
    assert!(updated.updated_at.is_some());
}

#[actix_rt::test]
async fn test_only_owner_can_edit() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let bob = create_test_user(&db, "bob").await.expect("Failed to create user");
    let theme = create_test_theme(&db, &alice, theme_form("Mine")).await;

    let as_bob =
        service::themes::update(&db, Some(&bob), theme.id, theme_form("Taken"), TokenCheck::Valid)
            .await;
    let as_guest =
        service::themes::update(&db, None, theme.id, theme_form("Taken"), TokenCheck::Valid).await;

    assert!(matches!(as_bob, Err(AppError::Forbidden(_))));
    assert!(matches!(as_guest, Err(AppError::LoginRequired)));
    assert_eq!(reload_theme(&db, theme.id).await.title, "Mine");
}

#[actix_rt::test]
async fn test_tampered_token_skips_delete() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let theme = create_test_theme(&db, &alice, theme_form("Keep Me")).await;

    let result = service::themes::delete(&db, Some(&alice), theme.id, TokenCheck::Invalid)
        .await
        .expect("Skipped delete should not error");

    assert_eq!(result, Mutation::Skipped);
    assert_eq!(themes::Entity::find().count(&db).await.unwrap(), 1);
}

#[actix_rt::test]
async fn test_delete_removes_children() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let bob = create_test_user(&db, "bob").await.expect("Failed to create user");
    let theme = create_test_theme(
        &db,
        &alice,
        ThemeForm {
            open: true,
            tags: Some("web, tools".to_string()),
            ..theme_form("Doomed")
        },
    )
    .await;
    create_test_website(&db, &alice, theme.id, "https://example.com").await;
    create_test_website(&db, &bob, theme.id, "https://example.org").await;
    service::follows::follow(&db, Some(&bob), theme.id, TokenCheck::Valid)
        .await
        .expect("Failed to follow");

    let result = service::themes::delete(&db, Some(&alice), theme.id, TokenCheck::Valid)
        .await
        .expect("Failed to delete theme");

    assert!(result.is_applied());
    assert_eq!(themes::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(websites::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(follows::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(theme_tags::Entity::find().count(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_tags_are_kept_in_order_and_replaced() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let theme = create_test_theme(
        &db,
        &alice,
        ThemeForm {
            tags: Some("rust, web, Rust".to_string()),
            ..theme_form("Tagged")
        },
    )
    .await;

    let tags = service::tags::tags_for_theme(&db, theme.id).await.unwrap();
    assert_eq!(tags, vec!["rust".to_string(), "web".to_string()]);

    service::themes::update(
        &db,
        Some(&alice),
        theme.id,
        ThemeForm {
            tags: Some("cli".to_string()),
            ..theme_form("Tagged")
        },
        TokenCheck::Valid,
    )
    .await
    .expect("Failed to update tags");

    let tags = service::tags::tags_for_theme(&db, theme.id).await.unwrap();
    assert_eq!(tags, vec!["cli".to_string()]);
}

#[actix_rt::test]
async fn test_private_theme_is_hidden_from_others() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    let bob = create_test_user(&db, "bob").await.expect("Failed to create user");
    let theme = create_test_theme(
        &db,
        &alice,
        ThemeForm {
            private: true,
            ..theme_form("Secret")
        },
    )
    .await;

    let filter = ThemeFilter::default();
    let for_bob = service::themes::list(&db, Some(&bob), &filter, 1).await.unwrap();
    let for_guest = service::themes::list(&db, None, &filter, 1).await.unwrap();
    let for_alice = service::themes::list(&db, Some(&alice), &filter, 1).await.unwrap();

    assert_eq!(for_bob.total_items, 0);
    assert_eq!(for_guest.total_items, 0);
    assert_eq!(for_alice.total_items, 1);

    let show = service::themes::show(&db, Some(&bob), &theme.slug).await;
    assert!(matches!(show, Err(AppError::Forbidden(_))));
    let show = service::themes::show(&db, None, &theme.slug).await;
    assert!(matches!(show, Err(AppError::LoginRequired)));
}

#[actix_rt::test]
async fn test_list_pages_by_ten_and_orders_by_count() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");

    let mut ids = Vec::new();
    for n in 0..12 {
        let theme = create_test_theme(&db, &alice, theme_form(&format!("Theme {}", n))).await;
        ids.push(theme.id);
    }
    create_test_website(&db, &alice, ids[3], "https://one.example").await;
    create_test_website(&db, &alice, ids[3], "https://two.example").await;
    create_test_website(&db, &alice, ids[7], "https://three.example").await;

    let first = service::themes::list(&db, None, &ThemeFilter::default(), 1).await.unwrap();
    let second = service::themes::list(&db, None, &ThemeFilter::default(), 2).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(second.items.len(), 2);
    assert_eq!(first.total_items, 12);
    assert_eq!(first.total_pages, 2);
    // Newest first by default.
    assert_eq!(first.items[0].id, ids[11]);

    let by_count = ThemeFilter {
        websites_count: Some(Order::Desc),
        ..Default::default()
    };
    let ranked = service::themes::list(&db, None, &by_count, 1).await.unwrap();
    assert_eq!(ranked.items[0].id, ids[3]);
    assert_eq!(ranked.items[0].websites_count, 2);
    assert_eq!(ranked.items[1].id, ids[7]);

    let by_title = ThemeFilter {
        title: Some("Theme 1".to_string()),
        ..Default::default()
    };
    // "Theme 1", "Theme 10" and "Theme 11".
    let matched = service::themes::list(&db, None, &by_title, 1).await.unwrap();
    assert_eq!(matched.total_items, 3);
}

#[actix_rt::test]
async fn test_page_past_the_end_is_empty() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let alice = create_test_user(&db, "alice").await.expect("Failed to create user");
    create_test_theme(&db, &alice, theme_form("Lonely")).await;

    let page = service::themes::list(&db, None, &ThemeFilter::default(), u64::MAX)
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 1);
    assert_eq!(page.total_pages, 1);

    let page = service::themes::list(&db, None, &ThemeFilter::default(), 2).await.unwrap();
    assert!(page.items.is_empty());
}
