//! PostgreSQL metadata store tests.
//!
//! Run with a disposable database:
//! `CLOUDNEST_TEST_DATABASE_URL=postgres://... cargo test -- --ignored`

use cloudnest_core::config::DatabaseConfig;
use cloudnest_core::error::ErrorKind;
use cloudnest_core::types::{ItemId, UserId};
use cloudnest_database::migration::run_migrations;
use cloudnest_database::{MetadataStore, PgMetadataStore, connect};
use cloudnest_entity::file::NewFile;
use cloudnest_entity::folder::NewFolder;
use cloudnest_entity::item::ItemStatus;
use cloudnest_entity::share::{ShareGrant, SharePermission};
use cloudnest_entity::user::{CreateUser, User, UserRole};

async fn store() -> PgMetadataStore {
    let mut config = DatabaseConfig::default();
    if let Ok(url) = std::env::var("CLOUDNEST_TEST_DATABASE_URL") {
        config.url = url;
    }
    let pool = connect(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();
    PgMetadataStore::new(pool)
}

async fn seed_user(store: &PgMetadataStore, prefix: &str) -> User {
    let mut tx = store.begin().await.unwrap();
    let user = tx
        .insert_user(&CreateUser {
            username: format!("{prefix}-{}", uuid::Uuid::new_v4().simple()),
            role: UserRole::User,
            quota_limit_bytes: 1000,
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    user
}

fn folder(owner: UserId, parent: &str, name: &str) -> NewFolder {
    NewFolder {
        owner_id: owner,
        name: name.to_string(),
        parent_path: parent.to_string(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_rollback_discards_writes() {
    let store = store().await;
    let user = seed_user(&store, "rollback").await;

    let mut tx = store.begin().await.unwrap();
    tx.insert_folder(&folder(user.id, "/", "docs")).await.unwrap();
    tx.adjust_quota_used(user.id, 10).await.unwrap();
    tx.rollback().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(tx.list_folders(user.id, "/", ItemStatus::Active).await.unwrap().is_empty());
    assert_eq!(tx.find_user(user.id).await.unwrap().unwrap().quota_used_bytes, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_active_name_clash_is_conflict() {
    let store = store().await;
    let user = seed_user(&store, "clash").await;

    let mut tx = store.begin().await.unwrap();
    let first = tx.insert_folder(&folder(user.id, "/", "docs")).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let err = tx.insert_folder(&folder(user.id, "/", "docs")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    drop(tx);

    let mut tx = store.begin().await.unwrap();
    tx.set_folder_status(first.id, ItemStatus::Trashed).await.unwrap();
    tx.insert_folder(&folder(user.id, "/", "docs")).await.unwrap();
    assert_eq!(tx.count_folders_at(user.id, "/", "docs").await.unwrap(), 2);
    tx.commit().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_prefix_rewrite_leaves_siblings_alone() {
    let store = store().await;
    let user = seed_user(&store, "rewrite").await;

    let mut tx = store.begin().await.unwrap();
    tx.insert_folder(&folder(user.id, "/docs", "sub")).await.unwrap();
    tx.insert_folder(&folder(user.id, "/docs2", "other")).await.unwrap();
    tx.insert_file(&NewFile {
        owner_id: user.id,
        name: "a.txt".to_string(),
        mime_type: "text/plain".to_string(),
        size_bytes: 1,
        parent_path: "/docs/sub".to_string(),
    })
    .await
    .unwrap();

    let changed = tx
        .rewrite_path_prefix(user.id, "/docs", "/archive/docs")
        .await
        .unwrap();
    assert_eq!(changed, 2);

    let files = tx.list_files_under(user.id, "/archive/docs").await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].parent_path, "/archive/docs/sub");
    let untouched = tx.list_folders(user.id, "/docs2", ItemStatus::Active).await.unwrap();
    assert_eq!(untouched.len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_grants_upsert_and_list_shared() {
    let store = store().await;
    let owner = seed_user(&store, "owner").await;
    let grantee = seed_user(&store, "grantee").await;

    let mut tx = store.begin().await.unwrap();
    let docs = tx.insert_folder(&folder(owner.id, "/", "docs")).await.unwrap();
    let item = ItemId::Folder(docs.id);
    for permission in [SharePermission::Read, SharePermission::Write] {
        tx.upsert_grant(&ShareGrant {
            item,
            grantee_id: grantee.id,
            permission,
        })
        .await
        .unwrap();
    }
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let shared = tx.list_shared_with(grantee.id).await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].permission, SharePermission::Write);
    assert_eq!(shared[0].owner_username, owner.username);

    assert_eq!(tx.delete_grants_for(item).await.unwrap(), 1);
    assert!(tx.list_shared_with(grantee.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_quota_cannot_go_negative() {
    let store = store().await;
    let user = seed_user(&store, "quota").await;

    let mut tx = store.begin().await.unwrap();
    tx.lock_user(user.id).await.unwrap();
    let updated = tx.adjust_quota_used(user.id, 400).await.unwrap();
    assert_eq!(updated.quota_used_bytes, 400);
    let err = tx.adjust_quota_used(user.id, -401).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Internal);
}
