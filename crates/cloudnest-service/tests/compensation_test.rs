//! Physical-store failures after a metadata commit must be compensated.

mod helpers;

use cloudnest_core::error::ErrorKind;
use cloudnest_entity::user::UserRole;
use cloudnest_service::request::{CreateFolderRequest, MoveItemRequest, ProvisionUserRequest};

#[tokio::test]
async fn test_failed_blob_move_undoes_upload() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;

    env.fail(&env.storage.fail_rename, true);
    let err = env
        .upload(&alice, "/", "a.txt", &[1u8; 300])
        .await
        .unwrap_err();
    env.fail(&env.storage.fail_rename, false);

    assert_eq!(err.kind, ErrorKind::Internal);
    assert!(env.names(&alice, "/").await.is_empty());
    assert_eq!(env.quota_used(&alice).await, 0);

    // The staged upload is still there, so the client can retry.
    let file = env.upload(&alice, "/", "a.txt", &[1u8; 300]).await.unwrap();
    assert_eq!(env.quota_used(&alice).await, 300);
    assert!(env.on_disk(&format!("alice/{}", file.id)));
}

#[tokio::test]
async fn test_failed_mkdir_removes_folder_row() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;

    env.fail(&env.storage.fail_create_dir, true);
    let err = env
        .namespace
        .create_folder(
            &alice,
            CreateFolderRequest {
                parent_path: "/".to_string(),
                name: "docs".to_string(),
            },
        )
        .await
        .unwrap_err();
    env.fail(&env.storage.fail_create_dir, false);

    assert_eq!(err.kind, ErrorKind::Internal);
    assert!(env.names(&alice, "/").await.is_empty());
    env.mkdir(&alice, "/", "docs").await;
    assert_eq!(env.names(&alice, "/").await, ["docs"]);
}

#[tokio::test]
async fn test_failed_mkdir_removes_every_created_ancestor() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;

    env.fail(&env.storage.fail_create_dir, true);
    let err = env
        .namespace
        .create_folder_path(&alice, "/a/b/c")
        .await
        .unwrap_err();
    env.fail(&env.storage.fail_create_dir, false);

    assert_eq!(err.kind, ErrorKind::Internal);
    assert!(env.names(&alice, "/").await.is_empty());
}

#[tokio::test]
async fn test_failed_root_dir_removes_user() {
    let env = helpers::TestEnv::new().await;

    env.fail(&env.storage.fail_create_dir, true);
    let err = env
        .users
        .provision(ProvisionUserRequest {
            username: "alice".to_string(),
            quota_limit_bytes: Some(100),
            role: UserRole::User,
        })
        .await
        .unwrap_err();
    env.fail(&env.storage.fail_create_dir, false);

    assert_eq!(err.kind, ErrorKind::Internal);
    let err = env.users.context_for("alice").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthenticated);

    env.user("alice", 100).await;
    assert!(env.on_disk("alice"));
}

#[tokio::test]
async fn test_failed_directory_move_restores_paths() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;
    env.mkdir(&alice, "/", "docs").await;
    env.mkdir(&alice, "/", "archive").await;
    env.mkdir(&alice, "/docs", "sub").await;
    env.upload(&alice, "/docs/sub", "a.txt", b"a").await.unwrap();

    env.fail(&env.storage.fail_rename, true);
    let err = env
        .namespace
        .move_item(
            &alice,
            MoveItemRequest {
                source_path: "/docs".to_string(),
                destination_folder: "/archive".to_string(),
            },
        )
        .await
        .unwrap_err();
    env.fail(&env.storage.fail_rename, false);

    assert_eq!(err.kind, ErrorKind::Internal);
    assert_eq!(env.names(&alice, "/").await, ["docs", "archive"]);
    assert_eq!(env.names(&alice, "/docs/sub").await, ["a.txt"]);
    assert!(env.names(&alice, "/archive").await.is_empty());
}

#[tokio::test]
async fn test_failed_file_rename_restores_name() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;
    env.mkdir(&alice, "/", "docs").await;
    env.upload(&alice, "/", "a.txt", b"a").await.unwrap();

    env.fail(&env.storage.fail_rename, true);
    let err = env
        .namespace
        .move_item(
            &alice,
            MoveItemRequest {
                source_path: "/a.txt".to_string(),
                destination_folder: "/docs".to_string(),
            },
        )
        .await
        .unwrap_err();
    env.fail(&env.storage.fail_rename, false);

    assert_eq!(err.kind, ErrorKind::Internal);
    assert_eq!(env.names(&alice, "/").await, ["docs", "a.txt"]);
    assert!(env.names(&alice, "/docs").await.is_empty());
}

#[tokio::test]
async fn test_failed_unlink_still_purges_metadata() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;
    let file = env.upload(&alice, "/", "a.txt", &[2u8; 40]).await.unwrap();
    env.namespace
        .trash(&alice, &["/a.txt".to_string()])
        .await
        .unwrap();

    env.fail(&env.storage.fail_delete, true);
    let report = env
        .namespace
        .permanently_delete(&alice, "/a.txt")
        .await
        .unwrap();
    env.fail(&env.storage.fail_delete, false);

    assert_eq!(report.files_removed, 1);
    assert_eq!(report.orphans, [format!("alice/{}", file.id)]);
    assert_eq!(env.quota_used(&alice).await, 0);
    assert!(env.namespace.list_trash(&alice).await.unwrap().is_empty());
    assert!(env.on_disk(&format!("alice/{}", file.id)));
}

#[tokio::test]
async fn test_failed_directory_move_restores_trashed_descendants() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;
    env.mkdir(&alice, "/", "docs").await;
    env.mkdir(&alice, "/", "archive").await;
    env.mkdir(&alice, "/docs", "old").await;
    env.upload(&alice, "/docs/old", "a.txt", b"a").await.unwrap();
    env.namespace
        .trash(&alice, &["/docs/old".to_string()])
        .await
        .unwrap();

    env.fail(&env.storage.fail_rename, true);
    let err = env
        .namespace
        .move_item(
            &alice,
            MoveItemRequest {
                source_path: "/docs".to_string(),
                destination_folder: "/archive".to_string(),
            },
        )
        .await
        .unwrap_err();
    env.fail(&env.storage.fail_rename, false);
    assert_eq!(err.kind, ErrorKind::Internal);

    env.namespace
        .restore(&alice, &["/docs/old".to_string()])
        .await
        .unwrap();
    assert_eq!(env.names(&alice, "/docs").await, ["old"]);
    assert_eq!(env.names(&alice, "/docs/old").await, ["a.txt"]);
    assert!(env.names(&alice, "/archive").await.is_empty());
}
