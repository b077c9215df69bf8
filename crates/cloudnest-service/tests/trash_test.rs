//! Trash, restore and permanent deletion.

mod helpers;

use cloudnest_core::error::ErrorKind;
use cloudnest_core::types::ItemId;
use cloudnest_database::store::{MetadataStore, MetadataTx};
use cloudnest_entity::folder::NewFolder;
use cloudnest_entity::item::ItemStatus;
use cloudnest_service::request::CreateFolderRequest;

fn paths(items: &[&str]) -> Vec<String> {
    items.iter().map(|p| p.to_string()).collect()
}

#[tokio::test]
async fn test_restore_undoes_trash() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.mkdir(&alice, "/", "docs").await;
    env.upload(&alice, "/docs", "a.txt", b"a").await.unwrap();
    env.upload(&alice, "/", "b.txt", b"b").await.unwrap();
    let before = env.namespace.list(&alice, "/").await.unwrap();

    let trashed = env
        .namespace
        .trash(&alice, &paths(&["/docs", "/b.txt"]))
        .await
        .unwrap();
    assert_eq!(trashed, 2);
    assert!(env.names(&alice, "/").await.is_empty());
    assert!(env.namespace.list(&alice, "/docs").await.is_err());

    let trash: Vec<_> = env
        .namespace
        .list_trash(&alice)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.path)
        .collect();
    assert_eq!(trash, ["/docs", "/b.txt"]);

    let restored = env
        .namespace
        .restore(&alice, &paths(&["/docs", "/b.txt"]))
        .await
        .unwrap();
    assert_eq!(restored, 2);
    assert_eq!(env.namespace.list(&alice, "/").await.unwrap(), before);
    assert_eq!(env.names(&alice, "/docs").await, ["a.txt"]);
}

#[tokio::test]
async fn test_trash_batch_is_all_or_nothing() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.upload(&alice, "/", "a.txt", b"a").await.unwrap();

    let err = env
        .namespace
        .trash(&alice, &paths(&["/a.txt", "/missing.txt"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(env.names(&alice, "/").await, ["a.txt"]);
}

#[tokio::test]
async fn test_restore_onto_active_sibling_is_conflict() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.upload(&alice, "/", "a.txt", b"old").await.unwrap();
    env.namespace
        .trash(&alice, &paths(&["/a.txt"]))
        .await
        .unwrap();
    env.upload(&alice, "/", "a.txt", b"new").await.unwrap();

    let err = env
        .namespace
        .restore(&alice, &paths(&["/a.txt"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = env
        .namespace
        .restore(&alice, &paths(&["/never.txt"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_purge_folder_frees_whole_subtree() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.mkdir(&alice, "/", "docs").await;
    env.mkdir(&alice, "/docs", "sub").await;
    let top = env.upload(&alice, "/docs", "a.bin", &[1u8; 100]).await.unwrap();
    env.upload(&alice, "/docs/sub", "b.bin", &[1u8; 250]).await.unwrap();
    env.upload(&alice, "/", "keep.bin", &[1u8; 50]).await.unwrap();
    assert_eq!(env.quota_used(&alice).await, 400);

    env.namespace
        .trash(&alice, &paths(&["/docs"]))
        .await
        .unwrap();
    let report = env
        .namespace
        .permanently_delete(&alice, "/docs")
        .await
        .unwrap();

    assert_eq!(report.files_removed, 2);
    assert_eq!(report.folders_removed, 2);
    assert_eq!(report.bytes_freed, 350);
    assert!(report.orphans.is_empty());
    assert_eq!(env.quota_used(&alice).await, 50);
    assert!(!env.on_disk("alice/docs"));
    assert!(!env.on_disk(&format!("alice/docs/{}", top.id)));
    assert!(env.namespace.list_trash(&alice).await.unwrap().is_empty());

    let err = env
        .namespace
        .permanently_delete(&alice, "/docs")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_purging_an_active_item_is_conflict() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.upload(&alice, "/", "a.txt", b"a").await.unwrap();

    let err = env
        .namespace
        .permanently_delete(&alice, "/a.txt")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(env.quota_used(&alice).await, 1);
}

#[tokio::test]
async fn test_trash_by_ids_rejects_foreign_items() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    let bob = env.user("bob", 10_000).await;
    let file = env.upload(&alice, "/", "a.txt", b"a").await.unwrap();
    let folder = env.mkdir(&alice, "/", "docs").await;

    let err = env
        .namespace
        .trash_by_ids(&bob, &[ItemId::File(file.id)])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let count = env
        .namespace
        .trash_by_ids(
            &alice,
            &[
                ItemId::File(file.id),
                ItemId::Folder(folder.id),
                ItemId::File(file.id),
            ],
        )
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert!(env.names(&alice, "/").await.is_empty());
}

#[tokio::test]
async fn test_trashed_folder_keeps_its_path() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.mkdir(&alice, "/", "docs").await;
    env.upload(&alice, "/docs", "t.txt", b"t").await.unwrap();
    env.namespace
        .trash(&alice, &paths(&["/docs"]))
        .await
        .unwrap();

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
    assert_eq!(err.kind, ErrorKind::Conflict);
    let err = env
        .namespace
        .create_folder_path(&alice, "/docs/new")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(env.names(&alice, "/").await.is_empty());

    env.namespace
        .restore(&alice, &paths(&["/docs"]))
        .await
        .unwrap();
    assert_eq!(env.names(&alice, "/docs").await, ["t.txt"]);
}

#[tokio::test]
async fn test_purge_refuses_path_shared_by_two_folders() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.mkdir(&alice, "/", "docs").await;
    let file = env.upload(&alice, "/docs", "a.bin", &[1u8; 100]).await.unwrap();
    env.namespace
        .trash(&alice, &paths(&["/docs"]))
        .await
        .unwrap();

    // A second trashed row at the same location, written below the engine.
    let mut tx = env.store.begin().await.unwrap();
    let twin = tx
        .insert_folder(&NewFolder {
            owner_id: alice.user_id,
            name: "docs".to_string(),
            parent_path: "/".to_string(),
        })
        .await
        .unwrap();
    tx.set_folder_status(twin.id, ItemStatus::Trashed)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let err = env
        .namespace
        .permanently_delete(&alice, "/docs")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(env.quota_used(&alice).await, 100);
    assert!(env.on_disk(&format!("alice/docs/{}", file.id)));
}
