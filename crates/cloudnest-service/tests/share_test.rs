//! Share grants, propagation and grantee access to shared folders.

mod helpers;

use cloudnest_core::error::ErrorKind;
use cloudnest_core::types::ItemId;
use cloudnest_entity::share::SharePermission;
use cloudnest_service::RequestContext;
use cloudnest_service::request::ShareRequest;

fn share_req(item: ItemId, grantee: &str, permission: SharePermission) -> ShareRequest {
    ShareRequest {
        item,
        grantee_username: grantee.to_string(),
        permission,
    }
}

fn shared_names(items: &[cloudnest_entity::share::SharedItem]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

#[tokio::test]
async fn test_new_upload_inherits_folder_share() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    let bob = env.user("bob", 10_000).await;

    let docs = env.mkdir(&alice, "/", "docs").await;
    env.shares
        .share(
            &alice,
            share_req(ItemId::Folder(docs.id), "bob", SharePermission::Read),
        )
        .await
        .unwrap();
    let pdf = env.upload(&alice, "/docs", "x.pdf", b"%PDF-1.7").await.unwrap();

    let shared = env.shares.shared_with_me(&bob).await.unwrap();
    assert_eq!(shared_names(&shared), ["docs", "x.pdf"]);
    let entry = shared.iter().find(|i| i.name == "x.pdf").unwrap();
    assert_eq!(entry.item, ItemId::File(pdf.id));
    assert_eq!(entry.permission, SharePermission::Read);
    assert_eq!(entry.owner_username, "alice");
}

#[tokio::test]
async fn test_share_propagates_to_existing_active_descendants() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    let bob = env.user("bob", 10_000).await;

    let docs = env.mkdir(&alice, "/", "docs").await;
    env.mkdir(&alice, "/docs", "sub").await;
    env.upload(&alice, "/docs", "a.txt", b"a").await.unwrap();
    env.upload(&alice, "/docs/sub", "b.txt", b"b").await.unwrap();
    env.upload(&alice, "/docs/sub", "old.txt", b"o").await.unwrap();
    env.namespace
        .trash(&alice, &["/docs/sub/old.txt".to_string()])
        .await
        .unwrap();

    let outcome = env
        .shares
        .share(
            &alice,
            share_req(ItemId::Folder(docs.id), "bob", SharePermission::Write),
        )
        .await
        .unwrap();
    assert_eq!(outcome.propagated, 3);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.permission, Some(SharePermission::Write));

    let shared = env.shares.shared_with_me(&bob).await.unwrap();
    assert_eq!(shared.len(), 4);
    assert!(shared.iter().all(|i| i.permission == SharePermission::Write));

    // Re-sharing replaces the permission everywhere.
    env.shares
        .share(
            &alice,
            share_req(ItemId::Folder(docs.id), "bob", SharePermission::Read),
        )
        .await
        .unwrap();
    let shared = env.shares.shared_with_me(&bob).await.unwrap();
    assert!(shared.iter().all(|i| i.permission == SharePermission::Read));
}

#[tokio::test]
async fn test_unshare_revokes_descendants() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    let bob = env.user("bob", 10_000).await;

    let docs = env.mkdir(&alice, "/", "docs").await;
    env.upload(&alice, "/docs", "a.txt", b"a").await.unwrap();
    env.shares
        .share(
            &alice,
            share_req(ItemId::Folder(docs.id), "bob", SharePermission::Read),
        )
        .await
        .unwrap();

    let outcome = env
        .shares
        .unshare(&alice, ItemId::Folder(docs.id), "bob")
        .await
        .unwrap();
    assert_eq!(outcome.permission, None);
    assert_eq!(outcome.propagated, 1);
    assert!(env.shares.shared_with_me(&bob).await.unwrap().is_empty());

    let err = env
        .shared
        .list_folder(&bob, docs.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);
}

#[tokio::test]
async fn test_share_validation() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    let bob = env.user("bob", 10_000).await;
    let docs = env.mkdir(&alice, "/", "docs").await;
    let item = ItemId::Folder(docs.id);

    let err = env
        .shares
        .share(&alice, share_req(item, "alice", SharePermission::Read))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);

    let err = env
        .shares
        .share(&alice, share_req(item, "nobody", SharePermission::Read))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = env
        .shares
        .share(&bob, share_req(item, "alice", SharePermission::Read))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);

    let err = env.shares.list_grants(&bob, item).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);

    env.namespace
        .trash(&alice, &["/docs".to_string()])
        .await
        .unwrap();
    let err = env
        .shares
        .share(&alice, share_req(item, "bob", SharePermission::Read))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_grantee_upload_charges_owner() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    let bob = env.user("bob", 10_000).await;

    let inbox = env.mkdir(&alice, "/", "inbox").await;
    env.shares
        .share(
            &alice,
            share_req(ItemId::Folder(inbox.id), "bob", SharePermission::Write),
        )
        .await
        .unwrap();

    env.stage("bob-report", "report.csv", &[b'x'; 42]).await;
    let file = env.shared.upload(&bob, inbox.id, "bob-report").await.unwrap();
    assert_eq!(file.owner_id, alice.user_id);
    assert_eq!(file.parent_path, "/inbox");
    assert_eq!(env.quota_used(&alice).await, 42);
    assert_eq!(env.quota_used(&bob).await, 0);
    assert!(env.on_disk(&format!("alice/inbox/{}", file.id)));

    // The new file picked up bob's grant, so bob sees it in the folder.
    let listing = env.shared.list_folder(&bob, inbox.id).await.unwrap();
    let names: Vec<_> = listing.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["report.csv"]);

    let sub = env.shared.create_folder(&bob, inbox.id, "q3").await.unwrap();
    assert_eq!(sub.owner_id, alice.user_id);
    assert_eq!(env.names(&alice, "/inbox").await, ["q3", "report.csv"]);
}

#[tokio::test]
async fn test_read_grant_cannot_write() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    let bob = env.user("bob", 10_000).await;
    let carol = env.user("carol", 10_000).await;

    let docs = env.mkdir(&alice, "/", "docs").await;
    let file = env.upload(&alice, "/docs", "a.txt", b"secret").await.unwrap();
    env.shares
        .share(
            &alice,
            share_req(ItemId::Folder(docs.id), "bob", SharePermission::Read),
        )
        .await
        .unwrap();

    env.stage("bob-up", "b.txt", b"b").await;
    let err = env.shared.upload(&bob, docs.id, "bob-up").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);

    let err = env
        .shared
        .trash(&bob, ItemId::File(file.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);

    let download = env.shared.open_file(&bob, file.id).await.unwrap();
    assert_eq!(download.file.size_bytes, 6);

    let err = env.shared.open_file(&carol, file.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);
}

#[tokio::test]
async fn test_write_grantee_can_trash_shared_item() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    let bob = env.user("bob", 10_000).await;

    let docs = env.mkdir(&alice, "/", "docs").await;
    let file = env.upload(&alice, "/docs", "a.txt", b"a").await.unwrap();
    env.shares
        .share(
            &alice,
            share_req(ItemId::Folder(docs.id), "bob", SharePermission::Write),
        )
        .await
        .unwrap();

    let count = env.shared.trash(&bob, ItemId::File(file.id)).await.unwrap();
    assert_eq!(count, 1);
    assert!(env.names(&alice, "/docs").await.is_empty());
    // Trashed items drop out of the grantee's view.
    assert_eq!(
        shared_names(&env.shares.shared_with_me(&bob).await.unwrap()),
        ["docs"]
    );
}

#[tokio::test]
async fn test_owner_sees_all_children_through_shared_space() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    let docs = env.mkdir(&alice, "/", "docs").await;
    env.upload(&alice, "/docs", "a.txt", b"a").await.unwrap();

    let owner = RequestContext::new(alice.user_id, "alice", alice.role);
    let listing = env.shared.list_folder(&owner, docs.id).await.unwrap();
    assert_eq!(listing.len(), 1);
}
