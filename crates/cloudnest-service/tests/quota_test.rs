//! Quota accounting across upload, trash, restore and purge.

mod helpers;

use cloudnest_core::error::ErrorKind;
use cloudnest_entity::user::UserRole;
use cloudnest_service::RequestContext;

#[tokio::test]
async fn test_quota_follows_upload_and_purge() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;

    env.upload(&alice, "/", "a.txt", &[7u8; 600]).await.unwrap();
    assert_eq!(env.quota_used(&alice).await, 600);

    let err = env
        .upload(&alice, "/", "b.txt", &[7u8; 500])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::QuotaExceeded);
    assert_eq!(env.names(&alice, "/").await, ["a.txt"]);

    // Trashing does not release quota; only a purge does.
    env.namespace
        .trash(&alice, &["/a.txt".to_string()])
        .await
        .unwrap();
    assert_eq!(env.quota_used(&alice).await, 600);

    let report = env
        .namespace
        .permanently_delete(&alice, "/a.txt")
        .await
        .unwrap();
    assert_eq!(report.bytes_freed, 600);
    assert_eq!(env.quota_used(&alice).await, 0);

    env.upload(&alice, "/", "b.txt", &[7u8; 500]).await.unwrap();
    assert_eq!(env.quota_used(&alice).await, 500);
}

#[tokio::test]
async fn test_upload_exactly_filling_quota_is_allowed() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 100).await;

    env.upload(&alice, "/", "full.bin", &[0u8; 100]).await.unwrap();
    let quota = env.namespace.quota(&alice).await.unwrap();
    assert_eq!(quota.used_bytes, 100);
    assert_eq!(quota.available_bytes, 0);

    let err = env.upload(&alice, "/", "one.bin", &[0u8; 1]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::QuotaExceeded);
}

#[tokio::test]
async fn test_duplicate_upload_name_is_conflict_and_not_charged() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;

    env.upload(&alice, "/", "a.txt", b"first").await.unwrap();
    env.stage("dup", "a.txt", b"second").await;
    let err = env
        .namespace
        .finalize_upload(
            &alice,
            cloudnest_service::request::FinalizeUploadRequest {
                staging_id: "dup".to_string(),
                destination_path: "/".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(env.quota_used(&alice).await, 5);
}

#[tokio::test]
async fn test_set_quota_limit_rules() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 1000).await;
    env.upload(&alice, "/", "a.txt", &[1u8; 300]).await.unwrap();

    let err = env
        .users
        .set_quota_limit(&alice, "alice", 5000)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);

    let admin_user = env
        .users
        .provision(cloudnest_service::request::ProvisionUserRequest {
            username: "root".to_string(),
            quota_limit_bytes: None,
            role: UserRole::Admin,
        })
        .await
        .unwrap();
    let admin = RequestContext::from(&admin_user);

    let err = env
        .users
        .set_quota_limit(&admin, "alice", 200)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);

    let updated = env.users.set_quota_limit(&admin, "alice", 300).await.unwrap();
    assert_eq!(updated.quota_limit_bytes, 300);
    assert_eq!(env.namespace.quota(&alice).await.unwrap().available_bytes, 0);

    let quota = env.users.quota_of(&admin, "alice").await.unwrap();
    assert_eq!(quota.used_bytes, 300);
    let err = env.users.quota_of(&alice, "root").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);
}

#[tokio::test]
async fn test_unknown_user_is_not_authenticated() {
    let env = helpers::TestEnv::new().await;
    let err = env.users.context_for("ghost").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthenticated);

    let err = env
        .users
        .provision(cloudnest_service::request::ProvisionUserRequest {
            username: "bad/name".to_string(),
            quota_limit_bytes: Some(10),
            role: UserRole::User,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let env = helpers::TestEnv::new().await;
    env.user("alice", 10).await;
    let err = env
        .users
        .provision(cloudnest_service::request::ProvisionUserRequest {
            username: "alice".to_string(),
            quota_limit_bytes: Some(10),
            role: UserRole::User,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}
