//! Zip archive download of files and folder subtrees.

mod helpers;

use std::io::{Cursor, Read};

use cloudnest_core::error::ErrorKind;

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn entry_content(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut out = Vec::new();
    entry.read_to_end(&mut out).unwrap();
    out
}

#[tokio::test]
async fn test_folder_archive_is_relative_and_parent_first() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.mkdir(&alice, "/", "projects").await;
    env.mkdir(&alice, "/projects", "site").await;
    env.mkdir(&alice, "/projects/site", "css").await;
    env.upload(&alice, "/projects/site", "index.html", b"<html/>").await.unwrap();
    env.upload(&alice, "/projects/site/css", "main.css", b"body{}").await.unwrap();
    env.upload(&alice, "/projects", "notes.txt", b"todo").await.unwrap();

    let archive = env
        .archives
        .build(&alice, &["/projects/site".to_string()])
        .await
        .unwrap();

    assert_eq!(archive.file_name, "site.zip");
    assert_eq!(archive.content_type, "application/zip");
    assert_eq!(archive.content_disposition, "attachment; filename=\"site.zip\"");
    assert_eq!(
        entry_names(&archive.bytes),
        ["site/", "site/index.html", "site/css/", "site/css/main.css"]
    );
    assert_eq!(entry_content(&archive.bytes, "site/css/main.css"), b"body{}");
    assert_eq!(archive.summary.files, 2);
    assert_eq!(archive.summary.folders, 2);
    assert_eq!(archive.summary.bytes, 13);
    assert!(archive.summary.skipped.is_empty());
}

#[tokio::test]
async fn test_bulk_archive_uses_timestamped_name() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.upload(&alice, "/", "a.txt", b"a").await.unwrap();
    env.upload(&alice, "/", "b.txt", b"bb").await.unwrap();

    let archive = env
        .archives
        .build(&alice, &["/a.txt".to_string(), "/b.txt".to_string()])
        .await
        .unwrap();
    assert!(archive.file_name.ends_with(".zip"));
    assert_ne!(archive.file_name, "a.txt.zip");
    assert_eq!(entry_names(&archive.bytes), ["a.txt", "b.txt"]);
}

#[tokio::test]
async fn test_missing_paths_are_skipped_but_all_missing_fails() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.upload(&alice, "/", "a.txt", b"a").await.unwrap();

    let archive = env
        .archives
        .build(&alice, &["/a.txt".to_string(), "/gone.txt".to_string()])
        .await
        .unwrap();
    assert_eq!(entry_names(&archive.bytes), ["a.txt"]);
    assert_eq!(archive.summary.skipped, ["/gone.txt"]);

    let err = env
        .archives
        .build(&alice, &["/gone.txt".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unreadable_blob_is_left_out() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.mkdir(&alice, "/", "docs").await;
    env.upload(&alice, "/docs", "a.txt", b"a").await.unwrap();

    env.fail(&env.storage.fail_read, true);
    let archive = env
        .archives
        .build(&alice, &["/docs".to_string()])
        .await
        .unwrap();
    env.fail(&env.storage.fail_read, false);

    assert_eq!(entry_names(&archive.bytes), ["docs/"]);
    assert_eq!(archive.summary.skipped, ["docs/a.txt"]);
    assert_eq!(archive.summary.files, 0);
}

#[tokio::test]
async fn test_trashed_items_are_not_archived() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.mkdir(&alice, "/", "docs").await;
    env.upload(&alice, "/docs", "keep.txt", b"k").await.unwrap();
    env.upload(&alice, "/docs", "drop.txt", b"d").await.unwrap();
    env.namespace
        .trash(&alice, &["/docs/drop.txt".to_string()])
        .await
        .unwrap();

    let archive = env.archives.build(&alice, &["/".to_string()]).await.unwrap();
    assert_eq!(entry_names(&archive.bytes), ["docs/", "docs/keep.txt"]);
}

#[tokio::test]
async fn test_entry_failing_mid_stream_is_dropped_whole() {
    let env = helpers::TestEnv::new().await;
    let alice = env.user("alice", 10_000).await;
    env.mkdir(&alice, "/", "docs").await;
    env.upload(&alice, "/docs", "a.txt", b"partial content").await.unwrap();

    env.fail(&env.storage.fail_read_midway, true);
    let archive = env
        .archives
        .build(&alice, &["/docs".to_string()])
        .await
        .unwrap();
    env.fail(&env.storage.fail_read_midway, false);

    assert_eq!(entry_names(&archive.bytes), ["docs/"]);
    assert_eq!(archive.summary.skipped, ["docs/a.txt"]);
    assert_eq!(archive.summary.files, 0);
    assert_eq!(archive.summary.bytes, 0);
}
