//! Shared test helpers for namespace engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tempfile::TempDir;

use cloudnest_core::config::{ArchiveConfig, QuotaConfig};
use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::traits::{BlobStat, ByteStream, StorageProvider};
use cloudnest_database::store::MetadataStore;
use cloudnest_database::MemoryMetadataStore;
use cloudnest_entity::file::File;
use cloudnest_entity::folder::Folder;
use cloudnest_entity::user::UserRole;
use cloudnest_service::request::{CreateFolderRequest, FinalizeUploadRequest, ProvisionUserRequest};
use cloudnest_service::{
    ArchiveService, NamespaceService, RequestContext, ShareService, SharedSpaceService,
    UserService,
};
use cloudnest_storage::{LocalStorageProvider, StagingArea};

pub const STAGING_DIR: &str = "_staging";

/// Local storage with switchable failures for compensation tests.
#[derive(Debug)]
pub struct FaultyStorage {
    inner: LocalStorageProvider,
    pub fail_rename: AtomicBool,
    pub fail_create_dir: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_read: AtomicBool,
    /// Serve the first chunk of a blob, then fail the stream.
    pub fail_read_midway: AtomicBool,
}

impl FaultyStorage {
    fn new(inner: LocalStorageProvider) -> Self {
        Self {
            inner,
            fail_rename: AtomicBool::new(false),
            fail_create_dir: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_read: AtomicBool::new(false),
            fail_read_midway: AtomicBool::new(false),
        }
    }

    fn injected(flag: &AtomicBool, what: &str) -> AppResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(AppError::internal(format!("injected {what} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageProvider for FaultyStorage {
    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        Self::injected(&self.fail_read, "read")?;
        let mut stream = self.inner.read(path).await?;
        if !self.fail_read_midway.load(Ordering::SeqCst) {
            return Ok(stream);
        }
        let first = stream.next().await.unwrap_or_else(|| Ok(Bytes::new()));
        let chunks = vec![first, Err(std::io::Error::other("injected mid-stream failure"))];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        Self::injected(&self.fail_read, "read")?;
        self.inner.read_bytes(path).await
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.inner.write(path, data).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        Self::injected(&self.fail_delete, "delete")?;
        self.inner.delete(path).await
    }

    async fn delete_dir(&self, path: &str) -> AppResult<()> {
        Self::injected(&self.fail_delete, "delete")?;
        self.inner.delete_dir(path).await
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        Self::injected(&self.fail_rename, "rename")?;
        self.inner.rename(from, to).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn stat(&self, path: &str) -> AppResult<BlobStat> {
        self.inner.stat(path).await
    }

    async fn create_dir(&self, path: &str) -> AppResult<()> {
        Self::injected(&self.fail_create_dir, "create_dir")?;
        self.inner.create_dir(path).await
    }
}

/// Test environment: memory metadata store plus a temporary data root.
pub struct TestEnv {
    pub dir: TempDir,
    pub store: Arc<dyn MetadataStore>,
    pub storage: Arc<FaultyStorage>,
    pub staging: StagingArea,
    pub namespace: Arc<NamespaceService>,
    pub shares: ShareService,
    pub shared: SharedSpaceService,
    pub archives: ArchiveService,
    pub users: UserService,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStorageProvider::new(dir.path()).await.unwrap();
        let storage = Arc::new(FaultyStorage::new(local));
        let provider: Arc<dyn StorageProvider> = storage.clone();
        let store: Arc<dyn MetadataStore> = Arc::new(MemoryMetadataStore::new());
        let staging = StagingArea::new(provider.clone(), STAGING_DIR);

        let namespace = Arc::new(NamespaceService::new(
            store.clone(),
            provider.clone(),
            staging.clone(),
        ));
        Self {
            shares: ShareService::new(store.clone()),
            shared: SharedSpaceService::new(store.clone(), namespace.clone()),
            archives: ArchiveService::new(store.clone(), provider.clone(), ArchiveConfig::default()),
            users: UserService::new(store.clone(), provider, QuotaConfig::default()),
            dir,
            store,
            storage,
            staging,
            namespace,
        }
    }

    /// Provision a user and return their context.
    pub async fn user(&self, username: &str, quota_limit_bytes: i64) -> RequestContext {
        self.users
            .provision(ProvisionUserRequest {
                username: username.to_string(),
                quota_limit_bytes: Some(quota_limit_bytes),
                role: UserRole::User,
            })
            .await
            .unwrap();
        self.users.context_for(username).await.unwrap()
    }

    /// Deposit bytes in the staging area the way the upload collaborator does.
    pub async fn stage(&self, staging_id: &str, filename: &str, data: &[u8]) {
        self.staging
            .deposit(staging_id, Bytes::copy_from_slice(data), filename, None)
            .await
            .unwrap();
    }

    /// Stage and finalize an upload in one step.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        destination: &str,
        filename: &str,
        data: &[u8],
    ) -> AppResult<File> {
        let staging_id = format!("up-{}-{}", ctx.username, staging_suffix(filename, destination));
        self.stage(&staging_id, filename, data).await;
        self.namespace
            .finalize_upload(
                ctx,
                FinalizeUploadRequest {
                    staging_id,
                    destination_path: destination.to_string(),
                },
            )
            .await
    }

    pub async fn mkdir(&self, ctx: &RequestContext, parent: &str, name: &str) -> Folder {
        self.namespace
            .create_folder(
                ctx,
                CreateFolderRequest {
                    parent_path: parent.to_string(),
                    name: name.to_string(),
                },
            )
            .await
            .unwrap()
    }

    pub async fn quota_used(&self, ctx: &RequestContext) -> i64 {
        self.namespace.quota(ctx).await.unwrap().used_bytes
    }

    /// Names of the active entries directly under `path`.
    pub async fn names(&self, ctx: &RequestContext, path: &str) -> Vec<String> {
        self.namespace
            .list(ctx, path)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.name)
            .collect()
    }

    /// Whether a provider-relative path exists under the data root.
    pub fn on_disk(&self, relative: &str) -> bool {
        self.dir.path().join(relative).exists()
    }

    pub fn fail(&self, flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }
}

/// Staging ids may only hold `[A-Za-z0-9_+-]`.
fn staging_suffix(filename: &str, destination: &str) -> String {
    format!("{filename}{destination}")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
