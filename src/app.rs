//! Service wiring shared by every command.

use std::sync::Arc;

use tracing::debug;

use cloudnest_core::config::AppConfig;
use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::traits::StorageProvider;
use cloudnest_database::{MetadataStore, open_store};
use cloudnest_service::{
    ArchiveService, NamespaceService, RequestContext, ShareService, SharedSpaceService,
    UserService,
};
use cloudnest_storage::{LocalStorageProvider, StagingArea};

/// Metadata store, physical store and the services built on them.
#[derive(Debug, Clone)]
pub struct App {
    pub store: Arc<dyn MetadataStore>,
    pub storage: Arc<dyn StorageProvider>,
    pub staging: StagingArea,
    pub namespace: Arc<NamespaceService>,
    pub shares: ShareService,
    pub shared: SharedSpaceService,
    pub archives: ArchiveService,
    pub users: UserService,
}

impl App {
    pub async fn build(config: &AppConfig) -> AppResult<Self> {
        let store = open_store(config).await?;
        let storage: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::new(&config.storage.data_root).await?);
        let staging = StagingArea::new(storage.clone(), config.storage.staging_dir.clone());
        debug!(
            backend = store.backend(),
            data_root = %config.storage.data_root,
            staging_dir = %config.storage.staging_dir,
            "Services wired"
        );

        let namespace = Arc::new(NamespaceService::new(
            store.clone(),
            storage.clone(),
            staging.clone(),
        ));
        Ok(Self {
            shares: ShareService::new(store.clone()),
            shared: SharedSpaceService::new(store.clone(), namespace.clone()),
            archives: ArchiveService::new(store.clone(), storage.clone(), config.archive.clone()),
            users: UserService::new(store.clone(), storage.clone(), config.quota.clone()),
            store,
            storage,
            staging,
            namespace,
        })
    }

    /// Resolve the `--as` identity.
    pub async fn act_as(&self, username: Option<&str>) -> AppResult<RequestContext> {
        let username = username.ok_or_else(|| {
            AppError::not_authenticated("This command needs an acting user; pass --as <username>")
        })?;
        self.users.context_for(username).await
    }
}
