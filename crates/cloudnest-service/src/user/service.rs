//! User provisioning, identity resolution and quota administration.

use std::sync::Arc;

use tracing::info;

use cloudnest_core::config::QuotaConfig;
use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::traits::StorageProvider;
use cloudnest_core::types::path;
use cloudnest_database::store::MetadataStore;
use cloudnest_entity::user::{CreateUser, QuotaInfo, User};
use cloudnest_storage::layout;

use crate::context::RequestContext;
use crate::request::{ProvisionUserRequest, validate_request};
use crate::saga::{Compensation, Saga};

/// Manages user accounts.
#[derive(Debug, Clone)]
pub struct UserService {
    /// Metadata store.
    store: Arc<dyn MetadataStore>,
    /// Physical store; every user gets a root directory.
    storage: Arc<dyn StorageProvider>,
    /// Quota defaults for new users.
    quota: QuotaConfig,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        storage: Arc<dyn StorageProvider>,
        quota: QuotaConfig,
    ) -> Self {
        Self {
            store,
            storage,
            quota,
        }
    }

    /// Create a user and their physical root directory.
    pub async fn provision(&self, req: ProvisionUserRequest) -> AppResult<User> {
        validate_request(&req)?;
        path::validate_username(&req.username)?;
        let root = layout::user_root(&req.username)?;
        let limit = req.quota_limit_bytes.unwrap_or(self.quota.default_limit_bytes);

        let mut saga = Saga::new("provision_user");
        let user = {
            let mut tx = self.store.begin().await?;
            if tx.find_user_by_username(&req.username).await?.is_some() {
                return Err(AppError::conflict(format!(
                    "Username '{}' already exists",
                    req.username
                )));
            }
            let user = tx
                .insert_user(&CreateUser {
                    username: req.username.clone(),
                    role: req.role,
                    quota_limit_bytes: limit,
                })
                .await?;
            saga.record(Compensation::RemoveUser { user_id: user.id });
            tx.commit().await?;
            user
        };

        if let Err(e) = self.storage.create_dir(&root).await {
            return Err(saga.abort(self.store.as_ref(), e).await);
        }

        info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            quota_limit = user.quota_limit_bytes,
            "User provisioned"
        );
        Ok(user)
    }

    /// Resolve the acting identity for `username`.
    pub async fn context_for(&self, username: &str) -> AppResult<RequestContext> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_authenticated(format!("Unknown user '{username}'")))?;
        Ok(RequestContext::from(&user))
    }

    /// Look up a user by name.
    pub async fn find_by_username(&self, username: &str) -> AppResult<User> {
        let mut tx = self.store.begin().await?;
        tx.find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))
    }

    /// Quota of `username`. Users may read their own; admins may read anyone's.
    pub async fn quota_of(&self, ctx: &RequestContext, username: &str) -> AppResult<QuotaInfo> {
        if !ctx.manages_quotas() && ctx.username != username {
            return Err(AppError::not_authorized("Cannot read another user's quota"));
        }
        Ok(self.find_by_username(username).await?.quota())
    }

    /// Change a user's quota limit. Admin only.
    pub async fn set_quota_limit(
        &self,
        ctx: &RequestContext,
        username: &str,
        limit_bytes: i64,
    ) -> AppResult<User> {
        if !ctx.manages_quotas() {
            return Err(AppError::not_authorized("Only administrators can change quotas"));
        }
        if limit_bytes < 0 {
            return Err(AppError::invalid_argument("Quota limit cannot be negative"));
        }

        let mut tx = self.store.begin().await?;
        let target = tx
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))?;
        let locked = tx.lock_user(target.id).await?;
        if limit_bytes < locked.quota_used_bytes {
            return Err(AppError::invalid_argument(format!(
                "Quota limit {limit_bytes} is below current usage of {} bytes",
                locked.quota_used_bytes
            )));
        }
        let updated = tx.set_quota_limit(target.id, limit_bytes).await?;
        tx.commit().await?;

        info!(
            admin_id = %ctx.user_id,
            user_id = %updated.id,
            quota_limit = limit_bytes,
            "Quota limit changed"
        );
        Ok(updated)
    }
}
