//! Compensating actions for the metadata-then-physical discipline.
//!
//! An operation records one [`Compensation`] per committed metadata change
//! that a later physical step depends on. If that physical step fails, the
//! saga is aborted: the steps are replayed in reverse order inside a single
//! fresh transaction and the caller receives an `Internal` error.

use tracing::{error, info, warn};

use cloudnest_core::error::{AppError, ErrorKind};
use cloudnest_core::result::AppResult;
use cloudnest_core::types::{FileId, FolderId, ItemId, UserId};
use cloudnest_database::store::{MetadataStore, MetadataTx};
use cloudnest_entity::file::File;
use cloudnest_entity::folder::Folder;

/// Where a row sat before an operation moved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub item: ItemId,
    pub parent_path: String,
    pub name: String,
}

impl Placement {
    pub fn of_file(file: &File) -> Self {
        Self {
            item: ItemId::File(file.id),
            parent_path: file.parent_path.clone(),
            name: file.name.clone(),
        }
    }

    pub fn of_folder(folder: &Folder) -> Self {
        Self {
            item: ItemId::Folder(folder.id),
            parent_path: folder.parent_path.clone(),
            name: folder.name.clone(),
        }
    }
}

/// One reversible metadata change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Delete a file row inserted by the operation and give its bytes back
    /// to the owner's quota.
    RemoveFile {
        owner_id: UserId,
        file_id: FileId,
        size_bytes: i64,
    },
    /// Delete a folder row inserted by the operation.
    RemoveFolder { folder_id: FolderId },
    /// Put exactly these rows back where they were. Rows are addressed by
    /// ID, so anything else that shares the new location is left alone.
    PutBack { placements: Vec<Placement> },
    /// Delete a freshly provisioned user.
    RemoveUser { user_id: UserId },
}

impl Compensation {
    async fn apply(&self, tx: &mut dyn MetadataTx) -> AppResult<()> {
        match self {
            Self::RemoveFile {
                owner_id,
                file_id,
                size_bytes,
            } => {
                tx.delete_grants_for(ItemId::File(*file_id)).await?;
                if tx.delete_file(*file_id).await? {
                    tx.adjust_quota_used(*owner_id, -size_bytes).await?;
                }
            }
            Self::RemoveFolder { folder_id } => {
                tx.delete_grants_for(ItemId::Folder(*folder_id)).await?;
                tx.delete_folder(*folder_id).await?;
            }
            Self::PutBack { placements } => {
                for placement in placements {
                    match placement.item {
                        ItemId::File(id) => {
                            tx.relocate_file(id, &placement.parent_path, &placement.name)
                                .await?
                        }
                        ItemId::Folder(id) => {
                            tx.relocate_folder(id, &placement.parent_path, &placement.name)
                                .await?
                        }
                    }
                }
            }
            Self::RemoveUser { user_id } => {
                tx.delete_user(*user_id).await?;
            }
        }
        Ok(())
    }
}

/// Ordered list of compensations for one operation.
#[derive(Debug)]
pub struct Saga {
    operation: &'static str,
    steps: Vec<Compensation>,
}

impl Saga {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            steps: Vec::new(),
        }
    }

    /// Record a compensation for a metadata change that is about to commit.
    pub fn record(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    /// Apply every recorded compensation, newest first, in one transaction.
    pub async fn compensate(self, store: &dyn MetadataStore) -> AppResult<usize> {
        let mut tx = store.begin().await?;
        for step in self.steps.iter().rev() {
            step.apply(tx.as_mut()).await?;
        }
        tx.commit().await?;
        Ok(self.steps.len())
    }

    /// Compensate after a physical failure and build the error to return.
    ///
    /// The returned error is always `Internal` and carries `cause` as its source.
    pub async fn abort(self, store: &dyn MetadataStore, cause: AppError) -> AppError {
        let operation = self.operation;
        warn!(
            operation,
            error = %cause,
            steps = self.steps.len(),
            "Physical step failed after commit, compensating"
        );

        match self.compensate(store).await {
            Ok(applied) => info!(operation, applied, "Compensation applied"),
            Err(e) => error!(
                operation,
                error = %e,
                "Compensation failed, metadata may reference missing bytes"
            ),
        }

        let message = format!("{operation} failed: {}", cause.message);
        AppError::with_source(ErrorKind::Internal, message, cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudnest_database::MemoryMetadataStore;
    use cloudnest_entity::file::NewFile;
    use cloudnest_entity::user::{CreateUser, UserRole};

    #[tokio::test]
    async fn test_abort_removes_file_and_returns_quota() {
        let store = MemoryMetadataStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx
            .insert_user(&CreateUser {
                username: "alice".to_string(),
                role: UserRole::User,
                quota_limit_bytes: 1000,
            })
            .await
            .unwrap();
        let file = tx
            .insert_file(&NewFile {
                owner_id: user.id,
                name: "a.txt".to_string(),
                mime_type: "text/plain".to_string(),
                size_bytes: 600,
                parent_path: "/".to_string(),
            })
            .await
            .unwrap();
        tx.adjust_quota_used(user.id, 600).await.unwrap();
        tx.commit().await.unwrap();

        let mut saga = Saga::new("finalize_upload");
        saga.record(Compensation::RemoveFile {
            owner_id: user.id,
            file_id: file.id,
            size_bytes: 600,
        });
        let err = saga
            .abort(&store, AppError::internal("disk full"))
            .await;
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.contains("disk full"));

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_file_by_id(file.id).await.unwrap().is_none());
        assert_eq!(tx.find_user(user.id).await.unwrap().unwrap().quota_used_bytes, 0);
    }

    #[tokio::test]
    async fn test_put_back_moves_only_recorded_rows() {
        use cloudnest_entity::folder::NewFolder;
        use cloudnest_entity::item::ItemStatus;

        let store = MemoryMetadataStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx
            .insert_user(&CreateUser {
                username: "bob".to_string(),
                role: UserRole::User,
                quota_limit_bytes: 10,
            })
            .await
            .unwrap();
        let docs = tx
            .insert_folder(&NewFolder {
                owner_id: user.id,
                name: "docs".to_string(),
                parent_path: "/".to_string(),
            })
            .await
            .unwrap();
        let sub = tx
            .insert_folder(&NewFolder {
                owner_id: user.id,
                name: "sub".to_string(),
                parent_path: "/docs".to_string(),
            })
            .await
            .unwrap();
        // Already under the target prefix before the move; must stay there.
        let resident = tx
            .insert_folder(&NewFolder {
                owner_id: user.id,
                name: "resident".to_string(),
                parent_path: "/old/docs".to_string(),
            })
            .await
            .unwrap();
        let placements = vec![Placement::of_folder(&docs), Placement::of_folder(&sub)];
        tx.relocate_folder(docs.id, "/old", "docs").await.unwrap();
        tx.relocate_folder(sub.id, "/old/docs", "sub").await.unwrap();
        tx.commit().await.unwrap();

        let mut saga = Saga::new("move_item");
        saga.record(Compensation::PutBack { placements });
        assert_eq!(saga.compensate(&store).await.unwrap(), 1);

        let mut tx = store.begin().await.unwrap();
        let moved = tx.find_folder_by_id(docs.id).await.unwrap().unwrap();
        assert_eq!(moved.full_path(), "/docs");
        assert!(
            tx.find_folder(user.id, "/docs", "sub", ItemStatus::Active)
                .await
                .unwrap()
                .is_some()
        );
        let resident = tx.find_folder_by_id(resident.id).await.unwrap().unwrap();
        assert_eq!(resident.parent_path, "/old/docs");
    }
}
