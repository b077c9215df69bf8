//! Auto-share on create.

use tracing::debug;

use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::{ItemId, UserId};
use cloudnest_database::store::MetadataTx;
use cloudnest_entity::item::ItemStatus;
use cloudnest_entity::share::ShareGrant;

/// Copy the grants of the nearest shared ancestor of a new item onto it.
///
/// `parent_path` is the folder the item is created in; it and each of its
/// ancestors are checked nearest first. Returns the number of grants copied.
pub(crate) async fn inherit_grants(
    tx: &mut dyn MetadataTx,
    owner: UserId,
    parent_path: &str,
    item: ItemId,
) -> AppResult<usize> {
    for ancestor in path::ancestors(parent_path) {
        let Some((parent, name)) = path::split(&ancestor) else {
            continue;
        };
        let Some(folder) = tx
            .find_folder(owner, parent, name, ItemStatus::Active)
            .await?
        else {
            continue;
        };

        let grants = tx.list_grants(ItemId::Folder(folder.id)).await?;
        if grants.is_empty() {
            continue;
        }
        for grant in &grants {
            tx.upsert_grant(&ShareGrant {
                item,
                grantee_id: grant.grantee_id,
                permission: grant.permission,
            })
            .await?;
        }
        debug!(item = %item, from = %ancestor, grants = grants.len(), "Inherited share grants");
        return Ok(grants.len());
    }
    Ok(0)
}
