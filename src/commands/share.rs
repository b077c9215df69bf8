//! Share grant CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cloudnest_core::config::AppConfig;
use cloudnest_core::error::AppError;
use cloudnest_core::types::ItemId;
use cloudnest_entity::share::{SharePermission, SharedItem};
use cloudnest_service::ShareOutcome;
use cloudnest_service::request::ShareRequest;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for share commands
#[derive(Debug, Args)]
pub struct ShareArgs {
    /// Share subcommand
    #[command(subcommand)]
    pub command: ShareCommand,
}

/// Share subcommands
#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Grant a user access to an item and everything under it
    Grant {
        /// Item ID, e.g. `folder:<uuid>` or `file:42`
        item: String,
        /// Grantee username
        grantee: String,
        /// Permission: read or write
        #[arg(short, long, default_value = "read")]
        permission: String,
    },
    /// Revoke a user's access to an item and everything under it
    Revoke {
        /// Item ID
        item: String,
        /// Grantee username
        grantee: String,
    },
    /// List grants on one of your items
    List {
        /// Item ID
        item: String,
    },
    /// List items other users shared with you
    Inbox,
}

/// Grant display row
#[derive(Debug, Serialize, Tabled)]
struct GrantRow {
    /// Item
    item: String,
    /// Grantee
    grantee: String,
    /// Permission
    permission: String,
}

/// Shared-with-me display row
#[derive(Debug, Serialize, Tabled)]
struct InboxRow {
    /// Item ID
    id: String,
    /// Name
    name: String,
    /// Owner
    owner: String,
    /// Owner's path
    path: String,
    /// Size
    size: String,
    /// Permission
    permission: String,
}

impl From<&SharedItem> for InboxRow {
    fn from(item: &SharedItem) -> Self {
        Self {
            id: item.item.to_string(),
            name: item.name.clone(),
            owner: item.owner_username.clone(),
            path: item.path.clone(),
            size: if item.is_dir {
                "-".to_string()
            } else {
                output::human_bytes(item.size_bytes)
            },
            permission: item.permission.to_string(),
        }
    }
}

/// Execute share commands
pub async fn execute(
    args: &ShareArgs,
    config: &AppConfig,
    acting: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let app = App::build(config).await?;
    let ctx = app.act_as(acting).await?;

    match &args.command {
        ShareCommand::Grant {
            item,
            grantee,
            permission,
        } => {
            let outcome = app
                .shares
                .share(
                    &ctx,
                    ShareRequest {
                        item: item.parse::<ItemId>()?,
                        grantee_username: grantee.clone(),
                        permission: permission.parse::<SharePermission>()?,
                    },
                )
                .await?;
            report(&outcome, &format!("Shared {} with '{}'", outcome.item, grantee), format);
        }
        ShareCommand::Revoke { item, grantee } => {
            let outcome = app
                .shares
                .unshare(&ctx, item.parse::<ItemId>()?, grantee)
                .await?;
            report(&outcome, &format!("Revoked '{}' on {}", grantee, outcome.item), format);
        }
        ShareCommand::List { item } => {
            let grants = app.shares.list_grants(&ctx, item.parse::<ItemId>()?).await?;
            let mut rows = Vec::with_capacity(grants.len());
            for grant in &grants {
                rows.push(GrantRow {
                    item: grant.item.to_string(),
                    grantee: grant.grantee_id.to_string(),
                    permission: grant.permission.to_string(),
                });
            }
            output::print_list(&rows, format);
        }
        ShareCommand::Inbox => {
            let items = app.shares.shared_with_me(&ctx).await?;
            match format {
                OutputFormat::Json => output::print_item(&items, format),
                OutputFormat::Table => {
                    let rows: Vec<InboxRow> = items.iter().map(InboxRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
    }

    Ok(())
}

fn report(outcome: &ShareOutcome, summary: &str, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_item(outcome, format);
        return;
    }
    output::print_success(summary);
    output::print_kv("Descendants updated", &outcome.propagated.to_string());
    if outcome.failed > 0 {
        output::print_warning(&format!(
            "{} descendant(s) could not be updated; re-run to retry",
            outcome.failed
        ));
    }
}
