//! User provisioning and quota CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cloudnest_core::config::AppConfig;
use cloudnest_core::error::AppError;
use cloudnest_entity::user::{QuotaInfo, User, UserRole};
use cloudnest_service::request::ProvisionUserRequest;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user and their root directory
    Create {
        /// Username (also the name of the physical root directory)
        username: String,
        /// Quota limit in bytes (defaults to `quota.default_limit_bytes`)
        #[arg(short, long)]
        quota: Option<i64>,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
    /// Show a user's quota (yours unless you are an admin)
    Quota {
        /// Username; defaults to the acting user
        username: Option<String>,
    },
    /// Change a user's quota limit (admin only)
    SetQuota {
        /// Username
        username: String,
        /// New limit in bytes
        limit: i64,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    id: String,
    /// Username
    username: String,
    /// Role
    role: String,
    /// Quota limit
    limit: String,
    /// Quota used
    used: String,
    /// Created at
    created_at: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username.clone(),
            role: u.role.to_string(),
            limit: output::human_bytes(u.quota_limit_bytes),
            used: output::human_bytes(u.quota_used_bytes),
            created_at: u.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    acting: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let app = App::build(config).await?;

    match &args.command {
        UserCommand::Create {
            username,
            quota,
            admin,
        } => {
            let user = app
                .users
                .provision(ProvisionUserRequest {
                    username: username.clone(),
                    quota_limit_bytes: *quota,
                    role: if *admin { UserRole::Admin } else { UserRole::User },
                })
                .await?;
            output::print_list(&[UserRow::from(&user)], format);
            output::print_success(&format!("User '{}' created", user.username));
        }
        UserCommand::Quota { username } => {
            let ctx = app.act_as(acting).await?;
            let target = username.as_deref().unwrap_or(&ctx.username);
            let quota = app.users.quota_of(&ctx, target).await?;
            print_quota(target, &quota, format);
        }
        UserCommand::SetQuota { username, limit } => {
            let ctx = app.act_as(acting).await?;
            let user = app.users.set_quota_limit(&ctx, username, *limit).await?;
            output::print_success(&format!(
                "Quota of '{}' set to {}",
                user.username,
                output::human_bytes(user.quota_limit_bytes)
            ));
        }
    }

    Ok(())
}

pub fn print_quota(username: &str, quota: &QuotaInfo, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_item(quota, format),
        OutputFormat::Table => {
            println!("Quota for '{}':", username);
            output::print_kv("Limit", &output::human_bytes(quota.limit_bytes));
            output::print_kv("Used", &output::human_bytes(quota.used_bytes));
            output::print_kv("Available", &output::human_bytes(quota.available_bytes));
        }
    }
}
