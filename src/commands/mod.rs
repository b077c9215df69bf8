//! CLI command definitions and dispatch.

pub mod archive;
pub mod fs;
pub mod migrate;
pub mod share;
pub mod shared;
pub mod trash;
pub mod user;

use clap::{Parser, Subcommand};

use cloudnest_core::config::AppConfig;
use cloudnest_core::error::AppError;

use crate::output::OutputFormat;

/// CloudNest: per-user file namespaces with trash, quota and sharing
#[derive(Debug, Parser)]
#[command(name = "cloudnest", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Act as this user
    #[arg(long = "as", value_name = "USERNAME", global = true)]
    pub acting_user: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// User provisioning and quota administration
    User(user::UserArgs),
    /// Browse and change your own tree
    Fs(fs::FsArgs),
    /// Trash, restore and permanent deletion
    Trash(trash::TrashArgs),
    /// Share grants on your items
    Share(share::ShareArgs),
    /// Work inside folders other users shared with you
    Shared(shared::SharedArgs),
    /// Download items as a zip archive
    Archive(archive::ArchiveArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let acting = self.acting_user.as_deref();
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::User(args) => user::execute(args, config, acting, self.format).await,
            Commands::Fs(args) => fs::execute(args, config, acting, self.format).await,
            Commands::Trash(args) => trash::execute(args, config, acting, self.format).await,
            Commands::Share(args) => share::execute(args, config, acting, self.format).await,
            Commands::Shared(args) => shared::execute(args, config, acting, self.format).await,
            Commands::Archive(args) => archive::execute(args, config, acting).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
        .map_err(|e| AppError::internal(format!("Failed to load config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acting_user_is_global() {
        let cli = Cli::try_parse_from(["cloudnest", "fs", "ls", "/docs", "--as", "alice"]).unwrap();
        assert_eq!(cli.acting_user.as_deref(), Some("alice"));
        assert!(matches!(
            cli.command,
            Commands::Fs(fs::FsArgs {
                command: fs::FsCommand::Ls { ref path }
            }) if path == "/docs"
        ));
    }

    #[test]
    fn test_trash_put_requires_paths() {
        assert!(Cli::try_parse_from(["cloudnest", "--as", "alice", "trash", "put"]).is_err());
    }

    #[test]
    fn test_share_grant_defaults_to_read() {
        let cli = Cli::try_parse_from([
            "cloudnest", "--as", "alice", "share", "grant", "folder:x", "bob",
        ])
        .unwrap();
        let Commands::Share(args) = cli.command else {
            panic!("expected share command");
        };
        assert!(matches!(
            args.command,
            share::ShareCommand::Grant { ref permission, .. } if permission == "read"
        ));
    }
}
