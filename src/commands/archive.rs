//! Zip archive download command.

use std::path::PathBuf;

use clap::Args;

use cloudnest_core::config::AppConfig;
use cloudnest_core::error::AppError;

use crate::app::App;
use crate::output;

/// Arguments for the archive command
#[derive(Debug, Args)]
pub struct ArchiveArgs {
    /// Logical paths to include; `/` archives the whole tree
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Local file to write (defaults to the generated archive name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the archive command
pub async fn execute(
    args: &ArchiveArgs,
    config: &AppConfig,
    acting: Option<&str>,
) -> Result<(), AppError> {
    let app = App::build(config).await?;
    let ctx = app.act_as(acting).await?;

    let target = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(app.archives.archive_name(&args.paths)));
    let file = std::fs::File::create(&target)?;

    let (_, summary) = match app.archives.write_archive(&ctx, &args.paths, file).await {
        Ok(done) => done,
        Err(e) => {
            // Do not leave a truncated archive behind.
            if let Err(cleanup) = std::fs::remove_file(&target) {
                tracing::warn!(path = %target.display(), error = %cleanup, "Failed to remove partial archive");
            }
            return Err(e);
        }
    };

    output::print_kv("Files", &summary.files.to_string());
    output::print_kv("Folders", &summary.folders.to_string());
    output::print_kv("Size", &output::human_bytes(summary.bytes as i64));
    for skipped in &summary.skipped {
        output::print_warning(&format!("Skipped: {}", skipped));
    }
    output::print_success(&format!("Archive written to {}", target.display()));
    Ok(())
}
