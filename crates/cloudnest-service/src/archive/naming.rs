//! Archive file names and the matching `Content-Disposition` value.

use chrono::{DateTime, Utc};

use cloudnest_core::types::path;

/// Name of the archive for `paths`.
///
/// A single item yields `<basename>.zip`; anything else yields
/// `<bulk_prefix>-<YYYY-MM-DD_HH-MM-SS>.zip`.
pub fn archive_name(paths: &[String], bulk_prefix: &str, now: DateTime<Utc>) -> String {
    if let [single] = paths {
        if let Ok(logical) = path::normalize(single) {
            if let Some((_, name)) = path::split(&logical) {
                return format!("{}.zip", sanitize(name));
            }
        }
    }
    format!("{bulk_prefix}-{}.zip", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// `attachment; filename="<name>"` with characters that would break the
/// quoted string replaced.
pub fn content_disposition(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", sanitize(file_name))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '"' | '\\') || c.is_control() { '_' } else { c })
        .collect()
}
