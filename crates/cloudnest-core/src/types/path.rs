//! Logical path helpers.
//!
//! A logical path is a `/`-rooted, `/`-separated string without a trailing
//! slash (the root is `"/"`). Prefix relations are segment-aware: `/docs2`
//! is not under `/docs`.

use crate::error::AppError;
use crate::result::AppResult;

/// The root of every user's tree.
pub const ROOT: &str = "/";

/// Normalize a caller-supplied path into canonical logical form.
///
/// Empty segments and `.` are dropped, `..` pops a segment. A `..` that
/// would climb above the root is a path escape and yields `NotAuthorized`.
pub fn normalize(raw: &str) -> AppResult<String> {
    if raw.contains('\0') {
        return Err(AppError::invalid_argument("Path contains a NUL byte"));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(AppError::not_authorized(format!(
                        "Path '{raw}' escapes the user root"
                    )));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        Ok(ROOT.to_string())
    } else {
        Ok(format!("/{}", segments.join("/")))
    }
}

/// Validate a single item name.
pub fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_argument("Name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(AppError::invalid_argument(format!(
            "'{name}' is not a valid name"
        )));
    }
    if name.contains('/') || name.contains('\0') {
        return Err(AppError::invalid_argument(
            "Name cannot contain '/' or NUL characters",
        ));
    }
    Ok(())
}

/// Validate a username for use as a physical root directory name.
pub fn validate_username(username: &str) -> AppResult<()> {
    let mut chars = username.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !first_ok || !rest_ok || username.len() > 64 {
        return Err(AppError::invalid_argument(format!(
            "Invalid username '{username}'"
        )));
    }
    Ok(())
}

pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Join a canonical parent path and a validated name.
pub fn join(parent: &str, name: &str) -> String {
    if is_root(parent) {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Split a canonical path into `(parent, name)`. Returns `None` for the root.
pub fn split(path: &str) -> Option<(&str, &str)> {
    if is_root(path) {
        return None;
    }
    let idx = path.rfind('/')?;
    let parent = if idx == 0 { ROOT } else { &path[..idx] };
    Some((parent, &path[idx + 1..]))
}

/// Whether `path` equals `prefix` or lies beneath it.
pub fn is_within(path: &str, prefix: &str) -> bool {
    if is_root(prefix) {
        return true;
    }
    path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'/')
}

/// Replace the leading `old` segment prefix of `path` with `new`.
///
/// Returns `None` when `path` is not within `old`.
pub fn rebase(path: &str, old: &str, new: &str) -> Option<String> {
    if !is_within(path, old) {
        return None;
    }
    let rest = if is_root(old) { path } else { &path[old.len()..] };
    if rest.is_empty() {
        return Some(new.to_string());
    }
    if is_root(new) {
        Some(rest.to_string())
    } else {
        Some(format!("{new}{rest}"))
    }
}

/// The path itself followed by each ancestor, nearest first, excluding the root.
pub fn ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = path;
    while let Some((parent, _)) = split(current) {
        out.push(current.to_string());
        current = parent;
    }
    out
}
