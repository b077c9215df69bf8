//! Table and JSON output for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use cloudnest_entity::item::ItemInfo;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One listing row, shared by `fs ls`, `trash list` and `shared ls`.
#[derive(Debug, Serialize, Tabled)]
pub struct EntryRow {
    /// Item ID
    id: String,
    /// Kind
    kind: &'static str,
    /// Name
    name: String,
    /// Size
    size: String,
    /// Modified
    modified: String,
    /// Logical path
    path: String,
}

impl From<&ItemInfo> for EntryRow {
    fn from(info: &ItemInfo) -> Self {
        Self {
            id: info.id.to_string(),
            kind: if info.is_dir { "folder" } else { "file" },
            name: info.name.clone(),
            size: if info.is_dir {
                "-".to_string()
            } else {
                human_bytes(info.size_bytes)
            },
            modified: info.modified_at.format("%Y-%m-%d %H:%M").to_string(),
            path: info.path.clone(),
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print directory entries in the selected format
pub fn print_entries(entries: &[ItemInfo], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
            print_list(&rows, format);
        }
        OutputFormat::Json => print_json(entries),
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{:#?}", item),
        OutputFormat::Json => print_json(item),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    println!("{}", json);
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}

/// Format a byte count with a binary unit.
pub fn human_bytes(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value.abs() >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
