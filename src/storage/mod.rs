pub mod chat_db;
pub mod database;
pub mod seed;

pub use chat_db::ChatDatabase;
pub use seed::seed_demo_data;

use std::fs;
use std::path::Path;

/// Ensure the directory holding `path` exists.
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
