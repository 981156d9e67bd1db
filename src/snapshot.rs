use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Writes the rendered page to `dir` for later inspection. Failures are only logged.
pub(crate) fn save_snapshot(dir: &Path, url: &str, html: &str) -> Option<PathBuf> {
    let now = Local::now();
    let file_path = dir.join(format!("page_{}.txt", now.format("%Y%m%d_%H%M%S")));
    let contents = format!(
        "URL: {}\nTime: {}\n{}\n{}",
        url,
        now.format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(50),
        html
    );

    match fs::create_dir_all(dir).and_then(|_| fs::write(&file_path, contents)) {
        Ok(()) => {
            info!("Saved page snapshot to {}", file_path.display());
            Some(file_path)
        }
        Err(e) => {
            warn!("Failed to save page snapshot: {}", e);
            None
        }
    }
}
