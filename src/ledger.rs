use crate::error::MonitorError;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Identifiers of posts a notification was already delivered for.
///
/// Backed by a JSON array of strings that is rewritten after every append.
#[derive(Debug)]
pub struct SeenPosts {
    path: PathBuf,
    ids: Vec<String>,
    index: HashSet<String>,
}

impl SeenPosts {
    /// Loads the ledger at `path`. A missing or unreadable file is an empty ledger.
    pub fn load<P: AsRef<Path>>(path: P) -> SeenPosts {
        let path = path.as_ref().to_path_buf();

        let ids: Vec<String> = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!(
                    "Seen posts file {} is corrupt, starting fresh: {}",
                    path.display(),
                    e
                );
                vec![]
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No seen posts file at {}, starting fresh", path.display());
                vec![]
            }
            Err(e) => {
                warn!(
                    "Failed to read seen posts file {}, starting fresh: {}",
                    path.display(),
                    e
                );
                vec![]
            }
        };

        let mut seen = SeenPosts {
            path,
            ids: Vec::with_capacity(ids.len()),
            index: HashSet::with_capacity(ids.len()),
        };
        for id in ids {
            if seen.index.insert(id.clone()) {
                seen.ids.push(id);
            }
        }

        debug!("Loaded {} seen posts", seen.ids.len());
        seen
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in the order they were recorded.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Appends `id` and rewrites the file before returning.
    ///
    /// On a failed write the append is undone, so memory never holds an id the
    /// file does not.
    pub fn record_and_persist(&mut self, id: &str) -> Result<(), MonitorError> {
        if self.contains(id) {
            return Ok(());
        }

        self.ids.push(id.to_string());
        self.index.insert(id.to_string());

        if let Err(e) = self.save() {
            self.ids.pop();
            self.index.remove(id);
            error!("Failed to save seen posts: {}", e);
            return Err(e);
        }

        debug!("Recorded seen post {}", id);
        Ok(())
    }

    fn save(&self) -> Result<(), MonitorError> {
        let data = serde_json::to_string_pretty(&self.ids)?;
        let persist_err = |source| MonitorError::Persist {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp_path).map_err(persist_err)?;
        file.write_all(data.as_bytes()).map_err(persist_err)?;
        file.sync_all().map_err(persist_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            persist_err(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let seen = SeenPosts::load(dir.path().join("seen_posts.json"));
        assert!(seen.is_empty());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_posts.json");
        fs::write(&path, "{\"not\": \"a list\"").unwrap();

        let seen = SeenPosts::load(&path);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_persist_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("seen_posts.json");

        let mut seen = SeenPosts::load(&path);
        seen.record_and_persist("/post-1").unwrap();
        seen.record_and_persist("/post-2").unwrap();
        seen.record_and_persist("/post-1").unwrap();
        seen.record_and_persist("/帖子-3").unwrap();

        let reloaded = SeenPosts::load(&path);
        assert_eq!(reloaded.ids(), &["/post-1", "/post-2", "/帖子-3"]);
        assert!(reloaded.contains("/post-2"));
        assert!(!reloaded.contains("/post-4"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("/帖子-3"));
    }

    #[test]
    fn test_duplicates_in_file_are_collapsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_posts.json");
        fs::write(&path, r#"["/post-1", "/post-2", "/post-1"]"#).unwrap();

        let seen = SeenPosts::load(&path);
        assert_eq!(seen.ids(), &["/post-1", "/post-2"]);
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // The target is a directory, so the final rename cannot succeed.
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("child"), "x").unwrap();

        let mut seen = SeenPosts::load(&path);
        let res = seen.record_and_persist("/post-1");

        assert!(matches!(res, Err(MonitorError::Persist { .. })));
        assert!(!seen.contains("/post-1"));
        assert!(seen.is_empty());
        assert!(!dir.path().join("taken.tmp").exists());
    }
}
