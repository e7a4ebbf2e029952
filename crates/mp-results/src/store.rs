//! Grouped metrics store backed by one JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{MetricsGroup, StoreDocument};
use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone)]
pub struct MetricsStore {
    path: PathBuf,
}

impl MetricsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        Self::new(dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. A missing file is an empty store.
    pub fn load(&self) -> ResultsResult<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn group_names(&self) -> ResultsResult<Vec<String>> {
        Ok(self.load()?.groups.into_keys().collect())
    }

    pub fn group(&self, name: &str) -> ResultsResult<MetricsGroup> {
        self.load()?
            .groups
            .remove(name)
            .ok_or_else(|| ResultsError::GroupNotFound {
                group: name.to_string(),
            })
    }

    /// Replace `name` wholesale; other groups are kept as they are.
    pub fn replace_group(&self, name: &str, group: MetricsGroup) -> ResultsResult<()> {
        let mut document = self.load()?;
        document.groups.insert(name.to_string(), group);
        self.write(&document)?;
        tracing::debug!(path = %self.path.display(), group = name, "metrics group flushed");
        Ok(())
    }

    /// Returns whether the group existed.
    pub fn delete_group(&self, name: &str) -> ResultsResult<bool> {
        let mut document = self.load()?;
        let existed = document.groups.remove(name).is_some();
        if existed {
            self.write(&document)?;
        }
        Ok(existed)
    }

    /// Write to a sibling temp file, then rename over the store.
    fn write(&self, document: &StoreDocument) -> ResultsResult<()> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: format!("{} has no file name", self.path.display()),
            })?
            .to_string_lossy();
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_file_name(format!("{file_name}.tmp"));
        let mut content = serde_json::to_string_pretty(document)?;
        content.push('\n');
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        dir.push(format!("{}_{}", prefix, nanos));
        dir
    }

    fn group(values: &[f64]) -> MetricsGroup {
        let mut g = MetricsGroup::default();
        g.attrs.insert("n_elements".to_string(), "2".to_string());
        g.datasets.insert("TIME".to_string(), values.to_vec());
        g
    }

    #[test]
    fn missing_file_is_empty() {
        let store = MetricsStore::new(unique_temp_dir("mp_results_missing").join("s.json"));
        assert!(store.group_names().unwrap().is_empty());
        assert!(matches!(
            store.group("1"),
            Err(ResultsError::GroupNotFound { .. })
        ));
    }

    #[test]
    fn replace_keeps_other_groups() {
        let dir = unique_temp_dir("mp_results_replace");
        let store = MetricsStore::in_dir(&dir, "sp_data.json");
        store.replace_group("1", group(&[0.1])).unwrap();
        store.replace_group("2", group(&[0.2])).unwrap();
        store.replace_group("1", group(&[0.1, 0.2])).unwrap();

        assert_eq!(store.group_names().unwrap(), vec!["1", "2"]);
        assert_eq!(store.group("1").unwrap().dataset("TIME"), Some(&[0.1, 0.2][..]));
        assert!(!dir.join("sp_data.json.tmp").exists());

        assert!(store.delete_group("2").unwrap());
        assert!(!store.delete_group("2").unwrap());
        fs::remove_dir_all(&dir).ok();
    }
}
