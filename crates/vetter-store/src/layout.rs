use std::path::{Path, PathBuf};

use crate::StoreError;

#[derive(Debug, Clone)]
pub struct RepoLayout {
    root: PathBuf,
}

impl RepoLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn vetter_dir(&self) -> PathBuf {
        self.root.join(".vetter")
    }

    pub fn config_file(&self) -> PathBuf {
        self.vetter_dir().join("repo.toml")
    }

    pub fn access_file(&self) -> PathBuf {
        self.vetter_dir().join("access.toml")
    }

    pub fn database_file(&self) -> PathBuf {
        self.vetter_dir().join("changes.redb")
    }

    pub fn create_dirs(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.vetter_dir())?;
        Ok(())
    }
}
