use std::path::PathBuf;
use std::sync::Arc;

use vetter_policy::{AccessPolicy, PermissionGate};
use vetter_review::listener::LogListener;
use vetter_review::AbandonRestoreService;
use vetter_store::layout::RepoLayout;
use vetter_store::ChangeStore;

/// Find the vetter repo root by walking up from the current directory.
pub fn find_repo_root() -> anyhow::Result<PathBuf> {
    let mut dir = std::env::current_dir()?;
    loop {
        if dir.join(".vetter").is_dir() {
            return Ok(dir);
        }
        if !dir.pop() {
            anyhow::bail!("not in a vetter repository (no .vetter directory found)");
        }
    }
}

/// Everything a command needs to act on the current repository.
pub struct Workspace {
    pub layout: RepoLayout,
    pub store: Arc<ChangeStore>,
    pub gate: Arc<PermissionGate>,
}

impl Workspace {
    pub fn open() -> anyhow::Result<Self> {
        let root = find_repo_root()?;
        let layout = RepoLayout::new(&root);
        let store = Arc::new(ChangeStore::open(&root)?);
        let policy = AccessPolicy::load(&layout.access_file())?;
        let gate = Arc::new(PermissionGate::new(policy)?);
        Ok(Self {
            layout,
            store,
            gate,
        })
    }

    pub fn service(&self) -> AbandonRestoreService {
        AbandonRestoreService::new(self.store.clone(), self.gate.clone())
            .with_listener(Arc::new(LogListener))
    }

    pub fn save_policy(&self) -> anyhow::Result<()> {
        self.gate.policy().save(&self.layout.access_file())?;
        Ok(())
    }
}
