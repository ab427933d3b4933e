pub mod batch;
pub mod error;
pub mod layout;
pub mod ledger;
pub mod repo;

pub use batch::WriteBatch;
pub use error::StoreError;

use std::path::Path;

use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, TableDefinition};

use vetter_core::types::{Change, ChangeInfo, Message};
use vetter_core::{now_ms, ChangeId, ProjectKey};

use crate::layout::RepoLayout;
use crate::ledger::MESSAGES;

/// Registered project name -> creation time (ms).
pub(crate) const PROJECTS: TableDefinition<&str, u64> = TableDefinition::new("projects");
/// Change id bytes -> JSON encoded [`Change`].
pub(crate) const CHANGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("changes");

/// Change records, their message logs and the project registry, backed by redb.
pub struct ChangeStore {
    db: Database,
    layout: Option<RepoLayout>,
}

impl ChangeStore {
    pub fn init(root: &Path) -> Result<Self, StoreError> {
        let layout = RepoLayout::new(root);
        layout.create_dirs()?;
        repo::write_default_config(&layout)?;
        let db = Database::create(layout.database_file())?;
        Self::from_database(db, Some(layout))
    }

    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let layout = RepoLayout::new(root);
        if !layout.vetter_dir().exists() {
            return Err(StoreError::NotARepository(root.to_path_buf()));
        }
        repo::read_config(&layout)?;
        let db = Database::create(layout.database_file())?;
        Self::from_database(db, Some(layout))
    }

    /// A store with no backing files, for tests and embedding.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::from_database(db, None)
    }

    fn from_database(db: Database, layout: Option<RepoLayout>) -> Result<Self, StoreError> {
        // Create the tables up front so read transactions can always open them.
        let txn = db.begin_write()?;
        txn.open_table(PROJECTS)?;
        txn.open_table(CHANGES)?;
        txn.open_table(MESSAGES)?;
        txn.commit()?;
        Ok(Self { db, layout })
    }

    pub fn layout(&self) -> Option<&RepoLayout> {
        self.layout.as_ref()
    }

    pub fn create_project(&self, project: &ProjectKey) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PROJECTS)?;
            if table.get(project.as_str())?.is_some() {
                return Err(StoreError::ProjectExists(project.clone()));
            }
            table.insert(project.as_str(), now_ms())?;
        }
        txn.commit()?;
        tracing::info!(%project, "project created");
        Ok(())
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectKey>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(PROJECTS)?;
        let mut projects = Vec::new();
        for entry in table.iter()? {
            let (name, _) = entry?;
            projects.push(ProjectKey::new(name.value())?);
        }
        Ok(projects)
    }

    /// Records a freshly uploaded change together with its upload message.
    pub fn insert_change(&self, mut change: Change) -> Result<ChangeInfo, StoreError> {
        let message = Message {
            author: change.owner.clone(),
            text: format!("Uploaded patch set {}.", change.current_patch_set),
            timestamp_ms: change.created_at_ms,
            patch_set: change.current_patch_set,
            tag: Some("autogenerated:vetter:upload".into()),
        };

        let txn = self.db.begin_write()?;
        let messages = {
            let projects = txn.open_table(PROJECTS)?;
            if projects.get(change.project.as_str())?.is_none() {
                return Err(StoreError::ProjectNotFound(change.project.clone()));
            }
            let mut changes = txn.open_table(CHANGES)?;
            let key = change.id.as_bytes();
            if changes.get(key.as_slice())?.is_some() {
                return Err(StoreError::ChangeExists(change.id));
            }
            let mut log = txn.open_table(MESSAGES)?;
            let stored = ledger::append(&mut log, &change.id, message)?;
            change.seal(Some(&stored))?;
            let bytes = serde_json::to_vec(&change)?;
            changes.insert(key.as_slice(), bytes.as_slice())?;
            vec![stored]
        };
        txn.commit()?;
        tracing::info!(change = %change.id, project = %change.project, status = %change.status(), "change created");
        Ok(ChangeInfo { change, messages })
    }

    /// Consistent snapshot of one change and its messages.
    pub fn get_change(&self, id: &ChangeId) -> Result<Option<ChangeInfo>, StoreError> {
        let txn = self.db.begin_read()?;
        let changes = txn.open_table(CHANGES)?;
        let key = id.as_bytes();
        let change: Change = match changes.get(key.as_slice())? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(None),
        };
        let messages = ledger::read_all(&txn.open_table(MESSAGES)?, id)?;
        Ok(Some(ChangeInfo { change, messages }))
    }

    pub fn list_changes(&self) -> Result<Vec<Change>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CHANGES)?;
        let mut changes = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            changes.push(serde_json::from_slice(value.value())?);
        }
        Ok(changes)
    }

    /// Starts the exclusive write transaction used for status transitions.
    pub fn begin_batch(&self) -> Result<WriteBatch, StoreError> {
        Ok(WriteBatch::new(self.db.begin_write()?))
    }
}
