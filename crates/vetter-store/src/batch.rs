use redb::{ReadableTable, WriteTransaction};

use vetter_core::types::{Change, ChangeInfo, Message};
use vetter_core::{ChangeId, ProjectKey};

use crate::ledger::{self, MESSAGES};
use crate::{StoreError, CHANGES, PROJECTS};

struct Staged {
    change: Change,
    message: Message,
}

/// An exclusive write transaction with a staging buffer.
///
/// Reads observe committed state plus nothing staged. Staged updates are
/// written only by [`WriteBatch::commit`], all inside one redb commit, so
/// either every staged change becomes visible or none does. Only one batch
/// exists at a time per store; `begin_batch` blocks until the previous one
/// commits or aborts.
pub struct WriteBatch {
    txn: WriteTransaction,
    staged: Vec<Staged>,
}

impl WriteBatch {
    pub(crate) fn new(txn: WriteTransaction) -> Self {
        Self {
            txn,
            staged: Vec::new(),
        }
    }

    pub fn has_project(&self, project: &ProjectKey) -> Result<bool, StoreError> {
        let table = self.txn.open_table(PROJECTS)?;
        let found = table.get(project.as_str())?.is_some();
        Ok(found)
    }

    pub fn load(&self, id: &ChangeId) -> Result<Option<Change>, StoreError> {
        let table = self.txn.open_table(CHANGES)?;
        let bytes = id.as_bytes();
        let change = match table.get(bytes.as_slice())? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(change)
    }

    /// Queues `change` (already transitioned) and its accompanying message.
    pub fn stage(&mut self, change: Change, message: Message) {
        tracing::debug!(change = %change.id, status = %change.status(), "staged update");
        self.staged.push(Staged { change, message });
    }

    /// Writes every staged update and commits; returns the committed snapshots
    /// in staging order.
    pub fn commit(self) -> Result<Vec<ChangeInfo>, StoreError> {
        let Self { txn, staged } = self;
        let mut committed = Vec::with_capacity(staged.len());
        {
            let mut changes = txn.open_table(CHANGES)?;
            let mut messages = txn.open_table(MESSAGES)?;
            for Staged { mut change, message } in staged {
                let stored = ledger::append(&mut messages, &change.id, message)?;
                change.seal(Some(&stored))?;
                let bytes = serde_json::to_vec(&change)?;
                let key = change.id.as_bytes();
                changes.insert(key.as_slice(), bytes.as_slice())?;
                let log = ledger::read_all(&messages, &change.id)?;
                committed.push(ChangeInfo {
                    change,
                    messages: log,
                });
            }
        }
        txn.commit()?;
        Ok(committed)
    }

    /// Drops every staged update; committed state is untouched.
    pub fn abort(self) -> Result<(), StoreError> {
        if !self.staged.is_empty() {
            tracing::debug!(discarded = self.staged.len(), "write batch aborted");
        }
        self.txn.abort()?;
        Ok(())
    }
}
