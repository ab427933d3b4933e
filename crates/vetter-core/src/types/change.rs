use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, TransitionError};
use crate::hash::meta_hash;
use crate::id::{BranchRef, ChangeId, ObjectId, ProjectKey};
use crate::transition::Transition;
use crate::types::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    New,
    Draft,
    Abandoned,
    Merged,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Draft => "draft",
            Self::Abandoned => "abandoned",
            Self::Merged => "merged",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub id: ChangeId,
    pub project: ProjectKey,
    pub branch: BranchRef,
    pub owner: String,
    pub subject: String,
    status: ChangeStatus,
    pub current_patch_set: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_id: Option<ObjectId>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Change {
    pub fn new(
        project: ProjectKey,
        branch: BranchRef,
        owner: impl Into<String>,
        subject: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: ChangeId::new(),
            project,
            branch,
            owner: owner.into(),
            subject: subject.into(),
            status: ChangeStatus::New,
            current_patch_set: 1,
            meta_id: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    pub fn new_draft(
        project: ProjectKey,
        branch: BranchRef,
        owner: impl Into<String>,
        subject: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            status: ChangeStatus::Draft,
            ..Self::new(project, branch, owner, subject, now_ms)
        }
    }

    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    /// Moves the change along `transition`, leaving it untouched on conflict.
    pub fn apply(
        &mut self,
        transition: Transition,
        now_ms: u64,
    ) -> Result<ChangeStatus, TransitionError> {
        let next = transition.check(self.status)?;
        self.status = next;
        self.updated_at_ms = self.updated_at_ms.max(now_ms);
        Ok(next)
    }

    /// Chains a new meta revision id over the current state and the message
    /// that accompanies it.
    pub fn seal(&mut self, message: Option<&Message>) -> Result<ObjectId, CoreError> {
        let payload = serde_json::to_vec(&(
            &self.id,
            &self.project,
            &self.branch,
            self.status,
            self.current_patch_set,
            self.updated_at_ms,
            message,
        ))?;
        let id = meta_hash(self.meta_id.as_ref(), &payload);
        self.meta_id = Some(id);
        Ok(id)
    }
}

/// Snapshot of a change together with its message log, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInfo {
    #[serde(flatten)]
    pub change: Change,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChangeInfo {
    pub fn status(&self) -> ChangeStatus {
        self.change.status()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}
