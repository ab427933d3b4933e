use std::sync::Arc;

use vetter_core::types::{Change, ChangeInfo, Message, Principal};
use vetter_core::{now_ms, ChangeId, ProjectKey, Transition};
use vetter_store::{ChangeStore, StoreError, WriteBatch};

use crate::ReviewError;

/// One project-scoped set of changes to move through the same transition.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub project: ProjectKey,
    pub actor: Principal,
    pub changes: Vec<ChangeId>,
    pub reason: Option<String>,
}

impl BatchRequest {
    pub fn new(project: ProjectKey, actor: Principal, changes: Vec<ChangeId>) -> Self {
        Self {
            project,
            actor,
            changes,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.map(str::to_string);
        self
    }

    /// Change ids in input order with repeats dropped.
    fn distinct_changes(&self) -> Vec<ChangeId> {
        let mut seen = std::collections::HashSet::new();
        self.changes
            .iter()
            .filter(|id| seen.insert(**id))
            .copied()
            .collect()
    }
}

/// Fails on the first change whose project differs from the batch's.
pub fn validate_scope<'a>(
    expected: &ProjectKey,
    changes: impl IntoIterator<Item = &'a Change>,
) -> Result<(), ReviewError> {
    for change in changes {
        if &change.project != expected {
            return Err(ReviewError::ProjectMismatch {
                found: change.project.clone(),
                expected: expected.clone(),
            });
        }
    }
    Ok(())
}

/// Applies a transition to every change of a batch as one atomic unit.
///
/// Validation runs against committed state inside the store's exclusive write
/// batch, so concurrent batches touching the same change serialize and the
/// loser observes the winner's status.
pub struct TransactionCoordinator {
    store: Arc<ChangeStore>,
}

impl TransactionCoordinator {
    pub fn new(store: Arc<ChangeStore>) -> Self {
        Self { store }
    }

    /// Returns the committed snapshots in input order. On error nothing is written.
    pub fn apply_batch(
        &self,
        request: &BatchRequest,
        transition: Transition,
    ) -> Result<Vec<ChangeInfo>, ReviewError> {
        let ids = request.distinct_changes();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = self.store.begin_batch()?;
        match stage_all(&mut batch, request, transition, &ids) {
            Ok(()) => {
                let committed = batch.commit()?;
                tracing::info!(
                    project = %request.project,
                    actor = request.actor.name(),
                    %transition,
                    changes = committed.len(),
                    "batch committed"
                );
                Ok(committed)
            }
            Err(err) => {
                if let Err(abort_err) = batch.abort() {
                    tracing::warn!(error = %abort_err, "failed to abort write batch");
                }
                tracing::warn!(
                    project = %request.project,
                    %transition,
                    error = %err,
                    "batch aborted"
                );
                Err(err)
            }
        }
    }
}

fn stage_all(
    batch: &mut WriteBatch,
    request: &BatchRequest,
    transition: Transition,
    ids: &[ChangeId],
) -> Result<(), ReviewError> {
    if !batch.has_project(&request.project)? {
        return Err(StoreError::ProjectNotFound(request.project.clone()).into());
    }

    let mut changes = Vec::with_capacity(ids.len());
    for id in ids {
        let change = batch
            .load(id)?
            .ok_or(StoreError::ChangeNotFound(*id))?;
        changes.push(change);
    }
    validate_scope(&request.project, &changes)?;

    let now = now_ms();
    let text = transition.compose_message(request.reason.as_deref());
    for mut change in changes {
        change.apply(transition, now)?;
        let message = Message {
            author: request.actor.name().to_string(),
            text: text.clone(),
            timestamp_ms: now,
            patch_set: change.current_patch_set,
            tag: Some(transition.tag()),
        };
        batch.stage(change, message);
    }
    Ok(())
}
