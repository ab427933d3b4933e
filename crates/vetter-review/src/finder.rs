use std::sync::Arc;

use vetter_core::types::{Change, ChangeInfo, ChangeStatus, Principal};
use vetter_core::{BranchRef, ChangeId, ProjectKey};
use vetter_policy::PermissionGate;
use vetter_store::ChangeStore;

use crate::ReviewError;

/// Resolves change identifiers to the changes a principal can see.
///
/// Accepts a bare change id or a `project~branch~id` triplet. Identifiers that
/// do not parse simply match nothing.
pub struct ChangeFinder {
    store: Arc<ChangeStore>,
    gate: Arc<PermissionGate>,
}

struct Triplet {
    project: ProjectKey,
    branch: BranchRef,
    id: ChangeId,
}

fn parse(id: &str) -> Option<(ChangeId, Option<Triplet>)> {
    let parts: Vec<&str> = id.split('~').collect();
    match parts.as_slice() {
        [bare] => ChangeId::from_string(bare).ok().map(|id| (id, None)),
        [project, branch, bare] => {
            let triplet = Triplet {
                project: ProjectKey::new(*project).ok()?,
                branch: BranchRef::new(*branch).ok()?,
                id: ChangeId::from_string(bare).ok()?,
            };
            Some((triplet.id, Some(triplet)))
        }
        _ => None,
    }
}

impl ChangeFinder {
    pub fn new(store: Arc<ChangeStore>, gate: Arc<PermissionGate>) -> Self {
        Self { store, gate }
    }

    pub fn find(&self, id: &str, principal: &Principal) -> Result<Vec<ChangeInfo>, ReviewError> {
        let Some((change_id, triplet)) = parse(id) else {
            tracing::debug!(id, "unparseable change identifier");
            return Ok(Vec::new());
        };
        let Some(info) = self.store.get_change(&change_id)? else {
            return Ok(Vec::new());
        };
        if let Some(t) = triplet {
            if t.project != info.change.project || t.branch != info.change.branch {
                return Ok(Vec::new());
            }
        }
        if !self.is_visible(&info.change, principal) {
            tracing::debug!(change = %change_id, principal = principal.name(), "change hidden");
            return Ok(Vec::new());
        }
        Ok(vec![info])
    }

    /// The visible change `id` names, or `NotFound`.
    pub fn find_one(&self, id: &str, principal: &Principal) -> Result<ChangeInfo, ReviewError> {
        self.find(id, principal)?
            .into_iter()
            .next()
            .ok_or_else(|| ReviewError::NotFound(format!("change not found: {id}")))
    }

    /// Drafts are visible to their owner and to anyone allowed to abandon or
    /// restore changes on their branch.
    pub fn is_visible(&self, change: &Change, principal: &Principal) -> bool {
        change.status() != ChangeStatus::Draft
            || principal.is_account(&change.owner)
            || self.gate.can_abandon_restore(
                principal,
                &change.project,
                &change.branch,
                &change.owner,
            )
    }
}
