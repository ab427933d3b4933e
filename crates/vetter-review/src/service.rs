use std::sync::Arc;

use serde::{Deserialize, Serialize};

use vetter_core::types::{Change, ChangeInfo, Principal};
use vetter_core::{ChangeId, ProjectKey, Transition};
use vetter_policy::PermissionGate;
use vetter_store::{ChangeStore, StoreError};

use crate::coordinator::{validate_scope, BatchRequest, TransactionCoordinator};
use crate::finder::ChangeFinder;
use crate::listener::{ChangeEvent, ChangeListener};
use crate::ReviewError;

/// Which lifecycle actions a principal could take on a change right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeActions {
    pub abandon: bool,
    pub restore: bool,
}

/// Abandon, restore and batch abandon.
///
/// Every operation resolves its targets, checks permission, and only then
/// hands the work to the [`TransactionCoordinator`]. Permission is decided
/// on project, branch and owner, none of which a transition can change, so
/// the decision stays valid once the write batch is entered.
pub struct AbandonRestoreService {
    store: Arc<ChangeStore>,
    gate: Arc<PermissionGate>,
    finder: ChangeFinder,
    coordinator: TransactionCoordinator,
    listeners: Vec<Arc<dyn ChangeListener>>,
}

impl AbandonRestoreService {
    pub fn new(store: Arc<ChangeStore>, gate: Arc<PermissionGate>) -> Self {
        Self {
            finder: ChangeFinder::new(store.clone(), gate.clone()),
            coordinator: TransactionCoordinator::new(store.clone()),
            store,
            gate,
            listeners: Vec::new(),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn ChangeListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn get(&self, id: &str, principal: &Principal) -> Result<ChangeInfo, ReviewError> {
        self.finder.find_one(id, principal)
    }

    /// Changes visible to `principal`, optionally limited to one project.
    pub fn list(
        &self,
        principal: &Principal,
        project: Option<&ProjectKey>,
    ) -> Result<Vec<Change>, ReviewError> {
        let changes = self.store.list_changes()?;
        Ok(changes
            .into_iter()
            .filter(|c| project.map_or(true, |p| p == &c.project))
            .filter(|c| self.finder.is_visible(c, principal))
            .collect())
    }

    pub fn abandon(
        &self,
        id: &str,
        principal: &Principal,
        reason: Option<&str>,
    ) -> Result<ChangeInfo, ReviewError> {
        self.transition_one(id, principal, Transition::Abandon, reason)
    }

    pub fn restore(
        &self,
        id: &str,
        principal: &Principal,
        reason: Option<&str>,
    ) -> Result<ChangeInfo, ReviewError> {
        self.transition_one(id, principal, Transition::Restore, reason)
    }

    /// Abandons every change in `changes`, all of which must belong to `project`.
    pub fn batch_abandon(
        &self,
        project: &ProjectKey,
        principal: &Principal,
        changes: &[ChangeId],
        reason: Option<&str>,
    ) -> Result<(), ReviewError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut targets = Vec::with_capacity(changes.len());
        for id in changes {
            let info = self
                .store
                .get_change(id)?
                .ok_or(StoreError::ChangeNotFound(*id))?;
            targets.push(info.change);
        }
        validate_scope(project, &targets)?;
        for change in &targets {
            self.authorize(principal, change, Transition::Abandon)?;
        }

        let request = BatchRequest::new(project.clone(), principal.clone(), changes.to_vec())
            .with_reason(reason);
        let committed = self.coordinator.apply_batch(&request, Transition::Abandon)?;
        self.notify(Transition::Abandon, committed, principal, reason);
        Ok(())
    }

    pub fn actions(&self, id: &str, principal: &Principal) -> Result<ChangeActions, ReviewError> {
        let info = self.finder.find_one(id, principal)?;
        let allowed = self.permits(principal, &info.change);
        Ok(ChangeActions {
            abandon: allowed && Transition::Abandon.check(info.status()).is_ok(),
            restore: allowed && Transition::Restore.check(info.status()).is_ok(),
        })
    }

    fn transition_one(
        &self,
        id: &str,
        principal: &Principal,
        transition: Transition,
        reason: Option<&str>,
    ) -> Result<ChangeInfo, ReviewError> {
        let target = self.finder.find_one(id, principal)?;
        self.authorize(principal, &target.change, transition)?;

        let request = BatchRequest::new(
            target.change.project.clone(),
            principal.clone(),
            vec![target.change.id],
        )
        .with_reason(reason);
        let committed = self.coordinator.apply_batch(&request, transition)?;
        let info = committed
            .first()
            .cloned()
            .ok_or_else(|| ReviewError::NotFound(format!("change not found: {id}")))?;
        self.notify(transition, committed, principal, reason);
        Ok(info)
    }

    fn permits(&self, principal: &Principal, change: &Change) -> bool {
        self.gate
            .can_abandon_restore(principal, &change.project, &change.branch, &change.owner)
    }

    fn authorize(
        &self,
        principal: &Principal,
        change: &Change,
        action: Transition,
    ) -> Result<(), ReviewError> {
        if self.permits(principal, change) {
            return Ok(());
        }
        tracing::warn!(
            change = %change.id,
            principal = principal.name(),
            %action,
            "permission denied"
        );
        Err(ReviewError::NotPermitted { action })
    }

    fn notify(
        &self,
        transition: Transition,
        committed: Vec<ChangeInfo>,
        principal: &Principal,
        reason: Option<&str>,
    ) {
        if self.listeners.is_empty() {
            return;
        }
        for change in committed {
            let event = ChangeEvent {
                transition,
                change,
                actor: principal.name().to_string(),
                reason: reason.map(str::to_string),
            };
            for listener in &self.listeners {
                listener.on_event(&event);
            }
        }
    }
}
