use std::sync::{PoisonError, RwLock};

use globset::{Glob, GlobMatcher};

use vetter_core::types::Principal;
use vetter_core::{BranchRef, ProjectKey};

use crate::access::{AccessPolicy, Capability, Grant, OwnerRule, ALL_PROJECTS};
use crate::groups::effective_groups;
use crate::PolicyError;

struct CompiledGrant {
    /// `None` applies to every project.
    project: Option<ProjectKey>,
    matcher: GlobMatcher,
    capability: Capability,
    group: String,
}

impl CompiledGrant {
    fn compile(grant: &Grant) -> Result<Self, PolicyError> {
        if !grant.ref_pattern.starts_with("refs/") {
            return Err(PolicyError::InvalidPattern {
                pattern: grant.ref_pattern.clone(),
                reason: "must start with refs/".into(),
            });
        }
        let matcher = Glob::new(&grant.ref_pattern)
            .map_err(|e| PolicyError::InvalidPattern {
                pattern: grant.ref_pattern.clone(),
                reason: e.to_string(),
            })?
            .compile_matcher();
        let project = if grant.project == ALL_PROJECTS {
            None
        } else {
            Some(ProjectKey::new(grant.project.as_str())?)
        };
        Ok(Self {
            project,
            matcher,
            capability: grant.capability,
            group: grant.group.clone(),
        })
    }

    fn applies_to(&self, project: &ProjectKey, branch: &BranchRef) -> bool {
        self.project.as_ref().map_or(true, |p| p == project) && self.matcher.is_match(branch.as_str())
    }
}

struct CompiledPolicy {
    source: AccessPolicy,
    grants: Vec<CompiledGrant>,
}

impl CompiledPolicy {
    fn compile(source: AccessPolicy) -> Result<Self, PolicyError> {
        let grants = source
            .grants
            .iter()
            .map(CompiledGrant::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { source, grants })
    }
}

/// Yes/no capability decisions over the configured grants.
///
/// Decisions read only the policy and the facts passed in; they never touch
/// change state.
pub struct PermissionGate {
    policy: RwLock<CompiledPolicy>,
}

impl PermissionGate {
    pub fn new(policy: AccessPolicy) -> Result<Self, PolicyError> {
        Ok(Self {
            policy: RwLock::new(CompiledPolicy::compile(policy)?),
        })
    }

    /// Adds a grant; invalid patterns are rejected and leave the policy as it was.
    pub fn grant(&self, grant: Grant) -> Result<(), PolicyError> {
        let compiled = CompiledGrant::compile(&grant)?;
        let mut policy = self.policy.write().unwrap_or_else(PoisonError::into_inner);
        policy.source.grants.push(grant);
        policy.grants.push(compiled);
        Ok(())
    }

    pub fn set_owner_rule(&self, rule: OwnerRule) {
        let mut policy = self.policy.write().unwrap_or_else(PoisonError::into_inner);
        policy.source.owner_rule = rule;
    }

    /// Current policy, for persisting.
    pub fn policy(&self) -> AccessPolicy {
        self.policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .source
            .clone()
    }

    pub fn has_capability(
        &self,
        principal: &Principal,
        project: &ProjectKey,
        branch: &BranchRef,
        capability: Capability,
    ) -> bool {
        let groups = effective_groups(principal);
        let policy = self.policy.read().unwrap_or_else(PoisonError::into_inner);
        policy.grants.iter().any(|g| {
            g.capability.satisfies(capability)
                && groups.contains(g.group.as_str())
                && g.applies_to(project, branch)
        })
    }

    /// Whether `principal` may abandon or restore a change on `project`/`branch`
    /// owned by `owner`.
    pub fn can_abandon_restore(
        &self,
        principal: &Principal,
        project: &ProjectKey,
        branch: &BranchRef,
        owner: &str,
    ) -> bool {
        let owner_rule = self
            .policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .source
            .owner_rule;
        if owner_rule == OwnerRule::Implicit && principal.is_account(owner) {
            return true;
        }
        let allowed = self.has_capability(principal, project, branch, Capability::Abandon);
        tracing::debug!(
            principal = principal.name(),
            %project,
            %branch,
            allowed,
            "abandon/restore permission check"
        );
        allowed
    }
}
