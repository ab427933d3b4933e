use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::groups::ADMINISTRATORS;
use crate::PolicyError;

/// Project name in a grant that applies to every project.
pub const ALL_PROJECTS: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Abandon and restore changes.
    Abandon,
    /// Full control of the ref; implies every other capability on it.
    Owner,
}

impl Capability {
    pub fn satisfies(&self, wanted: Capability) -> bool {
        *self == wanted || *self == Capability::Owner
    }
}

/// Whether a change's owner may abandon/restore it without a grant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerRule {
    #[default]
    Implicit,
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    #[serde(default = "all_projects")]
    pub project: String,
    /// Glob over full ref names, e.g. `refs/heads/*`.
    #[serde(rename = "ref")]
    pub ref_pattern: String,
    pub capability: Capability,
    pub group: String,
}

fn all_projects() -> String {
    ALL_PROJECTS.to_string()
}

impl Grant {
    pub fn new(
        project: impl Into<String>,
        ref_pattern: impl Into<String>,
        capability: Capability,
        group: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            ref_pattern: ref_pattern.into(),
            capability,
            group: group.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(default)]
    pub owner_rule: OwnerRule,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl AccessPolicy {
    /// Policy written by `vetter init`: administrators own every ref.
    pub fn bootstrap() -> Self {
        Self {
            owner_rule: OwnerRule::Implicit,
            grants: vec![Grant::new(
                ALL_PROJECTS,
                "refs/*",
                Capability::Owner,
                ADMINISTRATORS,
            )],
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, PolicyError> {
        toml::from_str(content).map_err(|e| PolicyError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, PolicyError> {
        toml::to_string_pretty(self).map_err(|e| PolicyError::Config(e.to_string()))
    }

    /// Reads an access file; a missing file yields the empty policy.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), PolicyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}
