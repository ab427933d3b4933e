use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The authenticated actor of an operation.
///
/// Group membership is asserted by whoever authenticated the caller; the
/// built-in groups are resolved by the permission layer, not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account: Option<String>,
    #[serde(default)]
    groups: BTreeSet<String>,
}

impl Principal {
    pub fn user(account: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            groups: BTreeSet::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            account: None,
            groups: BTreeSet::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Name recorded as the author of messages.
    pub fn name(&self) -> &str {
        self.account.as_deref().unwrap_or("anonymous")
    }

    pub fn is_registered(&self) -> bool {
        self.account.is_some()
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    pub fn is_account(&self, account: &str) -> bool {
        self.account.as_deref() == Some(account)
    }
}
