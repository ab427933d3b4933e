use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::types::ChangeStatus;

/// The guarded edges of the change lifecycle.
///
/// ```text
/// DRAFT --publish--> NEW --merge--> MERGED
///                     ^  |
///              restore|  |abandon
///                     |  v
///                   ABANDONED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Abandon,
    Restore,
    Publish,
    Merge,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Abandon => "abandon",
            Self::Restore => "restore",
            Self::Publish => "publish",
            Self::Merge => "merge",
        }
    }

    /// Status reached when the edge is taken.
    pub fn target(&self) -> ChangeStatus {
        match self {
            Self::Abandon => ChangeStatus::Abandoned,
            Self::Restore | Self::Publish => ChangeStatus::New,
            Self::Merge => ChangeStatus::Merged,
        }
    }

    pub fn check(&self, from: ChangeStatus) -> Result<ChangeStatus, TransitionError> {
        match (self, from) {
            (Self::Abandon, ChangeStatus::New)
            | (Self::Restore, ChangeStatus::Abandoned)
            | (Self::Publish, ChangeStatus::Draft)
            | (Self::Merge, ChangeStatus::New) => Ok(self.target()),
            (Self::Abandon, ChangeStatus::Draft) => Err(TransitionError::DraftAbandon),
            (_, status) => Err(TransitionError::InvalidState(status)),
        }
    }

    /// Message text recorded on the change; a non-blank reason is appended verbatim.
    pub fn compose_message(&self, reason: Option<&str>) -> String {
        let headline = match self {
            Self::Abandon => "Abandoned",
            Self::Restore => "Restored",
            Self::Publish => "Published",
            Self::Merge => "Change has been successfully merged",
        };
        match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => format!("{headline}\n\n{reason}"),
            None => headline.to_string(),
        }
    }

    pub fn tag(&self) -> String {
        format!("autogenerated:vetter:{}", self.name())
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
