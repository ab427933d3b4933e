use serde::{Deserialize, Serialize};

/// One entry of a change's append-only message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub author: String,
    pub text: String,
    pub timestamp_ms: u64,
    /// Patch set the message was written against.
    pub patch_set: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}
