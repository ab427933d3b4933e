pub mod access;
pub mod error;
pub mod gate;
pub mod groups;

pub use access::{AccessPolicy, Capability, Grant, OwnerRule, ALL_PROJECTS};
pub use error::PolicyError;
pub use gate::PermissionGate;
