pub mod clock;
pub mod error;
pub mod hash;
pub mod id;
pub mod transition;
pub mod types;

pub use clock::now_ms;
pub use error::{CoreError, TransitionError};
pub use hash::meta_hash;
pub use id::{BranchRef, ChangeId, ObjectId, ProjectKey};
pub use transition::Transition;
