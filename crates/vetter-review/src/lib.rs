pub mod coordinator;
pub mod error;
pub mod finder;
pub mod listener;
pub mod service;

pub use coordinator::{BatchRequest, TransactionCoordinator};
pub use error::{ErrorKind, ReviewError};
pub use finder::ChangeFinder;
pub use listener::{ChangeEvent, ChangeListener};
pub use service::{AbandonRestoreService, ChangeActions};
