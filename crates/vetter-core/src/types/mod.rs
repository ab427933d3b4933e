mod change;
mod message;
mod principal;

pub use change::{Change, ChangeInfo, ChangeStatus};
pub use message::Message;
pub use principal::Principal;
