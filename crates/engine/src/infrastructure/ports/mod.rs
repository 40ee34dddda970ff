//! Port traits and their error types.

mod error;
mod external;

pub use error::{NotifyError, RepoError, StoreError};
pub use external::{ChangeCallback, ClockPort, Fields, IdentityPort, NotifierPort, PathStore};

#[cfg(test)]
pub use external::{MockClockPort, MockIdentityPort, MockNotifierPort, MockPathStore};
