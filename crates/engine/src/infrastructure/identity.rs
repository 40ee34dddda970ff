//! Identity provider adapters.
//!
//! The real provider lives outside this layer; `FixedIdentity` is what
//! embedders hand in when the principal is already resolved for the
//! current request, and what tests use.

use accord_domain::UserId;

use crate::infrastructure::ports::IdentityPort;

pub struct FixedIdentity(pub Option<UserId>);

impl FixedIdentity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn of(user: UserId) -> Self {
        Self(Some(user))
    }
}

impl IdentityPort for FixedIdentity {
    fn current_principal_id(&self) -> Option<UserId> {
        self.0.clone()
    }
}
