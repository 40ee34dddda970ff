//! Value and Capability - shared vocabulary entities.
//!
//! Both carry deterministic slug-derived ids so that creating the same
//! name twice converges on one record. They are referenced by many
//! cards through symmetric boolean maps (card side and vocabulary side
//! are written together).

use chrono::{DateTime, Utc};

use crate::ids::{CapabilityId, ValueId};

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub id: ValueId,
    pub name: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Value {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        let name = name.into();
        Self {
            id: ValueId::from_name(&name),
            name,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    pub id: CapabilityId,
    pub name: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Capability {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        let name = name.into();
        Self {
            id: CapabilityId::from_name(&name),
            name,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}
