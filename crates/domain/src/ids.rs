//! Strongly-typed identifiers for domain entities.
//!
//! Ids are prefix-tagged strings (`u_…`, `g_…`, `card_…`) rather than raw
//! UUIDs because the store addresses entities by path and the prefix is
//! part of the persisted key format. The prefix makes the entity type
//! recoverable from any id found inside a relationship map.

use uuid::Uuid;

use crate::error::DomainError;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh random id under this type's prefix.
            pub fn new() -> Self {
                Self(format!("{}{}", $prefix, Uuid::new_v4().simple()))
            }

            /// Parse an id string, validating the collection prefix.
            pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
                let raw = raw.into();
                if raw.len() > $prefix.len() && raw.starts_with($prefix) {
                    Ok(Self(raw))
                } else {
                    Err(DomainError::invalid_id(format!(
                        "expected {} id with prefix '{}', got '{}'",
                        stringify!($name),
                        $prefix,
                        raw
                    )))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(UserId, "u_");
define_id!(GameId, "g_");
define_id!(ActorId, "actor_");
define_id!(CardId, "card_");
define_id!(DeckId, "d_");
define_id!(ValueId, "value_");
define_id!(CapabilityId, "cap_");
define_id!(AgreementId, "ag_");
define_id!(ChatRoomId, "chat_");
define_id!(MessageId, "msg_");

impl ValueId {
    /// Deterministic id derived from a normalized name, so creating the
    /// same value twice resolves to the same record.
    pub fn from_name(name: &str) -> Self {
        Self(format!("{}{}", Self::PREFIX, slugify(name)))
    }
}

impl CapabilityId {
    /// Deterministic id derived from a normalized name.
    pub fn from_name(name: &str) -> Self {
        Self(format!("{}{}", Self::PREFIX, slugify(name)))
    }
}

/// Normalize a display name into a stable slug: lowercase, alphanumerics
/// kept, everything else collapsed into single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_sep = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix() {
        assert!(UserId::new().as_str().starts_with("u_"));
        assert!(AgreementId::new().as_str().starts_with("ag_"));
        assert!(ChatRoomId::new().as_str().starts_with("chat_"));
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        assert!(UserId::parse("g_123").is_err());
        assert!(UserId::parse("u_").is_err());
        assert!(UserId::parse("u_123").is_ok());
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(CardId::new(), CardId::new());
    }

    #[test]
    fn slug_normalizes_names() {
        assert_eq!(slugify("Mutual Aid"), "mutual-aid");
        assert_eq!(slugify("  Fair   Trade! "), "fair-trade");
        assert_eq!(slugify("Öko-Strom"), "öko-strom");
    }

    #[test]
    fn slug_ids_are_deterministic() {
        assert_eq!(ValueId::from_name("Mutual Aid"), ValueId::from_name("mutual aid"));
        assert_eq!(ValueId::from_name("Mutual Aid").as_str(), "value_mutual-aid");
        assert_eq!(CapabilityId::from_name("Carpentry").as_str(), "cap_carpentry");
    }
}
