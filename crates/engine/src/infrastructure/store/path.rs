//! Slash-delimited store paths.
//!
//! The naming convention is part of the persisted format and must stay
//! bit-exact: `<collection>/<id>` for entities,
//! `<collection>/<id>/<field>/<subkey>` for relationship-map entries
//! and sharded maps (`cards_ref/page_3`, `messages_ref/day_20260826`).

/// Collection names, fixed by the persisted layout.
pub mod collections {
    pub const USERS: &str = "users";
    pub const GAMES: &str = "games";
    pub const ACTORS: &str = "actors";
    pub const CARDS: &str = "cards";
    pub const DECKS: &str = "decks";
    pub const VALUES: &str = "values";
    pub const CAPABILITIES: &str = "capabilities";
    pub const AGREEMENTS: &str = "agreements";
    pub const CHATS: &str = "chats";
    pub const MESSAGES: &str = "messages";
    pub const POSITIONS: &str = "positions";
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(String);

impl Path {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Root path of one entity: `<collection>/<id>`.
    pub fn entity(collection: &str, id: impl AsRef<str>) -> Self {
        Self(format!("{}/{}", collection, id.as_ref()))
    }

    /// Append one segment.
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        Self(format!("{}/{}", self.0, segment.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
