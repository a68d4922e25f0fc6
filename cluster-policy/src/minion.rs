//! Minions and the total order on minion ids.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::sync::Arc;

/// A managed cluster node.
///
/// Identity, equality and order all follow the id alone.
#[derive(Debug, Clone)]
pub struct Minion {
    id: String,
    is_primary: bool,
    is_member: bool,
}

impl Minion {
    /// A non-primary cluster member.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_primary: false,
            is_member: true,
        }
    }

    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    pub fn with_member(mut self, is_member: bool) -> Self {
        self.is_member = is_member;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_member(&self) -> bool {
        self.is_member
    }

    /// Order this minion against an id or another minion.
    ///
    /// A key without an id sorts below every minion.
    pub fn compare<K: MinionKey + ?Sized>(&self, key: &K) -> Ordering {
        match key.minion_id() {
            Some(id) => self.id.as_str().cmp(id),
            None => Ordering::Greater,
        }
    }
}

impl Display for Minion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl PartialEq for Minion {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Minion {}

impl PartialOrd for Minion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Minion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialEq<str> for Minion {
    fn eq(&self, other: &str) -> bool {
        self.id == other
    }
}

impl PartialEq<&str> for Minion {
    fn eq(&self, other: &&str) -> bool {
        self.id == *other
    }
}

// ============================================================================
// MinionKey
// ============================================================================

/// Anything a minion can be compared against: a bare id or another minion.
pub trait MinionKey {
    fn minion_id(&self) -> Option<&str>;
}

impl MinionKey for str {
    fn minion_id(&self) -> Option<&str> {
        Some(self)
    }
}

impl MinionKey for String {
    fn minion_id(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl MinionKey for Minion {
    fn minion_id(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

impl<T: MinionKey + ?Sized> MinionKey for Arc<T> {
    fn minion_id(&self) -> Option<&str> {
        (**self).minion_id()
    }
}

impl<T: MinionKey> MinionKey for Option<T> {
    fn minion_id(&self) -> Option<&str> {
        self.as_ref().and_then(|key| key.minion_id())
    }
}
