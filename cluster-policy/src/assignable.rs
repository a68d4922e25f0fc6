//! Roles and hardware profiles, each with its available and selected minions.

use std::fmt::{self, Display};
use std::sync::Arc;

use tracing::debug;

use crate::minion::Minion;

/// Whether an assignable is a role or a hardware profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignableKind {
    /// Any minion may take on a role
    Role,
    /// Only minions with matching hardware may take on a profile
    Profile,
}

impl Display for AssignableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignableKind::Role => write!(f, "role"),
            AssignableKind::Profile => write!(f, "profile"),
        }
    }
}

/// A role or profile and the minions it can be assigned to.
///
/// Minions are shared with the rest of the cluster and matched by pointer
/// identity in the reference-based operations. Both lists are kept sorted
/// by minion id.
#[derive(Debug, Clone)]
pub struct Assignable {
    name: String,
    kind: AssignableKind,
    available: Vec<Arc<Minion>>,
    selected: Vec<Arc<Minion>>,
}

impl Assignable {
    /// Create an assignable with every candidate available and none selected.
    pub fn new(name: impl Into<String>, kind: AssignableKind, candidates: Vec<Arc<Minion>>) -> Self {
        let mut available = candidates;
        available.sort();
        available.dedup_by(|a, b| a.id() == b.id());
        Self {
            name: name.into(),
            kind,
            available,
            selected: Vec::new(),
        }
    }

    pub fn role(name: impl Into<String>, candidates: Vec<Arc<Minion>>) -> Self {
        Self::new(name, AssignableKind::Role, candidates)
    }

    pub fn profile(name: impl Into<String>, candidates: Vec<Arc<Minion>>) -> Self {
        Self::new(name, AssignableKind::Profile, candidates)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssignableKind {
        self.kind
    }

    pub fn available(&self) -> &[Arc<Minion>] {
        &self.available
    }

    pub fn selected(&self) -> &[Arc<Minion>] {
        &self.selected
    }

    /// Every minion this assignable can take, available or selected, sorted.
    pub fn candidates(&self) -> Vec<Arc<Minion>> {
        let mut all: Vec<_> = self
            .available
            .iter()
            .chain(&self.selected)
            .cloned()
            .collect();
        all.sort();
        all
    }

    /// Move the minion with `id` from available to selected.
    /// Returns false if it is not currently available.
    pub fn select_by_id(&mut self, id: &str) -> bool {
        match self.available.iter().position(|m| m.id() == id) {
            Some(index) => {
                move_minion(index, &mut self.available, &mut self.selected);
                debug!("Selected {} for {} {}", id, self.kind, self.name);
                true
            }
            None => false,
        }
    }

    /// Move `minion` from available to selected.
    /// Returns false if that exact minion is not currently available.
    pub fn select_by_ref(&mut self, minion: &Arc<Minion>) -> bool {
        match position_of(&self.available, minion) {
            Some(index) => {
                move_minion(index, &mut self.available, &mut self.selected);
                debug!("Selected {} for {} {}", minion, self.kind, self.name);
                true
            }
            None => false,
        }
    }

    /// Move the minion with `id` from selected back to available.
    /// Returns false if it is not currently selected.
    pub fn deselect_by_id(&mut self, id: &str) -> bool {
        match self.selected.iter().position(|m| m.id() == id) {
            Some(index) => {
                move_minion(index, &mut self.selected, &mut self.available);
                debug!("Deselected {} from {} {}", id, self.kind, self.name);
                true
            }
            None => false,
        }
    }

    /// Move `minion` from selected back to available.
    /// Returns false if that exact minion is not currently selected.
    pub fn deselect_by_ref(&mut self, minion: &Arc<Minion>) -> bool {
        match position_of(&self.selected, minion) {
            Some(index) => {
                move_minion(index, &mut self.selected, &mut self.available);
                debug!("Deselected {} from {} {}", minion, self.kind, self.name);
                true
            }
            None => false,
        }
    }

    pub fn is_available(&self, minion: &Arc<Minion>) -> bool {
        position_of(&self.available, minion).is_some()
    }

    pub fn is_selected(&self, minion: &Arc<Minion>) -> bool {
        position_of(&self.selected, minion).is_some()
    }
}

fn position_of(list: &[Arc<Minion>], minion: &Arc<Minion>) -> Option<usize> {
    list.iter().position(|m| Arc::ptr_eq(m, minion))
}

// The destination is fully re-sorted; lists are small.
fn move_minion(index: usize, from: &mut Vec<Arc<Minion>>, to: &mut Vec<Arc<Minion>>) {
    let minion = from.remove(index);
    to.push(minion);
    to.sort();
}
