//! Assembling the membership model from a discovery payload.
//!
//! The payload lists every minion, every role and, per hardware profile,
//! the minions able to take that profile:
//!
//! ```json
//! { "minions": ["m1", ...],
//!   "roles": ["mon", ...],
//!   "profiles": { "ssd-large": ["m1", ...] },
//!   "master_minion": "m1",
//!   "policy": { "member_minions": [...], "roles": {...}, "profiles": {...} } }
//! ```
//!
//! `master_minion` and `policy` are optional.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::assignable::Assignable;
use crate::error::{ProposalError, Result};
use crate::minion::Minion;

/// The discovery payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterProposal {
    #[serde(default)]
    pub minions: Option<Vec<String>>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub profiles: Option<BTreeMap<String, Vec<String>>>,
    /// Designated primary, when discovery knows it
    #[serde(default)]
    pub master_minion: Option<String>,
    /// Existing assignments to pre-select
    #[serde(default)]
    pub policy: Option<Policy>,
}

/// Assignments already in place for the cluster.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Policy {
    /// Minions that are cluster members; all minions are members when absent
    #[serde(default)]
    pub member_minions: Option<Vec<String>>,
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Vec<String>>,
}

/// How the primary minion is picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PrimaryPolicy {
    /// The first minion in sorted order. A placeholder until discovery reports one.
    #[default]
    FirstSorted,
    /// The minion with this id
    Named(String),
    /// No primary
    Unset,
}

/// Minions, roles and profiles of one cluster.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    minions: Vec<Arc<Minion>>,
    roles: Vec<Assignable>,
    profiles: Vec<Assignable>,
}

impl Cluster {
    /// Build from a raw JSON payload.
    pub fn from_value(value: &Value) -> Result<Self> {
        let proposal = ClusterProposal::deserialize(value)?;
        Self::from_proposal(&proposal)
    }

    /// Build from a payload, taking the primary from `master_minion` when present.
    pub fn from_proposal(proposal: &ClusterProposal) -> Result<Self> {
        let primary = match &proposal.master_minion {
            Some(id) => PrimaryPolicy::Named(id.clone()),
            None => PrimaryPolicy::FirstSorted,
        };
        Self::from_proposal_with(proposal, &primary)
    }

    /// Build from a payload with an explicit primary policy.
    pub fn from_proposal_with(proposal: &ClusterProposal, primary: &PrimaryPolicy) -> Result<Self> {
        let minion_ids = proposal
            .minions
            .as_ref()
            .ok_or(ProposalError::Incomplete("minions"))?;
        let role_names = proposal
            .roles
            .as_ref()
            .ok_or(ProposalError::Incomplete("roles"))?;
        let profile_map = proposal
            .profiles
            .as_ref()
            .ok_or(ProposalError::Incomplete("profiles"))?;

        let mut ids: Vec<&str> = minion_ids.iter().map(String::as_str).collect();
        ids.sort();
        ids.dedup();

        let primary_index = match primary {
            PrimaryPolicy::FirstSorted => (!ids.is_empty()).then_some(0),
            PrimaryPolicy::Named(id) => Some(
                ids.binary_search(&id.as_str())
                    .map_err(|_| ProposalError::UnknownPrimary(id.clone()))?,
            ),
            PrimaryPolicy::Unset => None,
        };

        let members = proposal
            .policy
            .as_ref()
            .and_then(|p| p.member_minions.as_ref());

        let minions: Vec<Arc<Minion>> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let is_member = members.is_none_or(|m| m.iter().any(|member| member == id));
                Arc::new(
                    Minion::new(*id)
                        .with_primary(primary_index == Some(index))
                        .with_member(is_member),
                )
            })
            .collect();

        let mut names: Vec<&str> = role_names.iter().map(String::as_str).collect();
        names.sort();
        names.dedup();
        let roles = names
            .into_iter()
            .map(|name| Assignable::role(name, minions.clone()))
            .collect();

        let mut cluster = Self {
            minions,
            roles,
            profiles: Vec::with_capacity(profile_map.len()),
        };

        // BTreeMap iteration keeps profiles sorted by name.
        for (name, members) in profile_map {
            let mut candidates = Vec::with_capacity(members.len());
            for id in members {
                let minion = cluster
                    .minion(id)
                    .ok_or_else(|| ProposalError::UnresolvedMinion {
                        profile: name.clone(),
                        minion: id.clone(),
                    })?;
                candidates.push(Arc::clone(minion));
            }
            cluster.profiles.push(Assignable::profile(name, candidates));
        }

        if let Some(policy) = &proposal.policy {
            cluster.apply_policy(policy);
        }

        info!(
            "Cluster proposal loaded: {} minion(s), {} role(s), {} profile(s)",
            cluster.minions.len(),
            cluster.roles.len(),
            cluster.profiles.len()
        );
        Ok(cluster)
    }

    fn apply_policy(&mut self, policy: &Policy) {
        for (name, ids) in &policy.roles {
            match self.role_mut(name) {
                Some(role) => select_all(role, ids),
                None => warn!("Policy names unknown role '{}'", name),
            }
        }
        for (name, ids) in &policy.profiles {
            match self.profile_mut(name) {
                Some(profile) => select_all(profile, ids),
                None => warn!("Policy names unknown profile '{}'", name),
            }
        }
    }

    /// All minions, sorted by id.
    pub fn minions(&self) -> &[Arc<Minion>] {
        &self.minions
    }

    pub fn roles(&self) -> &[Assignable] {
        &self.roles
    }

    pub fn profiles(&self) -> &[Assignable] {
        &self.profiles
    }

    pub fn minion(&self, id: &str) -> Option<&Arc<Minion>> {
        self.minions
            .binary_search_by(|m| m.compare(id))
            .ok()
            .map(|index| &self.minions[index])
    }

    /// The designated primary, if any.
    pub fn primary(&self) -> Option<&Arc<Minion>> {
        self.minions.iter().find(|m| m.is_primary())
    }

    pub fn role(&self, name: &str) -> Option<&Assignable> {
        self.roles.iter().find(|r| r.name() == name)
    }

    pub fn role_mut(&mut self, name: &str) -> Option<&mut Assignable> {
        self.roles.iter_mut().find(|r| r.name() == name)
    }

    pub fn profile(&self, name: &str) -> Option<&Assignable> {
        self.profiles.iter().find(|p| p.name() == name)
    }

    pub fn profile_mut(&mut self, name: &str) -> Option<&mut Assignable> {
        self.profiles.iter_mut().find(|p| p.name() == name)
    }

    /// Whether `minion` can take on the profile, selected or not.
    pub fn is_minion_available_for_profile(&self, profile: &str, minion: &Arc<Minion>) -> bool {
        self.profile(profile)
            .is_some_and(|p| p.is_available(minion) || p.is_selected(minion))
    }
}

fn select_all(assignable: &mut Assignable, ids: &[String]) {
    for id in ids {
        if assignable.select_by_id(id) {
            debug!("Policy assigned {} to {}", id, assignable.name());
        } else {
            warn!(
                "Policy minion '{}' is not available for {} '{}'",
                id,
                assignable.kind(),
                assignable.name()
            );
        }
    }
}
