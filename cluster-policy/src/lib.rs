//! Cluster Membership Library
//!
//! Tracks which minions are available to, and selected for, each role and
//! hardware profile of a cluster. Lists stay sorted by minion id, and a
//! minion lives in exactly one of an assignable's two lists at a time.
//!
//! - `minion`: the addressable node and its ordering
//! - `assignable`: a role or profile with its available/selected lists
//! - `cluster`: assembly from a discovery payload

pub mod assignable;
pub mod cluster;
pub mod error;
pub mod minion;

pub use assignable::{Assignable, AssignableKind};
pub use cluster::{Cluster, ClusterProposal, Policy, PrimaryPolicy};
pub use error::{ProposalError, Result};
pub use minion::{Minion, MinionKey};
