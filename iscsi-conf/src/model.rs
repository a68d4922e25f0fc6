//! The normalized gateway configuration.
//!
//! Both `parse` and `synthesize` produce a [`Model`]. Its serde form is the
//! persisted document shape, so a writer can hand `to_document()` straight
//! to disk.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::AuthEntry;

/// A target host entry: which gateway host serves the target, and through which portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetHost {
    pub host: String,
    #[serde(rename = "portal")]
    pub portal_name: String,
}

impl TargetHost {
    pub fn new(host: impl Into<String>, portal_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            portal_name: portal_name.into(),
        }
    }
}

/// An iSCSI target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    /// Target name (typically an IQN)
    #[serde(rename = "target")]
    pub name: String,
    pub hosts: Vec<TargetHost>,
    /// Extra keys carried verbatim from the persisted form
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: Vec::new(),
            custom: Map::new(),
        }
    }

    /// Add a host entry unless the same host/portal pair is already present.
    /// Returns whether the entry was added.
    pub fn add_host(&mut self, host: TargetHost) -> bool {
        if self.hosts.contains(&host) {
            return false;
        }
        self.hosts.push(host);
        true
    }

    pub fn with_host(mut self, host: TargetHost) -> Self {
        self.add_host(host);
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: Value) -> Self {
        self.custom.insert(key.into(), value);
        self
    }
}

/// A named portal and the addresses it listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Portal {
    pub name: String,
    pub addresses: Vec<String>,
}

impl Portal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addresses: Vec::new(),
        }
    }

    /// Append an address unless already present. Returns whether it was added.
    pub fn add_address(&mut self, address: impl Into<String>) -> bool {
        let address = address.into();
        if self.addresses.contains(&address) {
            return false;
        }
        self.addresses.push(address);
        true
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.add_address(address);
        self
    }
}

/// One image exposure on a gateway.
///
/// No initiator means any initiator may reach the image through the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayEntry {
    #[serde(rename = "portal")]
    pub portal_name: String,
    pub image: String,
    pub initiator: Option<String>,
}

impl GatewayEntry {
    pub fn new(
        portal_name: impl Into<String>,
        image: impl Into<String>,
        initiator: Option<String>,
    ) -> Self {
        Self {
            portal_name: portal_name.into(),
            image: image.into(),
            initiator,
        }
    }
}

/// A gateway host within a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolGateway {
    pub host: String,
    #[serde(rename = "tpg")]
    pub entries: Vec<GatewayEntry>,
}

impl PoolGateway {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            entries: Vec::new(),
        }
    }

    /// Add an entry unless the (portal, image, initiator) triple is already present.
    pub fn add_entry(&mut self, entry: GatewayEntry) -> bool {
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn with_entry(mut self, entry: GatewayEntry) -> Self {
        self.add_entry(entry);
        self
    }
}

/// A storage pool and the gateways exposing its images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pool {
    #[serde(rename = "pool")]
    pub name: String,
    pub gateways: Vec<PoolGateway>,
}

impl Pool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gateways: Vec::new(),
        }
    }

    /// Gateway for `host`, created at the end of the list if missing.
    pub fn gateway_mut(&mut self, host: &str) -> &mut PoolGateway {
        let index = match self.gateways.iter().position(|g| g.host == host) {
            Some(index) => index,
            None => {
                self.gateways.push(PoolGateway::new(host));
                self.gateways.len() - 1
            }
        };
        &mut self.gateways[index]
    }

    pub fn with_gateway(mut self, gateway: PoolGateway) -> Self {
        self.gateways.push(gateway);
        self
    }
}

/// The complete normalized configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Model {
    pub targets: Vec<Target>,
    pub auth: Vec<AuthEntry>,
    pub portals: Vec<Portal>,
    pub pools: Vec<Pool>,
}

impl Model {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
            && self.auth.is_empty()
            && self.portals.is_empty()
            && self.pools.is_empty()
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn portal(&self, name: &str) -> Option<&Portal> {
        self.portals.iter().find(|p| p.name == name)
    }

    pub fn pool(&self, name: &str) -> Option<&Pool> {
        self.pools.iter().find(|p| p.name == name)
    }

    pub fn auth_for(&self, target: &str) -> Option<&AuthEntry> {
        self.auth.iter().find(|a| a.target == target)
    }

    /// Pool named `name`, created at the end of the list if missing.
    pub fn pool_mut(&mut self, name: &str) -> &mut Pool {
        let index = match self.pools.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.pools.push(Pool::new(name));
                self.pools.len() - 1
            }
        };
        &mut self.pools[index]
    }

    /// Portal named `name`, created at the end of the list if missing.
    pub fn portal_mut(&mut self, name: &str) -> &mut Portal {
        let index = match self.portals.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.portals.push(Portal::new(name));
                self.portals.len() - 1
            }
        };
        &mut self.portals[index]
    }

    /// Render the model in the persisted document shape.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
