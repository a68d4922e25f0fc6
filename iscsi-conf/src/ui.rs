//! Building the normalized model from the editor's UI state.
//!
//! Each UI target carries its own interface and image selections. Host
//! entries, portals, auth and pools are all derived from those selections;
//! portal names follow `portal-<node>` rather than being named by the user.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{AuthEntry, ChapCredentials, DiscoveryAuth};
use crate::error::{Result, SectionError, ValidationError};
use crate::model::{GatewayEntry, Model, Target, TargetHost};
use crate::types::{AuthKind, Section, portal_name_for};

/// One target as edited in the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTarget {
    pub name: String,
    /// Absent when the target has no authentication configured
    #[serde(default)]
    pub auth: Option<UiAuth>,
    #[serde(default)]
    pub config_list: Vec<UiTargetConfig>,
}

/// Credentials block of a UI target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAuth {
    #[serde(default)]
    pub userid: String,
    #[serde(default)]
    pub password: String,
    /// Initiators allowed to log in; non-empty means identified auth
    #[serde(default)]
    pub initiator_list: Option<Vec<String>>,
    #[serde(default)]
    pub mutual_auth: Option<UiMutualAuth>,
    #[serde(default)]
    pub discovery_auth: Option<UiDiscoveryAuth>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMutualAuth {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub userid: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiDiscoveryAuth {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub userid: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub mutual_auth: Option<UiMutualAuth>,
}

/// One configuration block: interfaces and images selected together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTargetConfig {
    #[serde(default)]
    pub selected_intf_list: Vec<UiInterface>,
    #[serde(default)]
    pub selected_img_list: Vec<UiImage>,
}

/// A network interface on a gateway node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UiInterface {
    pub node: String,
    pub addr: String,
}

impl UiInterface {
    pub fn new(node: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            addr: addr.into(),
        }
    }
}

/// An RBD image, optionally restricted to a set of initiators.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiImage {
    pub pool: String,
    pub img: String,
    #[serde(default)]
    pub initiator_list: Option<Vec<String>>,
}

impl UiImage {
    pub fn new(pool: impl Into<String>, img: impl Into<String>) -> Self {
        Self {
            pool: pool.into(),
            img: img.into(),
            initiator_list: None,
        }
    }

    pub fn with_initiators(mut self, initiators: Vec<String>) -> Self {
        self.initiator_list = Some(initiators);
        self
    }

    fn initiators(&self) -> &[String] {
        self.initiator_list.as_deref().unwrap_or_default()
    }
}

/// Build a model from UI state given as raw JSON.
///
/// `null` is the absent input and fails; an empty list yields an empty model.
pub fn synthesize_value(value: &Value) -> Result<Model> {
    if value.is_null() {
        warn!("No UI targets given");
        return Err(ValidationError::fatal(SectionError::MissingSection(
            Section::UiState,
        )));
    }

    let ui_targets = Vec::<UiTarget>::deserialize(value).map_err(|e| {
        ValidationError::fatal(SectionError::malformed(Section::UiState, 0, e.to_string()))
    })?;
    synthesize(&ui_targets)
}

/// Build a model from UI state.
///
/// Targets are built first since portals are derived from their hosts. A
/// failure there stops the build. Auth is taken as entered and never fails.
pub fn synthesize(ui_targets: &[UiTarget]) -> Result<Model> {
    if ui_targets.is_empty() {
        info!("Empty UI state, nothing to synthesize");
        return Ok(Model::default());
    }

    let mut model = Model {
        targets: targets_from_ui(ui_targets).map_err(|e| {
            warn!("Failed to build 'targets' section from UI: {}", e);
            ValidationError::fatal(e)
        })?,
        ..Model::default()
    };
    portals_from_ui(&mut model, ui_targets);
    model.auth = auth_from_ui(ui_targets);

    if let Err(e) = pools_from_ui(&mut model, ui_targets) {
        warn!("Failed to build 'pools' section from UI: {}", e);
        return Err(ValidationError::new(vec![e]));
    }

    info!(
        "Synthesized configuration: {} target(s), {} portal(s), {} pool(s)",
        model.targets.len(),
        model.portals.len(),
        model.pools.len()
    );
    Ok(model)
}

fn targets_from_ui(ui_targets: &[UiTarget]) -> std::result::Result<Vec<Target>, SectionError> {
    const SECTION: Section = Section::Targets;
    debug!("Building 'targets' section from UI");

    let mut targets: Vec<Target> = Vec::with_capacity(ui_targets.len());
    for (index, ui_target) in ui_targets.iter().enumerate() {
        if ui_target.name.is_empty() {
            return Err(SectionError::malformed(SECTION, index, "target name is empty"));
        }
        if targets.iter().any(|t| t.name == ui_target.name) {
            return Err(SectionError::malformed(
                SECTION,
                index,
                format!("duplicate target '{}'", ui_target.name),
            ));
        }

        let mut target = Target::new(&ui_target.name);
        for intf in ui_target
            .config_list
            .iter()
            .flat_map(|c| &c.selected_intf_list)
        {
            if intf.node.is_empty() {
                return Err(SectionError::malformed(
                    SECTION,
                    index,
                    "selected interface has no node",
                ));
            }
            // The same interface may be picked in several blocks of one target.
            target.add_host(TargetHost::new(&intf.node, portal_name_for(&intf.node)));
        }

        targets.push(target);
    }

    Ok(targets)
}

fn portals_from_ui(model: &mut Model, ui_targets: &[UiTarget]) {
    debug!("Building 'portals' section from UI");

    let portal_names: Vec<String> = model
        .targets
        .iter()
        .flat_map(|t| t.hosts.iter().map(|h| h.portal_name.clone()))
        .collect();
    for name in portal_names {
        model.portal_mut(&name);
    }

    for intf in ui_targets
        .iter()
        .flat_map(|t| &t.config_list)
        .flat_map(|c| &c.selected_intf_list)
    {
        model
            .portal_mut(&portal_name_for(&intf.node))
            .add_address(&intf.addr);
    }
}

// Credentials are taken as entered; a block switched on before its fields
// are filled in still yields an entry.
fn auth_from_ui(ui_targets: &[UiTarget]) -> Vec<AuthEntry> {
    debug!("Building 'auth' section from UI");

    let mut auth = Vec::with_capacity(ui_targets.len());
    for ui_target in ui_targets {
        let Some(ui_auth) = &ui_target.auth else {
            auth.push(AuthEntry::new(AuthKind::None, &ui_target.name));
            continue;
        };

        let kind = AuthKind::from_initiators(ui_auth.initiator_list.as_deref().unwrap_or_default());
        let tpg = chap_from_ui(&ui_auth.userid, &ui_auth.password, ui_auth.mutual_auth.as_ref());
        let mut entry = AuthEntry::new(kind, &ui_target.name).with_tpg(tpg);

        if let Some(disc) = &ui_auth.discovery_auth {
            let chap = chap_from_ui(&disc.userid, &disc.password, disc.mutual_auth.as_ref());
            entry = entry.with_discovery(DiscoveryAuth::new(disc.enabled, chap));
        }

        auth.push(entry);
    }

    auth
}

fn chap_from_ui(userid: &str, password: &str, mutual: Option<&UiMutualAuth>) -> ChapCredentials {
    match mutual {
        Some(m) if m.enabled => {
            ChapCredentials::with_mutual(userid, password, &m.userid, &m.password)
        }
        _ => ChapCredentials::new(userid, password),
    }
}

fn pools_from_ui(model: &mut Model, ui_targets: &[UiTarget]) -> std::result::Result<(), SectionError> {
    const SECTION: Section = Section::Pools;
    debug!("Building 'pools' section from UI");

    for (index, ui_target) in ui_targets.iter().enumerate() {
        for config in &ui_target.config_list {
            // An image is only reachable once at least one interface is picked too.
            if config.selected_intf_list.is_empty() || config.selected_img_list.is_empty() {
                continue;
            }

            for img in &config.selected_img_list {
                if img.pool.is_empty() || img.img.is_empty() {
                    return Err(SectionError::malformed(
                        SECTION,
                        index,
                        "selected image has no pool or image name",
                    ));
                }

                let pool = model.pool_mut(&img.pool);
                for intf in &config.selected_intf_list {
                    let gateway = pool.gateway_mut(&intf.node);
                    let portal = portal_name_for(&intf.node);

                    if img.initiators().is_empty() {
                        gateway.add_entry(GatewayEntry::new(&portal, &img.img, None));
                    } else {
                        for initiator in img.initiators() {
                            gateway.add_entry(GatewayEntry::new(
                                &portal,
                                &img.img,
                                Some(initiator.clone()),
                            ));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
