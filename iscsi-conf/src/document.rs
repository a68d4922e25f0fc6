//! Reading the persisted gateway configuration into a [`Model`].
//!
//! Targets are parsed first and any defect there aborts the whole parse.
//! Auth, portals and pools are then parsed independently and their failures
//! are collected, so one call reports every broken section. Either way a
//! failed parse yields no model at all.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::auth::{AuthEntry, ChapCredentials, ChapSecret, DiscoveryAuth, MutualSecret};
use crate::error::{LoadError, Result, SectionError, ValidationError};
use crate::model::{GatewayEntry, Model, Pool, PoolGateway, Portal, Target, TargetHost};
use crate::types::{AuthKind, Section, Toggle};
use crate::validate;

type SectionResult<T> = std::result::Result<T, SectionError>;

/// Parser for persisted configuration documents.
#[derive(Debug, Clone)]
pub struct Parser {
    check_references: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            check_references: true,
        }
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the cross-reference pass run after all sections parse.
    pub fn with_reference_check(mut self, enabled: bool) -> Self {
        self.check_references = enabled;
        self
    }

    /// Parse a persisted document into a normalized model.
    pub fn parse(&self, document: &Value) -> Result<Model> {
        let doc = document.as_object().ok_or_else(|| {
            ValidationError::fatal(SectionError::type_mismatch(
                Section::Document,
                0,
                "document",
                "an object",
            ))
        })?;

        // Every other section hangs off a target, so stop here if targets are broken.
        let targets = parse_targets(doc.get(Section::Targets.key())).map_err(|e| {
            warn!("Failed to parse 'targets' section: {}", e);
            ValidationError::fatal(e)
        })?;

        let mut failures = Vec::new();
        let auth = collect(parse_auth(doc.get(Section::Auth.key())), &mut failures);
        let portals = collect(parse_portals(doc.get(Section::Portals.key())), &mut failures);
        let pools = collect(parse_pools(doc.get(Section::Pools.key())), &mut failures);

        if !failures.is_empty() {
            warn!(
                "Failed to parse {} configuration section(s), discarding model",
                failures.len()
            );
            return Err(ValidationError::new(failures));
        }

        let model = Model {
            targets,
            auth,
            portals,
            pools,
        };

        if self.check_references {
            let unresolved = validate::check_references(&model);
            if !unresolved.is_empty() {
                warn!("{} unresolved reference(s) in configuration", unresolved.len());
                return Err(ValidationError::new(unresolved));
            }
        }

        info!(
            "Parsed configuration: {} target(s), {} auth entr(ies), {} portal(s), {} pool(s)",
            model.targets.len(),
            model.auth.len(),
            model.portals.len(),
            model.pools.len()
        );
        Ok(model)
    }
}

/// Parse a persisted document with the default settings.
pub fn parse(document: &Value) -> Result<Model> {
    Parser::new().parse(document)
}

/// Read a JSON document from disk.
pub fn read_document(path: impl AsRef<Path>) -> std::result::Result<Value, LoadError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&content)?)
}

fn collect<T: Default>(result: SectionResult<T>, failures: &mut Vec<SectionError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse '{}' section: {}", e.section(), e);
            failures.push(e);
            T::default()
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

fn parse_targets(value: Option<&Value>) -> SectionResult<Vec<Target>> {
    const SECTION: Section = Section::Targets;
    debug!("Parsing 'targets' section");

    let entries = section_list(value, SECTION)?;
    if entries.is_empty() {
        return Err(SectionError::malformed(SECTION, 0, "no targets defined"));
    }

    let mut targets: Vec<Target> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let obj = entry_object(entry, SECTION, index)?;
        let name = require_str(obj, "target", SECTION, index)?;
        if name.is_empty() {
            return Err(SectionError::malformed(SECTION, index, "target name is empty"));
        }
        if targets.iter().any(|t| t.name == name) {
            return Err(SectionError::malformed(
                SECTION,
                index,
                format!("duplicate target '{}'", name),
            ));
        }

        let mut target = Target::new(name);
        for (host_index, host) in require_list(obj, "hosts", SECTION, index)?.iter().enumerate() {
            let host = parse_target_host(host, index, host_index)?;
            if !target.add_host(host) {
                debug!("Dropping duplicate host entry {} of target {}", host_index, name);
            }
        }

        for (key, value) in obj {
            if key != "target" && key != "hosts" {
                target.custom.insert(key.clone(), value.clone());
            }
        }

        targets.push(target);
    }

    Ok(targets)
}

fn parse_target_host(value: &Value, index: usize, host_index: usize) -> SectionResult<TargetHost> {
    const SECTION: Section = Section::Targets;

    let element = format!("hosts[{}]", host_index);
    let obj = value
        .as_object()
        .ok_or_else(|| SectionError::type_mismatch(SECTION, index, element.clone(), "an object"))?;
    if obj.len() != 2 || !obj.contains_key("host") || !obj.contains_key("portal") {
        return Err(SectionError::malformed(
            SECTION,
            index,
            format!(
                "host entry {} must carry exactly 'host' and 'portal'",
                host_index
            ),
        ));
    }

    let host = nested_str(obj, "host", SECTION, index, &element)?;
    let portal = nested_str(obj, "portal", SECTION, index, &element)?;
    Ok(TargetHost::new(host, portal))
}

fn parse_auth(value: Option<&Value>) -> SectionResult<Vec<AuthEntry>> {
    const SECTION: Section = Section::Auth;
    debug!("Parsing 'auth' section");

    // An empty list means no auth configured; only a missing key is an error.
    let entries = section_list(value, SECTION)?;

    let mut auth = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let obj = entry_object(entry, SECTION, index)?;
        let kind_str = require_str(obj, "authentication", SECTION, index)?;
        let kind: AuthKind =
            kind_str
                .parse()
                .map_err(|_| SectionError::UnsupportedEnumValue {
                    section: SECTION,
                    index,
                    field: "authentication",
                    value: kind_str.to_string(),
                })?;
        let target = require_str(obj, "target", SECTION, index)?;

        let mut entry = AuthEntry::new(kind, target);

        if let Some(tpg) = optional_object(obj, "tpg", SECTION, index)? {
            entry.tpg = Some(parse_chap(tpg, index, "tpg")?);
        }

        if let Some(discovery) = optional_object(obj, "discovery", SECTION, index)? {
            let enabled = Toggle::from_flag(discovery.get("auth").and_then(Value::as_str));
            let chap = parse_chap(discovery, index, "discovery")?;
            entry.discovery = Some(DiscoveryAuth::new(enabled.is_enabled(), chap));
        }

        auth.push(entry);
    }

    Ok(auth)
}

fn parse_chap(obj: &Map<String, Value>, index: usize, field: &str) -> SectionResult<ChapCredentials> {
    const SECTION: Section = Section::Auth;

    let optional_str = |key: &str| -> SectionResult<Option<String>> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(SectionError::type_mismatch(
                SECTION,
                index,
                format!("{}.{}", field, key),
                "a string",
            )),
        }
    };
    let field_str = |key: &str| -> SectionResult<String> {
        optional_str(key)?.ok_or_else(|| {
            SectionError::malformed(SECTION, index, format!("'{}' is missing '{}'", field, key))
        })
    };

    let chap = ChapSecret::new(field_str("userid")?, field_str("password")?);

    // Mutual fields are only read when the switch is exactly "enable".
    let mutual = Toggle::from_flag(obj.get("mutual").and_then(Value::as_str));
    if !mutual.is_enabled() {
        return Ok(ChapCredentials::OneWay(chap));
    }

    let mutual = MutualSecret {
        userid: optional_str("userid_mutual")?,
        password: optional_str("password_mutual")?,
    };
    Ok(ChapCredentials::Mutual { chap, mutual })
}

fn parse_portals(value: Option<&Value>) -> SectionResult<Vec<Portal>> {
    const SECTION: Section = Section::Portals;
    debug!("Parsing 'portals' section");

    // An empty list is allowed: no node has been added to any target yet.
    let entries = section_list(value, SECTION)?;

    let mut portals: Vec<Portal> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let obj = entry_object(entry, SECTION, index)?;
        if obj.len() != 2 || !obj.contains_key("name") || !obj.contains_key("addresses") {
            return Err(SectionError::malformed(
                SECTION,
                index,
                "portal must carry exactly 'name' and 'addresses'",
            ));
        }

        let name = require_str(obj, "name", SECTION, index)?;
        if portals.iter().any(|p| p.name == name) {
            return Err(SectionError::malformed(
                SECTION,
                index,
                format!("duplicate portal '{}'", name),
            ));
        }

        let mut portal = Portal::new(name);
        for (addr_index, address) in require_list(obj, "addresses", SECTION, index)?
            .iter()
            .enumerate()
        {
            let address = address.as_str().ok_or_else(|| {
                SectionError::type_mismatch(
                    SECTION,
                    index,
                    format!("addresses[{}]", addr_index),
                    "a string",
                )
            })?;
            if !portal.add_address(address) {
                debug!("Dropping duplicate address {} of portal {}", address, name);
            }
        }

        portals.push(portal);
    }

    Ok(portals)
}

fn parse_pools(value: Option<&Value>) -> SectionResult<Vec<Pool>> {
    const SECTION: Section = Section::Pools;
    debug!("Parsing 'pools' section");

    let entries = section_list(value, SECTION)?;

    let mut pools: Vec<Pool> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let obj = entry_object(entry, SECTION, index)?;
        let name = require_str(obj, "pool", SECTION, index)?;
        if pools.iter().any(|p| p.name == name) {
            return Err(SectionError::malformed(
                SECTION,
                index,
                format!("duplicate pool '{}'", name),
            ));
        }

        let mut pool = Pool::new(name);
        for (gw_index, gateway) in require_list(obj, "gateways", SECTION, index)?
            .iter()
            .enumerate()
        {
            let gateway = parse_gateway(gateway, index, gw_index)?;
            if pool.gateways.iter().any(|g| g.host == gateway.host) {
                return Err(SectionError::malformed(
                    SECTION,
                    index,
                    format!("duplicate gateway '{}' in pool '{}'", gateway.host, name),
                ));
            }
            pool.gateways.push(gateway);
        }

        pools.push(pool);
    }

    Ok(pools)
}

fn parse_gateway(value: &Value, index: usize, gw_index: usize) -> SectionResult<PoolGateway> {
    const SECTION: Section = Section::Pools;

    let element = format!("gateways[{}]", gw_index);
    let obj = value
        .as_object()
        .ok_or_else(|| SectionError::type_mismatch(SECTION, index, element.clone(), "an object"))?;
    let host = nested_str(obj, "host", SECTION, index, &element)?;

    let entries = match obj.get("tpg") {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(SectionError::type_mismatch(
                SECTION,
                index,
                format!("gateways[{}].tpg", gw_index),
                "a list",
            ));
        }
        None => {
            return Err(SectionError::malformed(
                SECTION,
                index,
                format!("gateway {} is missing 'tpg'", gw_index),
            ));
        }
    };

    let mut gateway = PoolGateway::new(host);
    for (tpg_index, entry) in entries.iter().enumerate() {
        let field = format!("gateways[{}].tpg[{}]", gw_index, tpg_index);
        let obj = entry
            .as_object()
            .ok_or_else(|| SectionError::type_mismatch(SECTION, index, field.clone(), "an object"))?;

        let portal = nested_str(obj, "portal", SECTION, index, &field)?;
        let image = nested_str(obj, "image", SECTION, index, &field)?;
        let initiator = match obj.get("initiator") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(SectionError::type_mismatch(
                    SECTION,
                    index,
                    format!("{}.initiator", field),
                    "a string or null",
                ));
            }
        };

        if !gateway.add_entry(GatewayEntry::new(portal, image, initiator)) {
            debug!("Dropping duplicate entry {} of gateway {}", field, host);
        }
    }

    Ok(gateway)
}

// ============================================================================
// Value helpers
// ============================================================================

fn section_list(value: Option<&Value>, section: Section) -> SectionResult<&Vec<Value>> {
    match value {
        None | Some(Value::Null) => Err(SectionError::MissingSection(section)),
        Some(Value::Array(entries)) => Ok(entries),
        Some(_) => Err(SectionError::type_mismatch(section, 0, section.key(), "a list")),
    }
}

fn entry_object(value: &Value, section: Section, index: usize) -> SectionResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| SectionError::type_mismatch(section, index, "entry", "an object"))
}

fn require<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    section: Section,
    index: usize,
) -> SectionResult<&'a Value> {
    obj.get(key)
        .ok_or_else(|| SectionError::malformed(section, index, format!("missing '{}' key", key)))
}

fn require_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    section: Section,
    index: usize,
) -> SectionResult<&'a str> {
    require(obj, key, section, index)?
        .as_str()
        .ok_or_else(|| SectionError::type_mismatch(section, index, key, "a string"))
}

fn require_list<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    section: Section,
    index: usize,
) -> SectionResult<&'a Vec<Value>> {
    require(obj, key, section, index)?
        .as_array()
        .ok_or_else(|| SectionError::type_mismatch(section, index, key, "a list"))
}

fn optional_object<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    section: Section,
    index: usize,
) -> SectionResult<Option<&'a Map<String, Value>>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(_) => Err(SectionError::type_mismatch(section, index, key, "an object")),
    }
}

/// A required string inside a nested list element.
///
/// `element` is the element's path within the entry, e.g. `hosts[1]`, and
/// failures name the field as `hosts[1].portal`.
fn nested_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    section: Section,
    index: usize,
    element: &str,
) -> SectionResult<&'a str> {
    let path = format!("{}.{}", element, key);
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(SectionError::type_mismatch(section, index, path, "a string")),
        None => Err(SectionError::malformed(section, index, format!("missing '{}'", path))),
    }
}
