//! Small enumerations shared by the model, the document reader and the UI synthesizer.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Section
// ============================================================================

/// A top-level section of the persisted configuration, or the UI input itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// The document as a whole (e.g. not an object)
    Document,
    Targets,
    Auth,
    Portals,
    Pools,
    /// The UI-state collection handed to `synthesize`
    UiState,
}

impl Section {
    /// Key under which this section lives in the persisted document.
    pub const fn key(self) -> &'static str {
        match self {
            Section::Document => "document",
            Section::Targets => "targets",
            Section::Auth => "auth",
            Section::Portals => "portals",
            Section::Pools => "pools",
            Section::UiState => "ui",
        }
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ============================================================================
// AuthKind
// ============================================================================

/// Authentication mode of a target.
///
/// `TpgIdentified` restricts access to listed initiators, `Tpg` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthKind {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "tpg")]
    Tpg,
    #[serde(rename = "tpg+identified")]
    TpgIdentified,
}

impl AuthKind {
    /// Derive the kind from an initiator list: any initiator means identified.
    pub fn from_initiators(initiators: &[String]) -> Self {
        if initiators.is_empty() {
            AuthKind::Tpg
        } else {
            AuthKind::TpgIdentified
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AuthKind::None => "none",
            AuthKind::Tpg => "tpg",
            AuthKind::TpgIdentified => "tpg+identified",
        }
    }
}

impl Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuthKind {
    type Err = AuthKindParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(AuthKind::None),
            "tpg" => Ok(AuthKind::Tpg),
            "tpg+identified" => Ok(AuthKind::TpgIdentified),
            _ => Err(AuthKindParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unsupported authentication kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthKindParseError(pub String);

impl Display for AuthKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown authentication '{}': expected 'none', 'tpg' or 'tpg+identified'",
            self.0
        )
    }
}

impl std::error::Error for AuthKindParseError {}

// ============================================================================
// Toggle
// ============================================================================

/// The `"enable"` / `"disable"` switch used by the persisted auth entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    Enable,
    #[default]
    Disable,
}

impl Toggle {
    /// Only the exact string `"enable"` turns the switch on.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value {
            Some("enable") => Toggle::Enable,
            _ => Toggle::Disable,
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Toggle::Enable
    }
}

impl From<bool> for Toggle {
    fn from(enabled: bool) -> Self {
        if enabled { Toggle::Enable } else { Toggle::Disable }
    }
}

/// Name of the portal serving a gateway node.
pub fn portal_name_for(node: &str) -> String {
    format!("portal-{}", node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_kind_display() {
        assert_eq!(AuthKind::None.to_string(), "none");
        assert_eq!(AuthKind::Tpg.to_string(), "tpg");
        assert_eq!(AuthKind::TpgIdentified.to_string(), "tpg+identified");
    }

    #[test]
    fn test_auth_kind_from_str() {
        assert_eq!("none".parse::<AuthKind>().unwrap(), AuthKind::None);
        assert_eq!("tpg".parse::<AuthKind>().unwrap(), AuthKind::Tpg);
        assert_eq!(
            "tpg+identified".parse::<AuthKind>().unwrap(),
            AuthKind::TpgIdentified
        );
        // Matching is exact, unlike the lenient toggle
        assert!("TPG".parse::<AuthKind>().is_err());
        assert!("chap".parse::<AuthKind>().is_err());
    }

    #[test]
    fn test_auth_kind_serde() {
        let json = serde_json::to_string(&AuthKind::TpgIdentified).unwrap();
        assert_eq!(json, "\"tpg+identified\"");
        let parsed: AuthKind = serde_json::from_str("\"tpg\"").unwrap();
        assert_eq!(parsed, AuthKind::Tpg);
    }

    #[test]
    fn test_auth_kind_from_initiators() {
        assert_eq!(AuthKind::from_initiators(&[]), AuthKind::Tpg);
        assert_eq!(
            AuthKind::from_initiators(&["iqn.1996-04.de.suse:client".to_string()]),
            AuthKind::TpgIdentified
        );
    }

    #[test]
    fn test_toggle_from_flag() {
        assert_eq!(Toggle::from_flag(Some("enable")), Toggle::Enable);
        assert_eq!(Toggle::from_flag(Some("disable")), Toggle::Disable);
        assert_eq!(Toggle::from_flag(Some("Enable")), Toggle::Disable);
        assert_eq!(Toggle::from_flag(None), Toggle::Disable);
        assert_eq!(serde_json::to_string(&Toggle::Enable).unwrap(), "\"enable\"");
    }

    #[test]
    fn test_portal_name_for() {
        assert_eq!(portal_name_for("igw1"), "portal-igw1");
    }
}
