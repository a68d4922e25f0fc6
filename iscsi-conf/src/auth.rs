//! CHAP credentials attached to a target's auth entry.
//!
//! The persisted form spells mutual CHAP as a `mutual: "enable"` switch next to
//! `userid_mutual`/`password_mutual`. Here the switch and its fields collapse
//! into one enum, so a disabled mutual section simply has no fields.

use serde::{Serialize, Serializer};

use crate::types::{AuthKind, Toggle};

/// A CHAP user name and secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapSecret {
    pub userid: String,
    pub password: String,
}

impl ChapSecret {
    pub fn new(userid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            userid: userid.into(),
            password: password.into(),
        }
    }
}

/// Target-side credentials of mutual CHAP.
///
/// Either half may be absent when mutual CHAP is switched on before both
/// fields have been filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutualSecret {
    pub userid: Option<String>,
    pub password: Option<String>,
}

impl MutualSecret {
    pub fn new(userid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            userid: Some(userid.into()),
            password: Some(password.into()),
        }
    }
}

/// CHAP credentials, optionally with mutual (target-side) credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapCredentials {
    OneWay(ChapSecret),
    Mutual {
        chap: ChapSecret,
        mutual: MutualSecret,
    },
}

impl ChapCredentials {
    /// Create credentials without mutual authentication.
    pub fn new(userid: impl Into<String>, password: impl Into<String>) -> Self {
        ChapCredentials::OneWay(ChapSecret::new(userid, password))
    }

    /// Create credentials with mutual authentication.
    pub fn with_mutual(
        userid: impl Into<String>,
        password: impl Into<String>,
        mutual_userid: impl Into<String>,
        mutual_password: impl Into<String>,
    ) -> Self {
        ChapCredentials::Mutual {
            chap: ChapSecret::new(userid, password),
            mutual: MutualSecret::new(mutual_userid, mutual_password),
        }
    }

    pub fn chap(&self) -> &ChapSecret {
        match self {
            ChapCredentials::OneWay(chap) | ChapCredentials::Mutual { chap, .. } => chap,
        }
    }

    pub fn mutual(&self) -> Option<&MutualSecret> {
        match self {
            ChapCredentials::OneWay(_) => None,
            ChapCredentials::Mutual { mutual, .. } => Some(mutual),
        }
    }

    pub fn has_mutual(&self) -> bool {
        self.mutual().is_some()
    }
}

/// Discovery authentication: credentials plus whether discovery auth is switched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryAuth {
    pub enabled: bool,
    pub chap: ChapCredentials,
}

impl DiscoveryAuth {
    pub fn new(enabled: bool, chap: ChapCredentials) -> Self {
        Self { enabled, chap }
    }
}

/// Auth entry for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthEntry {
    #[serde(rename = "authentication")]
    pub kind: AuthKind,
    /// Name of the target this entry belongs to
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tpg: Option<ChapCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery: Option<DiscoveryAuth>,
}

impl AuthEntry {
    pub fn new(kind: AuthKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            tpg: None,
            discovery: None,
        }
    }

    pub fn with_tpg(mut self, tpg: ChapCredentials) -> Self {
        self.tpg = Some(tpg);
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryAuth) -> Self {
        self.discovery = Some(discovery);
        self
    }
}

// ============================================================================
// Persisted form
// ============================================================================

#[derive(Serialize)]
struct ChapWire<'a> {
    userid: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mutual: Option<Toggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    userid_mutual: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password_mutual: Option<&'a str>,
}

impl<'a> From<&'a ChapCredentials> for ChapWire<'a> {
    fn from(creds: &'a ChapCredentials) -> Self {
        let chap = creds.chap();
        let mutual = creds.mutual();
        Self {
            userid: &chap.userid,
            password: &chap.password,
            mutual: mutual.map(|_| Toggle::Enable),
            userid_mutual: mutual.and_then(|m| m.userid.as_deref()),
            password_mutual: mutual.and_then(|m| m.password.as_deref()),
        }
    }
}

#[derive(Serialize)]
struct DiscoveryWire<'a> {
    auth: Toggle,
    #[serde(flatten)]
    chap: ChapWire<'a>,
}

impl Serialize for ChapCredentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ChapWire::from(self).serialize(serializer)
    }
}

impl Serialize for DiscoveryAuth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DiscoveryWire {
            auth: Toggle::from(self.enabled),
            chap: ChapWire::from(&self.chap),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chap_credentials_accessors() {
        let creds = ChapCredentials::new("user1", "secret1");
        assert_eq!(creds.chap().userid, "user1");
        assert!(!creds.has_mutual());

        let creds = ChapCredentials::with_mutual("user2", "secret2", "target2", "tsecret2");
        assert!(creds.has_mutual());
        assert_eq!(creds.mutual().unwrap().password.as_deref(), Some("tsecret2"));
    }

    #[test]
    fn test_partial_mutual_serialized_without_missing_fields() {
        let creds = ChapCredentials::Mutual {
            chap: ChapSecret::new("user", "secret"),
            mutual: MutualSecret::default(),
        };
        let value = serde_json::to_value(&creds).unwrap();
        assert_eq!(
            value,
            json!({"userid": "user", "password": "secret", "mutual": "enable"})
        );
    }

    #[test]
    fn test_chap_credentials_skip_mutual_fields() {
        let creds = ChapCredentials::new("user", "secret");
        let value = serde_json::to_value(&creds).unwrap();
        assert_eq!(value, json!({"userid": "user", "password": "secret"}));
    }

    #[test]
    fn test_chap_credentials_mutual_serialized_as_enable() {
        let creds = ChapCredentials::with_mutual("user", "secret", "muser", "msecret");
        let value = serde_json::to_value(&creds).unwrap();
        assert_eq!(
            value,
            json!({
                "userid": "user",
                "password": "secret",
                "mutual": "enable",
                "userid_mutual": "muser",
                "password_mutual": "msecret"
            })
        );
    }

    #[test]
    fn test_discovery_auth_serialized() {
        let disc = DiscoveryAuth::new(false, ChapCredentials::new("duser", "dsecret"));
        let value = serde_json::to_value(&disc).unwrap();
        assert_eq!(
            value,
            json!({"auth": "disable", "userid": "duser", "password": "dsecret"})
        );
    }

    #[test]
    fn test_auth_entry_without_credentials() {
        let entry = AuthEntry::new(AuthKind::None, "iqn.2016-11.org.example:t1");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({"authentication": "none", "target": "iqn.2016-11.org.example:t1"})
        );
    }

    #[test]
    fn test_auth_entry_builder() {
        let entry = AuthEntry::new(AuthKind::Tpg, "t1")
            .with_tpg(ChapCredentials::new("u", "p"))
            .with_discovery(DiscoveryAuth::new(true, ChapCredentials::new("du", "dp")));
        assert!(entry.tpg.is_some());
        assert!(entry.discovery.as_ref().unwrap().enabled);
    }
}
