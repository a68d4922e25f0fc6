//! Integration tests for iscsi-conf
//!
//! These drive the public API end to end: persisted documents through
//! `parse`, UI state through `synthesize`, and the model back out through
//! `to_document`.

use std::io::Write;

use serde_json::{Value, json};
use tempfile::NamedTempFile;

use iscsi_conf::{
    AuthKind, Parser, Section, SectionError, UiTarget, parse, read_document, synthesize,
    synthesize_value,
};

fn lrbd_document() -> Value {
    json!({
        "targets": [
            {
                "target": "iqn.2016-11.org.example:demo",
                "hosts": [
                    {"host": "igw1", "portal": "portal-igw1"},
                    {"host": "igw2", "portal": "portal-igw2"}
                ],
                "tpg_default_cmdsn_depth": "64"
            }
        ],
        "auth": [
            {
                "authentication": "tpg+identified",
                "target": "iqn.2016-11.org.example:demo",
                "tpg": {"userid": "common1", "password": "pass1"},
                "discovery": {"auth": "disable", "userid": "disc", "password": "dpass"}
            }
        ],
        "portals": [
            {"name": "portal-igw1", "addresses": ["192.168.100.201"]},
            {"name": "portal-igw2", "addresses": ["192.168.100.202"]}
        ],
        "pools": [
            {
                "pool": "rbd",
                "gateways": [
                    {"host": "igw1", "tpg": [
                        {"portal": "portal-igw1", "image": "archive", "initiator": "iqn.1996-04.de.suse:01:e6ca28cc9f20"}
                    ]},
                    {"host": "igw2", "tpg": [
                        {"portal": "portal-igw2", "image": "archive", "initiator": null}
                    ]}
                ]
            }
        ]
    })
}

fn ui_state() -> Value {
    json!([
        {
            "name": "iqn.2016-11.org.example:demo",
            "auth": {
                "userid": "common1",
                "password": "pass1",
                "initiatorList": ["iqn.1996-04.de.suse:01:e6ca28cc9f20"],
                "discoveryAuth": {"enabled": true, "userid": "disc", "password": "dpass"}
            },
            "configList": [
                {
                    "selectedIntfList": [
                        {"node": "igw1", "addr": "192.168.100.201"},
                        {"node": "igw2", "addr": "192.168.100.202"}
                    ],
                    "selectedImgList": [
                        {"pool": "rbd", "img": "archive", "initiatorList": ["iqn.1996-04.de.suse:01:e6ca28cc9f20"]},
                        {"pool": "rbd", "img": "scratch"}
                    ]
                },
                {
                    "selectedIntfList": [{"node": "igw1", "addr": "10.0.0.201"}],
                    "selectedImgList": [{"pool": "rbd", "img": "scratch"}]
                }
            ]
        },
        {
            "name": "iqn.2016-11.org.example:open",
            "configList": [
                {
                    "selectedIntfList": [{"node": "igw1", "addr": "192.168.100.201"}],
                    "selectedImgList": [{"pool": "ssd", "img": "fast"}]
                }
            ]
        }
    ])
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_single_target_scenario() {
    let doc = json!({
        "targets": [{"target": "iqn.t1", "hosts": [{"host": "h1", "portal": "p1"}]}],
        "auth": [],
        "portals": [{"name": "p1", "addresses": ["10.0.0.1"]}],
        "pools": [{"pool": "rbd", "gateways": [
            {"host": "h1", "tpg": [{"portal": "p1", "image": "img1", "initiator": null}]}
        ]}]
    });

    let model = parse(&doc).unwrap();
    assert_eq!(model.targets.len(), 1);
    assert_eq!(model.auth.len(), 0);
    assert_eq!(model.portals.len(), 1);
    assert_eq!(model.portals[0].addresses.len(), 1);
    assert_eq!(model.pools.len(), 1);
    assert_eq!(model.pools[0].gateways.len(), 1);
    assert_eq!(model.pools[0].gateways[0].entries.len(), 1);
}

#[test]
fn test_parse_missing_auth_discards_model() {
    let mut doc = lrbd_document();
    doc.as_object_mut().unwrap().remove("auth");

    let err = parse(&doc).unwrap_err();
    assert_eq!(
        err.failures(),
        &[SectionError::MissingSection(Section::Auth)]
    );
}

#[test]
fn test_parse_is_atomic_per_section() {
    // Each single broken section discards an otherwise valid model
    for section in ["auth", "portals", "pools"] {
        let mut doc = lrbd_document();
        doc[section] = json!("not a list");
        let err = parse(&doc).unwrap_err();
        assert_eq!(err.failures().len(), 1, "section {}", section);
        assert!(!err.is_fatal());
    }
}

#[test]
fn test_parse_full_document() {
    let model = parse(&lrbd_document()).unwrap();

    let target = model.target("iqn.2016-11.org.example:demo").unwrap();
    assert_eq!(target.hosts.len(), 2);
    assert_eq!(target.custom["tpg_default_cmdsn_depth"], json!("64"));

    let auth = model.auth_for("iqn.2016-11.org.example:demo").unwrap();
    assert_eq!(auth.kind, AuthKind::TpgIdentified);
    assert!(!auth.discovery.as_ref().unwrap().enabled);

    let pool = model.pool("rbd").unwrap();
    assert_eq!(pool.gateways.len(), 2);
    assert!(pool.gateways[1].entries[0].initiator.is_none());
}

#[test]
fn test_parse_then_document_is_stable() {
    let model = parse(&lrbd_document()).unwrap();
    let document = model.to_document().unwrap();
    assert_eq!(document, lrbd_document());
    assert_eq!(parse(&document).unwrap(), model);
}

#[test]
fn test_parse_unresolved_auth_target() {
    let mut doc = lrbd_document();
    doc["auth"][0]["target"] = json!("iqn.2016-11.org.example:gone");

    let err = parse(&doc).unwrap_err();
    assert!(matches!(
        &err.failures()[0],
        SectionError::UnresolvedReference { section: Section::Auth, reference, .. }
            if reference == "iqn.2016-11.org.example:gone"
    ));

    // Disabling the check accepts the dangling entry
    assert!(
        Parser::new()
            .with_reference_check(false)
            .parse(&doc)
            .is_ok()
    );
}

// ============================================================================
// Synthesis
// ============================================================================

#[test]
fn test_synthesize_ui_state() {
    let model = synthesize_value(&ui_state()).unwrap();

    assert_eq!(model.targets.len(), 2);
    let demo = model.target("iqn.2016-11.org.example:demo").unwrap();
    // igw1 is picked in both blocks but appears once
    assert_eq!(demo.hosts.len(), 2);

    assert_eq!(
        model.portal("portal-igw1").unwrap().addresses,
        vec!["192.168.100.201", "10.0.0.201"]
    );

    assert_eq!(
        model.auth_for("iqn.2016-11.org.example:demo").unwrap().kind,
        AuthKind::TpgIdentified
    );
    assert_eq!(
        model.auth_for("iqn.2016-11.org.example:open").unwrap().kind,
        AuthKind::None
    );

    let rbd = model.pool("rbd").unwrap();
    assert_eq!(rbd.gateways.len(), 2);
    // archive (one initiator) + scratch (any initiator); the second block adds nothing new
    assert_eq!(rbd.gateways[0].entries.len(), 2);
    assert!(model.pool("ssd").is_some());
}

#[test]
fn test_synthesize_has_no_duplicates() {
    let model = synthesize_value(&ui_state()).unwrap();

    for target in &model.targets {
        for (i, host) in target.hosts.iter().enumerate() {
            assert!(!target.hosts[i + 1..].contains(host));
        }
    }
    for portal in &model.portals {
        for (i, addr) in portal.addresses.iter().enumerate() {
            assert!(!portal.addresses[i + 1..].contains(addr));
        }
    }
    for pool in &model.pools {
        for gateway in &pool.gateways {
            for (i, entry) in gateway.entries.iter().enumerate() {
                assert!(!gateway.entries[i + 1..].contains(entry));
            }
        }
    }
}

#[test]
fn test_synthesized_model_parses_back() {
    let model = synthesize_value(&ui_state()).unwrap();
    let document = model.to_document().unwrap();
    let reparsed = parse(&document).unwrap();
    assert_eq!(reparsed, model);
}

#[test]
fn test_synthesize_twice_is_identical() {
    let ui: Vec<UiTarget> = serde_json::from_value(ui_state()).unwrap();
    let first = synthesize(&ui).unwrap().to_document().unwrap();
    let second = synthesize(&ui).unwrap().to_document().unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// ============================================================================
// Document reader
// ============================================================================

#[test]
fn test_read_document_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", lrbd_document()).unwrap();

    let doc = read_document(file.path()).unwrap();
    assert!(parse(&doc).is_ok());
}

#[test]
fn test_read_document_invalid_json() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    let err = read_document(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("JSON error"));
}

#[test]
fn test_read_document_missing_file() {
    let err = read_document("/nonexistent/lrbd.conf").unwrap_err();
    assert!(err.to_string().starts_with("I/O error"));
}
