//! Cross-reference validation for a parsed model.
//!
//! Checks that portal names used by target hosts and gateway entries exist
//! in the portal list, and that each auth entry belongs to a known target.

use crate::error::SectionError;
use crate::model::Model;
use crate::types::Section;

/// Collect every dangling reference in `model`.
pub fn check_references(model: &Model) -> Vec<SectionError> {
    let mut unresolved = Vec::new();

    for (index, target) in model.targets.iter().enumerate() {
        for host in &target.hosts {
            if model.portal(&host.portal_name).is_none() {
                unresolved.push(SectionError::UnresolvedReference {
                    section: Section::Targets,
                    index,
                    name: target.name.clone(),
                    kind: "portal",
                    reference: host.portal_name.clone(),
                });
            }
        }
    }

    for (index, auth) in model.auth.iter().enumerate() {
        if model.target(&auth.target).is_none() {
            unresolved.push(SectionError::UnresolvedReference {
                section: Section::Auth,
                index,
                name: auth.kind.to_string(),
                kind: "target",
                reference: auth.target.clone(),
            });
        }
    }

    for (index, pool) in model.pools.iter().enumerate() {
        for gateway in &pool.gateways {
            for entry in &gateway.entries {
                if model.portal(&entry.portal_name).is_none() {
                    unresolved.push(SectionError::UnresolvedReference {
                        section: Section::Pools,
                        index,
                        name: entry.image.clone(),
                        kind: "portal",
                        reference: entry.portal_name.clone(),
                    });
                }
            }
        }
    }

    unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthEntry;
    use crate::model::{GatewayEntry, Pool, PoolGateway, Portal, Target, TargetHost};
    use crate::types::AuthKind;

    fn model() -> Model {
        Model {
            targets: vec![Target::new("iqn.t1").with_host(TargetHost::new("h1", "p1"))],
            auth: vec![AuthEntry::new(AuthKind::None, "iqn.t1")],
            portals: vec![Portal::new("p1").with_address("10.0.0.1")],
            pools: vec![Pool::new("rbd").with_gateway(
                PoolGateway::new("h1").with_entry(GatewayEntry::new("p1", "img1", None)),
            )],
        }
    }

    #[test]
    fn test_consistent_model_has_no_unresolved_references() {
        assert!(check_references(&model()).is_empty());
    }

    #[test]
    fn test_target_host_portal_not_found() {
        let mut model = model();
        model.targets[0].add_host(TargetHost::new("h2", "p2"));
        let unresolved = check_references(&model);
        assert_eq!(unresolved.len(), 1);
        assert!(unresolved[0].to_string().contains("unknown portal 'p2'"));
    }

    #[test]
    fn test_auth_target_not_found() {
        let mut model = model();
        model.auth.push(AuthEntry::new(AuthKind::Tpg, "iqn.missing"));
        let unresolved = check_references(&model);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].section(), Section::Auth);
    }

    #[test]
    fn test_gateway_entry_portal_not_found() {
        let mut model = model();
        model.pools[0].gateways[0].add_entry(GatewayEntry::new("p9", "img2", None));
        let unresolved = check_references(&model);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].section(), Section::Pools);
    }
}
