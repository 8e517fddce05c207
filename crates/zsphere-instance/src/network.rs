//! Network interface reconciliation
//!
//! The platform never echoes back whether an IP was pinned by the user.
//! Static-IP intent is reconstructed by comparing what was recorded before
//! against what the platform reports now.

use crate::record::NicRecord;
use crate::spec::NetworkInterfaceSpec;
use std::collections::HashMap;
use zsphere_cloud::VmInstance;

/// Interfaces as recorded right after Create
///
/// Keeps the requested order and default flags. An interface without a
/// requested static IP records the IP the platform assigned to it.
pub fn realize_requested(
    requested: &[NetworkInterfaceSpec],
    observed: &VmInstance,
) -> Vec<NetworkInterfaceSpec> {
    requested
        .iter()
        .map(|nic| {
            let static_ip = match nic.requested_ip() {
                Some(ip) => Some(ip.to_string()),
                None => observed
                    .nic_on(&nic.l3_network_uuid)
                    .map(|vm_nic| vm_nic.ip.clone())
                    .filter(|ip| !ip.is_empty()),
            };

            NetworkInterfaceSpec {
                l3_network_uuid: nic.l3_network_uuid.clone(),
                default_l3: nic.default_l3,
                static_ip,
            }
        })
        .collect()
}

/// Interfaces as they should be recorded after a refresh
///
/// One entry per realized nic, in the platform's order. A static IP is kept
/// only when it was recorded before for the same network and the platform
/// still reports exactly that address.
pub fn reconcile(
    previous: &[NetworkInterfaceSpec],
    observed: &VmInstance,
) -> Vec<NetworkInterfaceSpec> {
    let pinned: HashMap<&str, &str> = previous
        .iter()
        .filter_map(|nic| Some((nic.l3_network_uuid.as_str(), nic.requested_ip()?)))
        .collect();

    let default_network = observed.default_network();

    observed
        .vm_nics
        .iter()
        .map(|vm_nic| {
            let l3 = vm_nic.l3_network_uuid.as_str();
            let static_ip = match pinned.get(l3) {
                Some(ip) if *ip == vm_nic.ip => Some(vm_nic.ip.clone()),
                Some(ip) => {
                    tracing::warn!(
                        "Static IP drift on network {}: recorded {}, platform reports {}",
                        l3,
                        ip,
                        vm_nic.ip
                    );
                    None
                }
                None => None,
            };

            NetworkInterfaceSpec {
                l3_network_uuid: l3.to_string(),
                default_l3: default_network == Some(l3),
                static_ip,
            }
        })
        .collect()
}

/// Realized nic details, rebuilt from scratch on every observation
pub fn nic_records(observed: &VmInstance) -> Vec<NicRecord> {
    observed.vm_nics.iter().map(NicRecord::from).collect()
}
