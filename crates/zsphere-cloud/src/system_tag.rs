//! System tag grammar
//!
//! System tags are opaque `key::value` or `key::value::value2` strings the
//! platform interprets as directives.

pub const BOOT_MODE_UEFI: &str = "bootMode::UEFI";
pub const BOOT_MODE_LEGACY: &str = "bootMode::Legacy";
pub const HA_NEVER_STOP: &str = "ha::NeverStop";
pub const VIRTIO_SCSI: &str = "capability::virtio-scsi";

const SEPARATOR: &str = "::";

/// `staticIp::<l3-uuid>::<ip>`
pub fn static_ip(l3_network_uuid: &str, ip: &str) -> String {
    join(&["staticIp", l3_network_uuid, ip])
}

/// `userdata::<payload>`
pub fn user_data(payload: &str) -> String {
    join(&["userdata", payload])
}

/// `ceph::rootPoolName::<pool>`
pub fn ceph_root_pool(pool_name: &str) -> String {
    join(&["ceph", "rootPoolName", pool_name])
}

/// `ceph::pool::<pool>`
pub fn ceph_pool(pool_name: &str) -> String {
    join(&["ceph", "pool", pool_name])
}

fn join(parts: &[&str]) -> String {
    parts.join(SEPARATOR)
}
