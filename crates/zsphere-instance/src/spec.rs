//! Desired state of a VM instance
//!
//! Values arrive already parsed from user configuration. Enumerated fields
//! (boot mode, strategy) are kept as the raw strings the user wrote and are
//! validated when the provisioning request is built.

use serde::{Deserialize, Serialize};

/// Desired configuration of one VM instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmInstanceSpec {
    pub name: String,

    pub image_uuid: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Number of vCPUs; the platform default is read back when unset
    #[serde(default)]
    pub cpu_num: Option<u32>,

    /// Memory size in MB; the platform default is read back when unset
    #[serde(default)]
    pub memory_size: Option<u64>,

    #[serde(default)]
    pub root_disk: Option<DiskSpec>,

    /// Only the first entry's pool and placement apply to every data disk
    #[serde(default)]
    pub data_disks: Vec<DiskSpec>,

    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterfaceSpec>,

    #[serde(default)]
    pub placement: Placement,

    /// Overrides the image's architecture for boot mode defaulting
    #[serde(default)]
    pub architecture: Option<String>,

    /// "uefi" or "legacy", case-insensitive
    #[serde(default)]
    pub boot_mode: Option<String>,

    /// "InstantStart" or "CreateStopped"
    #[serde(default)]
    pub strategy: Option<String>,

    #[serde(default)]
    pub never_stop: bool,

    #[serde(default)]
    pub user_data: Option<String>,

    /// Expunge the instance and its data volumes after deleting them
    #[serde(default)]
    pub expunge: bool,
}

/// Root or data disk configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpec {
    /// Size in GB
    #[serde(default)]
    pub size: Option<u64>,

    #[serde(default)]
    pub primary_storage_uuid: Option<String>,

    #[serde(default)]
    pub ceph_pool_name: Option<String>,

    #[serde(default)]
    pub virtio_scsi: bool,
}

impl DiskSpec {
    pub fn primary_storage(&self) -> Option<&str> {
        non_empty(&self.primary_storage_uuid)
    }

    pub fn ceph_pool(&self) -> Option<&str> {
        non_empty(&self.ceph_pool_name)
    }
}

/// Network attachment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterfaceSpec {
    pub l3_network_uuid: String,

    /// Whether this interface carries the default route
    #[serde(default)]
    pub default_l3: bool,

    /// `None` means the address is not pinned by the user
    #[serde(default)]
    pub static_ip: Option<String>,
}

impl NetworkInterfaceSpec {
    pub fn requested_ip(&self) -> Option<&str> {
        non_empty(&self.static_ip)
    }
}

/// Optional scheduling hints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(default)]
    pub zone_uuid: Option<String>,

    #[serde(default)]
    pub cluster_uuid: Option<String>,

    #[serde(default)]
    pub host_uuid: Option<String>,
}

/// Treat an empty string the same as an unset value
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
