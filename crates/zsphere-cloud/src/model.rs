//! Platform models exchanged with the management node

use crate::error::CloudError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Image inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub uuid: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Where the image was added from
    #[serde(default)]
    pub url: String,

    /// Administrative state, e.g. "Enabled"
    pub state: String,

    /// Readiness status, e.g. "Ready"
    pub status: String,

    #[serde(default)]
    pub guest_os_type: String,

    /// Set by the platform for its own system images
    #[serde(default)]
    pub system: bool,

    #[serde(default)]
    pub architecture: Option<String>,

    #[serde(default)]
    pub platform: Option<String>,
}

impl Image {
    pub fn is_ready(&self) -> bool {
        self.status == "Ready"
    }

    pub fn is_enabled(&self) -> bool {
        self.state == "Enabled"
    }
}

/// VM instance inventory as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmInstance {
    pub uuid: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub image_uuid: String,

    pub cpu_num: u32,

    /// Memory size in bytes
    pub memory_size: u64,

    #[serde(default)]
    pub default_l3_network_uuid: Option<String>,

    #[serde(default)]
    pub vm_nics: Vec<VmNic>,

    #[serde(default)]
    pub all_volumes: Vec<Volume>,
}

impl VmInstance {
    /// Realized nic attached to the given L3 network
    pub fn nic_on(&self, l3_network_uuid: &str) -> Option<&VmNic> {
        self.vm_nics
            .iter()
            .find(|n| n.l3_network_uuid == l3_network_uuid)
    }

    /// Data volumes in the order the platform reported them
    pub fn data_volumes(&self) -> impl Iterator<Item = &Volume> {
        self.all_volumes
            .iter()
            .filter(|v| v.volume_type == VolumeType::Data)
    }

    /// The platform's default-route network, if it reported a non-empty one
    pub fn default_network(&self) -> Option<&str> {
        self.default_l3_network_uuid
            .as_deref()
            .filter(|uuid| !uuid.is_empty())
    }
}

/// Realized network interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmNic {
    pub uuid: String,

    pub l3_network_uuid: String,

    #[serde(default)]
    pub ip: String,

    #[serde(default)]
    pub netmask: String,

    #[serde(default)]
    pub gateway: String,
}

/// Volume role on an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeType {
    Root,
    Data,
}

/// Volume inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub uuid: String,

    #[serde(rename = "type")]
    pub volume_type: VolumeType,

    /// Size in bytes
    pub size: u64,

    #[serde(default)]
    pub format: String,

    #[serde(default)]
    pub primary_storage_uuid: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub status: String,
}

/// Primary storage inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryStorage {
    pub uuid: String,

    pub name: String,

    pub state: String,

    pub status: String,

    /// Ceph pools, empty for other storage types
    #[serde(default)]
    pub pools: Vec<StoragePool>,
}

impl PrimaryStorage {
    pub fn has_pool(&self, pool_name: &str) -> bool {
        self.pools.iter().any(|p| p.pool_name == pool_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePool {
    pub pool_name: String,
}

/// Condition query for primary storages (`field=value` conditions)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryStorageQuery {
    pub conditions: Vec<String>,

    pub limit: Option<usize>,
}

impl PrimaryStorageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_q(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Backup (image) storage inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStorage {
    pub uuid: String,

    pub name: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub status: String,
}

/// Image file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Qcow2,
    Iso,
    Raw,
    Vmdk,
}

/// What an image is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "ISO")]
    Iso,
    RootVolumeTemplate,
    DataVolumeTemplate,
}

/// Parameters of an AddImage call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddImageParam {
    pub name: String,

    pub description: String,

    pub url: String,

    pub media_type: Option<MediaType>,

    pub guest_os_type: String,

    pub system: bool,

    pub format: ImageFormat,

    pub platform: String,

    pub backup_storage_uuids: Vec<String>,

    pub architecture: Option<String>,

    pub virtio: bool,

    pub system_tags: Vec<String>,
}

/// How strictly a delete call treats dependent resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteMode {
    /// Tolerates resources that are already gone
    Permissive,
    Enforcing,
}

/// Deployment strategy for a new instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceStrategy {
    InstantStart,
    CreateStopped,
}

impl FromStr for InstanceStrategy {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "InstantStart" => Ok(InstanceStrategy::InstantStart),
            "CreateStopped" => Ok(InstanceStrategy::CreateStopped),
            other => Err(CloudError::InvalidValue(format!(
                "strategy {} is invalid, valid value is InstantStart or CreateStopped",
                other
            ))),
        }
    }
}

impl std::fmt::Display for InstanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceStrategy::InstantStart => write!(f, "InstantStart"),
            InstanceStrategy::CreateStopped => write!(f, "CreateStopped"),
        }
    }
}

/// Parameters of a CreateVmInstance call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVmInstanceParam {
    pub name: String,

    pub image_uuid: String,

    pub l3_network_uuids: Vec<String>,

    pub default_l3_network_uuid: Option<String>,

    /// Root disk size in bytes
    pub root_disk_size: Option<u64>,

    pub primary_storage_uuid_for_root_volume: Option<String>,

    pub primary_storage_uuid_for_data_volume: Option<String>,

    /// Data disk sizes in bytes
    pub data_disk_sizes: Vec<u64>,

    pub zone_uuid: Option<String>,

    pub cluster_uuid: Option<String>,

    pub host_uuid: Option<String>,

    pub description: Option<String>,

    pub strategy: Option<InstanceStrategy>,

    /// Memory size in bytes
    pub memory_size: Option<u64>,

    pub cpu_num: Option<u32>,

    pub system_tags: Vec<String>,

    pub root_volume_system_tags: Vec<String>,

    pub data_volume_system_tags: Vec<String>,
}
