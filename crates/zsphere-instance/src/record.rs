//! Stored representation of a managed instance

use crate::spec::VmInstanceSpec;
use serde::{Deserialize, Serialize};
use zsphere_cloud::{ResourceStatus, VmNic};

/// What is recorded locally after Create and refreshed by Read
///
/// `config` keeps the desired-state shape, with platform-computed values
/// (cpu, memory, realized static IPs, data disk placement) filled in so
/// that re-applying the same spec is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Platform UUID; `None` once the instance is known to be gone
    pub uuid: Option<String>,

    pub status: ResourceStatus,

    pub config: VmInstanceSpec,

    /// Realized nics as last reported by the platform
    #[serde(default)]
    pub vm_nics: Vec<NicRecord>,
}

impl InstanceRecord {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Drop the remote identity so the next apply re-creates the instance
    pub fn forget(&mut self) {
        self.uuid = None;
        self.status = ResourceStatus::Absent;
    }
}

/// Realized network interface details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicRecord {
    pub uuid: String,
    pub ip: String,
    pub netmask: String,
    pub gateway: String,
}

impl From<&VmNic> for NicRecord {
    fn from(nic: &VmNic) -> Self {
        Self {
            uuid: nic.uuid.clone(),
            ip: nic.ip.clone(),
            netmask: nic.netmask.clone(),
            gateway: nic.gateway.clone(),
        }
    }
}
