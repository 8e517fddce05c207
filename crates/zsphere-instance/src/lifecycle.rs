//! Lifecycle orchestrator: Create / Read / Delete for one instance
//!
//! ```text
//! Absent ──create──▶ Present ──read──▶ Present
//!                       │        └───▶ Absent (gone remotely)
//!                       └──delete──▶ Deleting ──▶ DeleteIssued ──▶ Absent
//! ```
//!
//! A read never moves a record out of `Deleting` or `DeleteIssued`; only a
//! completed delete, or the instance vanishing, does.

use crate::error::{InstanceError, Result};
use crate::network::{nic_records, realize_requested, reconcile};
use crate::record::InstanceRecord;
use crate::request::build_request;
use crate::spec::VmInstanceSpec;
use crate::teardown::{execute, plan_teardown};
use std::sync::Arc;
use zsphere_cloud::{ActionType, ApplyResult, CloudApi, ResourceStatus, Step, VmInstance, units};

/// Result of refreshing a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The instance exists and the record was updated from it
    Present,
    /// The instance no longer exists; the record's identity was cleared
    NotFound,
}

/// Drives one instance through its lifecycle against the Cloud API
pub struct InstanceLifecycle {
    client: Arc<dyn CloudApi>,
}

impl InstanceLifecycle {
    pub fn new(client: Arc<dyn CloudApi>) -> Self {
        Self { client }
    }

    /// Validate, provision and record a new instance
    ///
    /// Nothing is recorded if any step fails; the whole create has to be
    /// retried.
    pub async fn create(&self, spec: &VmInstanceSpec) -> Result<InstanceRecord> {
        tracing::info!("Creating VM instance: {}", spec.name);

        let param = build_request(self.client.as_ref(), spec).await?;

        let instance = self
            .client
            .create_vm_instance(&param)
            .await
            .map_err(InstanceError::remote(format!("create vm instance {}", spec.name)))?;

        tracing::info!(
            "Created VM instance {} (UUID: {})",
            instance.name,
            instance.uuid
        );

        Ok(record_created(spec, &instance))
    }

    /// Refresh a stored record from the platform
    ///
    /// A missing instance is not an error: the record's UUID is cleared so
    /// the next apply re-creates it.
    pub async fn read(&self, record: &mut InstanceRecord) -> Result<RefreshOutcome> {
        let Some(uuid) = record.uuid.clone() else {
            return Ok(RefreshOutcome::NotFound);
        };

        let instance = self
            .client
            .get_vm_instance(&uuid)
            .await
            .map_err(InstanceError::remote(format!("get vm instance {}", uuid)))?;

        match instance {
            Some(instance) => {
                apply_observed(record, &instance);
                tracing::debug!("Refreshed VM instance {} ({})", record.name(), uuid);
                Ok(RefreshOutcome::Present)
            }
            None => {
                tracing::warn!(
                    "VM instance {} ({}) no longer exists, it will be re-created on next apply",
                    record.name(),
                    uuid
                );
                record.forget();
                Ok(RefreshOutcome::NotFound)
            }
        }
    }

    /// Tear down the instance and its data volumes
    ///
    /// A failure part way leaves the resource partially torn down; the
    /// record's status tells how far it got. It stays unchanged when the
    /// instance could not even be destroyed.
    pub async fn delete(&self, record: &mut InstanceRecord) -> Result<ApplyResult> {
        let Some(uuid) = record.uuid.clone() else {
            tracing::warn!(
                "VM instance {} has no UUID, nothing to delete",
                record.name()
            );
            return Ok(ApplyResult::new());
        };

        // Volumes are enumerated fresh; the record does not track them
        let instance = self
            .client
            .get_vm_instance(&uuid)
            .await
            .map_err(InstanceError::remote(format!("get vm instance {}", uuid)))?;

        let Some(instance) = instance else {
            tracing::warn!("VM instance {} is already gone, skipping delete", uuid);
            record.forget();
            return Ok(ApplyResult::new());
        };

        let plan = plan_teardown(&instance, record.config.expunge);
        tracing::info!("Deleting VM instance {}: {}", uuid, plan.summary());

        let soft_steps = plan
            .actions
            .iter()
            .filter(|a| a.step.action_type() != ActionType::Expunge)
            .count();
        let mut completed = 0;
        let status = &mut record.status;

        let result = execute(self.client.as_ref(), &plan, |action| {
            if action.step == Step::DestroyVmInstance && *status != ResourceStatus::DeleteIssued {
                *status = ResourceStatus::Deleting;
            }
            if action.step.action_type() != ActionType::Expunge {
                completed += 1;
                if completed == soft_steps {
                    *status = ResourceStatus::DeleteIssued;
                }
            }
        })
        .await?;

        record.forget();
        tracing::info!("Deleted VM instance {} in {}ms", uuid, result.duration_ms);
        Ok(result)
    }
}

/// Build the stored record from the create response
fn record_created(spec: &VmInstanceSpec, instance: &VmInstance) -> InstanceRecord {
    let mut config = spec.clone();
    config.network_interfaces = realize_requested(&spec.network_interfaces, instance);

    // Positional: the n-th configured data disk takes the n-th Data volume
    // the platform reported. There is no correlation key to do better.
    for (disk, volume) in config.data_disks.iter_mut().zip(instance.data_volumes()) {
        if !volume.primary_storage_uuid.is_empty() {
            tracing::debug!(
                "Data volume {} placed on primary storage {}",
                volume.uuid,
                volume.primary_storage_uuid
            );
            disk.primary_storage_uuid = Some(volume.primary_storage_uuid.clone());
        }
    }

    let mut record = InstanceRecord {
        uuid: None,
        status: ResourceStatus::Present,
        config,
        vm_nics: Vec::new(),
    };
    apply_identity(&mut record, instance);
    record.vm_nics = nic_records(instance);
    record
}

/// Update a stored record from an observed instance
///
/// A destroyed instance is still reported until it is expunged, so a
/// partial-teardown status survives the refresh.
fn apply_observed(record: &mut InstanceRecord, instance: &VmInstance) {
    apply_identity(record, instance);
    record.config.image_uuid = instance.image_uuid.clone();
    record.config.network_interfaces = reconcile(&record.config.network_interfaces, instance);
    record.vm_nics = nic_records(instance);
    if !record.status.is_partially_deleted() {
        record.status = ResourceStatus::Present;
    }
}

fn apply_identity(record: &mut InstanceRecord, instance: &VmInstance) {
    record.uuid = Some(instance.uuid.clone());
    record.config.name = instance.name.clone();
    record.config.description = Some(instance.description.clone()).filter(|d| !d.is_empty());
    record.config.cpu_num = Some(instance.cpu_num);
    record.config.memory_size = Some(units::bytes_to_mb(instance.memory_size));
}
