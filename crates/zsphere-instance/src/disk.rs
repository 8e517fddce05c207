//! Disk placement validation

use crate::error::{InstanceError, Result};
use crate::spec::DiskSpec;
use zsphere_cloud::{CloudApi, PrimaryStorageQuery};

/// Confirm that a disk's primary storage exists, is enabled and, when a
/// Ceph pool is named, reports that pool.
///
/// Succeeds without any remote call when the disk names no primary storage.
pub async fn validate_disk_placement(client: &dyn CloudApi, disk: &DiskSpec) -> Result<()> {
    let Some(storage_uuid) = disk.primary_storage() else {
        return Ok(());
    };

    let query = PrimaryStorageQuery::new()
        .add_q(format!("uuid={}", storage_uuid))
        .add_q("state=Enabled")
        .limit(1);

    let storages = client
        .query_primary_storage(&query)
        .await
        .map_err(InstanceError::remote(format!(
            "query primary storage {}",
            storage_uuid
        )))?;

    let Some(storage) = storages.first() else {
        return Err(InstanceError::Precondition(format!(
            "unable to find enabled primary storage {}",
            storage_uuid
        )));
    };

    if let Some(pool_name) = disk.ceph_pool() {
        if !storage.has_pool(pool_name) {
            return Err(InstanceError::Precondition(format!(
                "unable to find pool name {} on primary storage {}",
                pool_name, storage_uuid
            )));
        }
    }

    tracing::debug!("Primary storage {} accepted for disk", storage_uuid);
    Ok(())
}
