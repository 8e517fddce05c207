//! Cloud API client trait definition

use crate::error::Result;
use crate::model::{
    AddImageParam, BackupStorage, CreateVmInstanceParam, DeleteMode, Image, PrimaryStorage,
    PrimaryStorageQuery, VmInstance,
};
use async_trait::async_trait;

/// Remote procedure interface of the ZSphere management node
///
/// Implementations are expected to be authenticated and connected already.
/// Lookups that can miss return `Ok(None)` for "not found" and reserve `Err`
/// for failures of the call itself.
///
/// The lifecycle code receives the handle as `Arc<dyn CloudApi>` and only
/// ever reads through it, so one client can be shared by every component.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Look up an image by UUID
    async fn get_image(&self, uuid: &str) -> Result<Option<Image>>;

    /// Create a VM instance and return the platform's view of it
    async fn create_vm_instance(&self, param: &CreateVmInstanceParam) -> Result<VmInstance>;

    /// Look up a VM instance by UUID
    async fn get_vm_instance(&self, uuid: &str) -> Result<Option<VmInstance>>;

    /// Destroy (soft-delete) a VM instance
    async fn destroy_vm_instance(&self, uuid: &str, mode: DeleteMode) -> Result<()>;

    /// Delete (soft-delete) a data volume
    async fn delete_data_volume(&self, uuid: &str, mode: DeleteMode) -> Result<()>;

    /// Permanently remove an already destroyed VM instance
    async fn expunge_vm_instance(&self, uuid: &str) -> Result<()>;

    /// Permanently remove an already deleted data volume
    async fn expunge_data_volume(&self, uuid: &str) -> Result<()>;

    /// Query primary storages matching the given conditions
    async fn query_primary_storage(&self, query: &PrimaryStorageQuery)
    -> Result<Vec<PrimaryStorage>>;

    /// List backup storages, in the platform's order
    async fn query_backup_storage(&self) -> Result<Vec<BackupStorage>>;

    /// Add an image to backup storage and return the platform's view of it
    async fn add_image(&self, param: &AddImageParam) -> Result<Image>;

    /// Delete (soft-delete) an image
    async fn delete_image(&self, uuid: &str, mode: DeleteMode) -> Result<()>;

    /// Permanently remove an already deleted image
    async fn expunge_image(&self, uuid: &str) -> Result<()>;
}
