//! Image lifecycle: add, refresh and delete an image on backup storage
//!
//! Shares boot-mode resolution with instance provisioning and runs its
//! deletion through the same plan executor.

use crate::error::{InstanceError, Result};
use crate::lifecycle::RefreshOutcome;
use crate::request::BootMode;
use crate::spec::non_empty;
use crate::teardown::{execute, plan_image_teardown};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use zsphere_cloud::{
    ActionType, AddImageParam, ApplyResult, CloudApi, Image, ImageFormat, MediaType,
    ResourceStatus,
};

const DEFAULT_GUEST_OS_TYPE: &str = "Linux";
const DEFAULT_PLATFORM: &str = "Linux";

/// Desired state of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// File path or HTTP link the platform downloads the image from
    pub url: String,

    #[serde(default)]
    pub media_type: Option<MediaType>,

    /// Defaults to "Linux"
    #[serde(default)]
    pub guest_os_type: Option<String>,

    /// Defaults to "Linux"
    #[serde(default)]
    pub platform: Option<String>,

    pub format: ImageFormat,

    /// Backup storages to add the image to; the first one the platform
    /// lists is used when unset
    #[serde(default)]
    pub image_storage_uuids: Option<Vec<String>>,

    #[serde(default)]
    pub architecture: Option<String>,

    #[serde(default)]
    pub virtio: bool,

    /// "uefi" or "legacy", case-insensitive; derived from the
    /// architecture when unset
    #[serde(default)]
    pub boot_mode: Option<String>,

    /// Expunge the image after deleting it
    #[serde(default)]
    pub expunge: bool,
}

/// What is recorded locally for a managed image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub uuid: Option<String>,

    pub status: ResourceStatus,

    pub config: ImageSpec,

    /// Whether the platform treats it as a system image
    #[serde(default)]
    pub system: bool,
}

impl ImageRecord {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn forget(&mut self) {
        self.uuid = None;
        self.status = ResourceStatus::Absent;
    }
}

/// Validate everything that does not need the platform
fn check_image(spec: &ImageSpec) -> Result<BootMode> {
    if spec.name.is_empty() {
        return Err(InstanceError::Configuration(
            "image name cannot be empty".to_string(),
        ));
    }
    if spec.url.is_empty() {
        return Err(InstanceError::Configuration(format!(
            "image {} must specify a url",
            spec.name
        )));
    }
    if let Some(uuids) = &spec.image_storage_uuids {
        if uuids.is_empty() || uuids.iter().any(String::is_empty) {
            return Err(InstanceError::Configuration(format!(
                "image {} has an empty image_storage_uuids entry",
                spec.name
            )));
        }
    }

    match non_empty(&spec.boot_mode) {
        Some(mode) => BootMode::from_str(mode),
        None => Ok(BootMode::for_architecture(non_empty(&spec.architecture))),
    }
}

fn add_image_param(
    spec: &ImageSpec,
    boot_mode: BootMode,
    backup_storage_uuids: Vec<String>,
) -> AddImageParam {
    AddImageParam {
        name: spec.name.clone(),
        description: spec.description.clone().unwrap_or_default(),
        url: spec.url.clone(),
        media_type: spec.media_type,
        guest_os_type: non_empty(&spec.guest_os_type)
            .unwrap_or(DEFAULT_GUEST_OS_TYPE)
            .to_string(),
        system: false,
        format: spec.format,
        platform: non_empty(&spec.platform)
            .unwrap_or(DEFAULT_PLATFORM)
            .to_string(),
        backup_storage_uuids,
        architecture: non_empty(&spec.architecture).map(str::to_string),
        virtio: spec.virtio,
        system_tags: vec![boot_mode.system_tag().to_string()],
    }
}

/// Drives one image through its lifecycle against the Cloud API
pub struct ImageLifecycle {
    client: Arc<dyn CloudApi>,
}

impl ImageLifecycle {
    pub fn new(client: Arc<dyn CloudApi>) -> Self {
        Self { client }
    }

    /// Validate, add and record a new image
    pub async fn create(&self, spec: &ImageSpec) -> Result<ImageRecord> {
        tracing::info!("Adding image: {}", spec.name);

        let boot_mode = check_image(spec)?;
        let backup_storage_uuids = self.backup_storage_uuids(spec).await?;
        let param = add_image_param(spec, boot_mode, backup_storage_uuids);

        let image = self
            .client
            .add_image(&param)
            .await
            .map_err(InstanceError::remote(format!("add image {}", spec.name)))?;

        tracing::info!("Added image {} (UUID: {})", image.name, image.uuid);

        let mut config = spec.clone();
        config.description = Some(image.description.clone());
        config.guest_os_type = Some(image.guest_os_type.clone());
        config.platform = image.platform.clone();

        let mut record = ImageRecord {
            uuid: None,
            status: ResourceStatus::Present,
            config,
            system: false,
        };
        apply_identity(&mut record, &image);
        Ok(record)
    }

    /// Refresh a stored record from the platform
    ///
    /// Optional fields are only refreshed when the record already carries
    /// them.
    pub async fn read(&self, record: &mut ImageRecord) -> Result<RefreshOutcome> {
        let Some(uuid) = record.uuid.clone() else {
            return Ok(RefreshOutcome::NotFound);
        };

        let image = self
            .client
            .get_image(&uuid)
            .await
            .map_err(InstanceError::remote(format!("get image {}", uuid)))?;

        let Some(image) = image else {
            tracing::warn!(
                "Image {} ({}) no longer exists, it will be added again on next apply",
                record.name(),
                uuid
            );
            record.forget();
            return Ok(RefreshOutcome::NotFound);
        };

        apply_identity(record, &image);
        let config = &mut record.config;
        if config.description.is_some() {
            config.description = Some(image.description.clone());
        }
        if config.guest_os_type.is_some() {
            config.guest_os_type = Some(image.guest_os_type.clone());
        }
        if config.platform.is_some() {
            config.platform = image.platform.clone();
        }
        if !record.status.is_partially_deleted() {
            record.status = ResourceStatus::Present;
        }

        tracing::debug!("Refreshed image {} ({})", record.name(), uuid);
        Ok(RefreshOutcome::Present)
    }

    /// Delete the image in enforcing mode, then expunge it if configured
    pub async fn delete(&self, record: &mut ImageRecord) -> Result<ApplyResult> {
        let Some(uuid) = record.uuid.clone() else {
            tracing::warn!("Image {} has no UUID, nothing to delete", record.name());
            return Ok(ApplyResult::new());
        };

        let image = self
            .client
            .get_image(&uuid)
            .await
            .map_err(InstanceError::remote(format!("get image {}", uuid)))?;
        if image.is_none() {
            tracing::warn!("Image {} is already gone, skipping delete", uuid);
            record.forget();
            return Ok(ApplyResult::new());
        }

        let plan = plan_image_teardown(&uuid, record.config.expunge);
        tracing::info!("Deleting image {}: {}", uuid, plan.summary());

        let status = &mut record.status;
        let result = execute(self.client.as_ref(), &plan, |action| {
            if action.step.action_type() == ActionType::Delete {
                *status = ResourceStatus::DeleteIssued;
            }
        })
        .await?;

        record.forget();
        tracing::info!("Deleted image {} in {}ms", uuid, result.duration_ms);
        Ok(result)
    }

    async fn backup_storage_uuids(&self, spec: &ImageSpec) -> Result<Vec<String>> {
        if let Some(uuids) = &spec.image_storage_uuids {
            return Ok(uuids.clone());
        }

        let storages = self
            .client
            .query_backup_storage()
            .await
            .map_err(InstanceError::remote("query backup storage"))?;

        let first = storages.into_iter().next().ok_or_else(|| {
            InstanceError::Precondition(format!(
                "no image storage available for image {}",
                spec.name
            ))
        })?;

        tracing::debug!("Image {} defaults to image storage {}", spec.name, first.uuid);
        Ok(vec![first.uuid])
    }
}

fn apply_identity(record: &mut ImageRecord, image: &Image) {
    record.uuid = Some(image.uuid.clone());
    record.config.name = image.name.clone();
    record.config.url = image.url.clone();
    record.system = image.system;
}
