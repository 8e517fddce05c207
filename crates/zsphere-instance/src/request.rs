//! Provisioning request builder
//!
//! Turns a [`VmInstanceSpec`] into the exact [`CreateVmInstanceParam`] the
//! platform expects. Everything that can be rejected from the spec alone is
//! checked by [`check`] before the first remote call is made.

use crate::disk::validate_disk_placement;
use crate::error::{InstanceError, Result};
use crate::spec::{DiskSpec, VmInstanceSpec, non_empty};
use std::str::FromStr;
use zsphere_cloud::{CloudApi, CreateVmInstanceParam, Image, InstanceStrategy, system_tag, units};

const AARCH64: &str = "aarch64";

/// Firmware the instance boots with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    Uefi,
    Legacy,
}

impl BootMode {
    /// aarch64 only boots UEFI; everything else defaults to legacy BIOS
    pub fn for_architecture(architecture: Option<&str>) -> Self {
        match architecture {
            Some(AARCH64) => BootMode::Uefi,
            _ => BootMode::Legacy,
        }
    }

    pub fn system_tag(self) -> &'static str {
        match self {
            BootMode::Uefi => system_tag::BOOT_MODE_UEFI,
            BootMode::Legacy => system_tag::BOOT_MODE_LEGACY,
        }
    }
}

impl FromStr for BootMode {
    type Err = InstanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "uefi" => Ok(BootMode::Uefi),
            "legacy" => Ok(BootMode::Legacy),
            _ => Err(InstanceError::Configuration(format!(
                "boot mode {} is invalid, valid value is uefi or legacy",
                s
            ))),
        }
    }
}

/// A spec that passed every static check, with units already converted
#[derive(Debug)]
pub struct CheckedSpec<'a> {
    spec: &'a VmInstanceSpec,
    boot_mode: Option<BootMode>,
    strategy: Option<InstanceStrategy>,
    default_l3: Option<&'a str>,
    root_disk_size: Option<u64>,
    data_disk_sizes: Vec<u64>,
    memory_size: Option<u64>,
}

/// Validate everything that does not need the platform
pub fn check(spec: &VmInstanceSpec) -> Result<CheckedSpec<'_>> {
    if spec.name.is_empty() {
        return Err(config_error("name cannot be empty"));
    }
    if spec.image_uuid.is_empty() {
        return Err(config_error("image_uuid cannot be empty"));
    }

    let boot_mode = non_empty(&spec.boot_mode)
        .map(BootMode::from_str)
        .transpose()?;

    let strategy = non_empty(&spec.strategy)
        .map(|s| {
            s.parse::<InstanceStrategy>()
                .map_err(|e| InstanceError::Configuration(e.to_string()))
        })
        .transpose()?;

    let default_l3 = check_network_interfaces(spec)?;

    let root_disk_size = spec
        .root_disk
        .as_ref()
        .and_then(|disk| disk.size)
        .map(|gb| disk_bytes(gb, "root disk"))
        .transpose()?;

    let data_disk_sizes = spec
        .data_disks
        .iter()
        .enumerate()
        .map(|(i, disk)| match disk.size {
            Some(gb) => disk_bytes(gb, &format!("data disk {}", i)),
            None => Err(config_error(format!("data disk {} must specify a size", i))),
        })
        .collect::<Result<Vec<_>>>()?;

    let memory_size = spec
        .memory_size
        .map(|mb| {
            units::mb_to_bytes(mb)
                .ok_or_else(|| config_error(format!("memory size {} MB is too large", mb)))
        })
        .transpose()?;

    Ok(CheckedSpec {
        spec,
        boot_mode,
        strategy,
        default_l3,
        root_disk_size,
        data_disk_sizes,
        memory_size,
    })
}

/// At least one interface, at most one default, and the default's network
fn check_network_interfaces(spec: &VmInstanceSpec) -> Result<Option<&str>> {
    if spec.network_interfaces.is_empty() {
        return Err(config_error(
            "network_interfaces cannot be empty, at least one L3 network must be specified",
        ));
    }

    if let Some(i) = spec
        .network_interfaces
        .iter()
        .position(|nic| nic.l3_network_uuid.is_empty())
    {
        return Err(config_error(format!(
            "network interface {} has an empty l3_network_uuid",
            i
        )));
    }

    let defaults: Vec<&str> = spec
        .network_interfaces
        .iter()
        .filter(|nic| nic.default_l3)
        .map(|nic| nic.l3_network_uuid.as_str())
        .collect();

    match defaults.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        many => Err(config_error(format!(
            "only one network interface may be default_l3, found {}: {}",
            many.len(),
            many.join(", ")
        ))),
    }
}

fn disk_bytes(gb: u64, what: &str) -> Result<u64> {
    units::gb_to_bytes(gb).ok_or_else(|| config_error(format!("{} size {} GB is too large", what, gb)))
}

fn config_error(message: impl Into<String>) -> InstanceError {
    InstanceError::Configuration(message.into())
}

impl CheckedSpec<'_> {
    /// Assemble the create parameters against the resolved image
    pub fn into_param(self, image: &Image) -> CreateVmInstanceParam {
        let spec = self.spec;
        let mut system_tags = Vec::new();

        for nic in &spec.network_interfaces {
            if let Some(ip) = nic.requested_ip() {
                system_tags.push(system_tag::static_ip(&nic.l3_network_uuid, ip));
            }
        }

        let architecture =
            non_empty(&spec.architecture).or_else(|| non_empty(&image.architecture));
        let boot_mode = self
            .boot_mode
            .unwrap_or_else(|| BootMode::for_architecture(architecture));
        system_tags.push(boot_mode.system_tag().to_string());

        if spec.never_stop {
            system_tags.push(system_tag::HA_NEVER_STOP.to_string());
        }

        if let Some(payload) = non_empty(&spec.user_data) {
            system_tags.push(system_tag::user_data(payload));
        }

        let root_volume_system_tags = spec
            .root_disk
            .as_ref()
            .and_then(DiskSpec::ceph_pool)
            .map(system_tag::ceph_root_pool)
            .into_iter()
            .collect();

        tracing::debug!(
            "Built create request for {}: boot mode {:?}, {} data disk(s), {} system tag(s)",
            spec.name,
            boot_mode,
            self.data_disk_sizes.len(),
            system_tags.len()
        );

        CreateVmInstanceParam {
            name: spec.name.clone(),
            image_uuid: spec.image_uuid.clone(),
            l3_network_uuids: spec
                .network_interfaces
                .iter()
                .map(|nic| nic.l3_network_uuid.clone())
                .collect(),
            default_l3_network_uuid: self.default_l3.map(str::to_string),
            root_disk_size: self.root_disk_size,
            primary_storage_uuid_for_root_volume: spec
                .root_disk
                .as_ref()
                .and_then(DiskSpec::primary_storage)
                .map(str::to_string),
            primary_storage_uuid_for_data_volume: spec
                .data_disks
                .first()
                .and_then(DiskSpec::primary_storage)
                .map(str::to_string),
            data_disk_sizes: self.data_disk_sizes,
            zone_uuid: non_empty(&spec.placement.zone_uuid).map(str::to_string),
            cluster_uuid: non_empty(&spec.placement.cluster_uuid).map(str::to_string),
            host_uuid: non_empty(&spec.placement.host_uuid).map(str::to_string),
            description: non_empty(&spec.description).map(str::to_string),
            strategy: self.strategy,
            memory_size: self.memory_size,
            cpu_num: spec.cpu_num,
            system_tags,
            root_volume_system_tags,
            data_volume_system_tags: data_volume_system_tags(&spec.data_disks),
        }
    }
}

/// One data-disk configuration applies to every data disk; it is taken from
/// the first entry.
fn data_volume_system_tags(data_disks: &[DiskSpec]) -> Vec<String> {
    let Some(first) = data_disks.first() else {
        return Vec::new();
    };

    let virtio_flags: Vec<bool> = data_disks.iter().map(|d| d.virtio_scsi).collect();
    if virtio_flags.iter().any(|flag| *flag != first.virtio_scsi) {
        tracing::warn!(
            "Data disks disagree on virtio_scsi ({:?}); applying the first disk's setting to all",
            virtio_flags
        );
    }

    let mut tags = Vec::new();
    if let Some(pool) = first.ceph_pool() {
        tags.push(system_tag::ceph_pool(pool));
    }
    if first.virtio_scsi {
        tags.push(system_tag::VIRTIO_SCSI.to_string());
    }
    tags
}

/// The image must exist, be enabled and be ready
pub async fn lookup_image(client: &dyn CloudApi, image_uuid: &str) -> Result<Image> {
    let image = client
        .get_image(image_uuid)
        .await
        .map_err(InstanceError::remote(format!("get image {}", image_uuid)))?
        .ok_or_else(|| InstanceError::Precondition(format!("image {} not found", image_uuid)))?;

    if !image.is_ready() {
        return Err(InstanceError::Precondition(format!(
            "image {} status is {}, not Ready",
            image_uuid, image.status
        )));
    }

    if !image.is_enabled() {
        return Err(InstanceError::Precondition(format!(
            "image {} state is {}, not Enabled",
            image_uuid, image.state
        )));
    }

    Ok(image)
}

/// Validate the spec, resolve the image and disk placement, and build the
/// create parameters.
pub async fn build_request(
    client: &dyn CloudApi,
    spec: &VmInstanceSpec,
) -> Result<CreateVmInstanceParam> {
    let checked = check(spec)?;

    let image = lookup_image(client, &spec.image_uuid).await?;

    if let Some(root_disk) = &spec.root_disk {
        validate_disk_placement(client, root_disk).await?;
    }
    if let Some(first_data_disk) = spec.data_disks.first() {
        validate_disk_placement(client, first_data_disk).await?;
    }

    Ok(checked.into_param(&image))
}
