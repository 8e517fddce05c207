//! VM instance and image lifecycle reconciler for ZSphere
//!
//! Takes a declarative [`VmInstanceSpec`], provisions it through a
//! [`CloudApi`](zsphere_cloud::CloudApi) handle, folds the platform's
//! response back into an [`InstanceRecord`], and tears it down again with
//! its data volumes. Images are managed the same way through
//! [`ImageLifecycle`].
//!
//! # Components
//!
//! - [`disk`]: primary storage / Ceph pool validation
//! - [`request`]: spec to `CreateVmInstanceParam`, including system tags
//! - [`network`]: static-IP and default-route reconciliation
//! - [`lifecycle`]: Create / Read / Delete sequencing
//! - [`teardown`]: ordered destroy, delete and expunge calls
//! - [`image`]: add, refresh and delete images on backup storage
//! - [`driver`]: the above backed by the local state file
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zsphere_instance::{InstanceLifecycle, VmInstanceSpec};
//!
//! let lifecycle = InstanceLifecycle::new(Arc::new(client));
//! let mut record = lifecycle.create(&spec).await?;
//!
//! // Later: refresh, then tear down
//! lifecycle.read(&mut record).await?;
//! lifecycle.delete(&mut record).await?;
//! ```

pub mod disk;
pub mod driver;
pub mod error;
pub mod image;
pub mod lifecycle;
pub mod network;
pub mod record;
pub mod request;
pub mod spec;
pub mod teardown;

pub use driver::InstanceReconciler;
pub use error::{InstanceError, Result};
pub use image::{ImageLifecycle, ImageRecord, ImageSpec};
pub use lifecycle::{InstanceLifecycle, RefreshOutcome};
pub use record::{InstanceRecord, NicRecord};
pub use request::{BootMode, build_request};
pub use spec::{DiskSpec, NetworkInterfaceSpec, Placement, VmInstanceSpec};
