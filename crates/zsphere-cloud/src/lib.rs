//! ZSphere Cloud platform layer
//!
//! This crate holds everything that talks in the platform's vocabulary:
//! the Cloud API client contract, the wire models it exchanges, the
//! system-tag grammar, capacity units and the local state store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                zsphere-instance                  │
//! │      (build request / reconcile / teardown)      │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 zsphere-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │           trait CloudApi { ... }          │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Models/Tags  │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │  ZSphere MN   │
//! │  (remote API) │
//! └───────────────┘
//! ```

pub mod action;
pub mod client;
pub mod error;
pub mod model;
pub mod state;
pub mod system_tag;
pub mod units;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary, ResourceKind, Step};
pub use client::CloudApi;
pub use error::{CloudError, Result};
pub use model::{
    AddImageParam, BackupStorage, CreateVmInstanceParam, DeleteMode, Image, ImageFormat,
    InstanceStrategy, MediaType, PrimaryStorage, PrimaryStorageQuery, StoragePool, VmInstance,
    VmNic, Volume, VolumeType,
};
pub use state::{GlobalState, ResourceStatus, StateLock, StateManager};
