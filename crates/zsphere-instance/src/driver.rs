//! Reconciliation driver backed by the local state file
//!
//! Serializes operations through the state lock and persists each
//! record after every lifecycle call.

use crate::error::{InstanceError, Result};
use crate::lifecycle::{InstanceLifecycle, RefreshOutcome};
use crate::record::InstanceRecord;
use crate::spec::VmInstanceSpec;
use std::path::Path;
use std::sync::Arc;
use zsphere_cloud::{ApplyResult, CloudApi, GlobalState, StateLock, StateManager};
use zsphere_config::ClientConfig;

pub struct InstanceReconciler {
    lifecycle: InstanceLifecycle,
    state: StateManager,
}

impl InstanceReconciler {
    pub fn new(client: Arc<dyn CloudApi>, project_root: impl AsRef<Path>) -> Self {
        Self {
            lifecycle: InstanceLifecycle::new(client),
            state: StateManager::new(project_root),
        }
    }

    /// Build a reconciler around the client `connector` makes from `config`
    pub fn connect<F>(
        config: &ClientConfig,
        project_root: impl AsRef<Path>,
        connector: F,
    ) -> Result<Self>
    where
        F: FnOnce(&ClientConfig) -> zsphere_cloud::Result<Arc<dyn CloudApi>>,
    {
        let endpoint = config.endpoint();
        tracing::info!("Connecting to ZSphere at {}", endpoint);

        let client =
            connector(config).map_err(InstanceError::remote(format!("connect to {}", endpoint)))?;
        Ok(Self::new(client, project_root))
    }

    /// Bring the instance named by `spec` into existence
    ///
    /// An existing record is refreshed; the instance is created when there
    /// is no record or the refresh finds it gone. A record whose teardown
    /// did not finish is refused until `destroy` completes it.
    pub async fn apply(&self, spec: &VmInstanceSpec) -> Result<InstanceRecord> {
        let lock = self.lock().await?;
        let mut state = self.load().await?;

        let existing = match state.get_resource(&spec.name).cloned() {
            Some(mut record) if record.uuid.is_some() => {
                match self.lifecycle.read(&mut record).await? {
                    RefreshOutcome::Present => Some(record),
                    RefreshOutcome::NotFound => None,
                }
            }
            _ => None,
        };

        let record = match existing {
            Some(record) if record.status.is_partially_deleted() => {
                let status = record.status;
                state.set_resource(spec.name.clone(), record);
                self.save(&state).await?;
                self.unlock(lock).await?;
                return Err(InstanceError::Precondition(format!(
                    "VM instance {} is partially deleted ({}), destroy it before applying again",
                    spec.name, status
                )));
            }
            Some(record) => {
                tracing::info!("VM instance {} already exists", spec.name);
                record
            }
            None => self.lifecycle.create(spec).await?,
        };

        state.set_resource(spec.name.clone(), record.clone());
        self.save(&state).await?;
        self.unlock(lock).await?;
        Ok(record)
    }

    /// Refresh the stored record for `name`, if there is one
    pub async fn refresh(&self, name: &str) -> Result<Option<InstanceRecord>> {
        let lock = self.lock().await?;
        let mut state = self.load().await?;

        let Some(mut record) = state.get_resource(name).cloned() else {
            self.unlock(lock).await?;
            return Ok(None);
        };

        self.lifecycle.read(&mut record).await?;
        state.set_resource(name, record.clone());
        self.save(&state).await?;
        self.unlock(lock).await?;
        Ok(Some(record))
    }

    /// Delete the instance recorded under `name` and forget it
    ///
    /// On failure the record is kept with its partial-teardown status.
    pub async fn destroy(&self, name: &str) -> Result<ApplyResult> {
        let lock = self.lock().await?;
        let mut state = self.load().await?;

        let Some(mut record) = state.get_resource(name).cloned() else {
            tracing::warn!("No state recorded for {}, nothing to destroy", name);
            self.unlock(lock).await?;
            return Ok(ApplyResult::new());
        };

        match self.lifecycle.delete(&mut record).await {
            Ok(result) => {
                state.remove_resource(name);
                self.save(&state).await?;
                self.unlock(lock).await?;
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(
                    "Destroy of {} failed with status {}: {}",
                    name,
                    record.status,
                    e
                );
                state.set_resource(name, record);
                self.save(&state).await?;
                self.unlock(lock).await?;
                Err(e)
            }
        }
    }

    async fn lock(&self) -> Result<StateLock> {
        self.state.acquire_lock().await.map_err(InstanceError::State)
    }

    async fn unlock(&self, lock: StateLock) -> Result<()> {
        lock.release().await.map_err(InstanceError::State)
    }

    async fn load(&self) -> Result<GlobalState<InstanceRecord>> {
        self.state.load().await.map_err(InstanceError::State)
    }

    async fn save(&self, state: &GlobalState<InstanceRecord>) -> Result<()> {
        self.state.save(state).await.map_err(InstanceError::State)
    }
}
