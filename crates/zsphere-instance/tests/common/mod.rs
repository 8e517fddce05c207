use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use zsphere_cloud::{
    AddImageParam, BackupStorage, CloudApi, CloudError, CreateVmInstanceParam, DeleteMode, Image,
    PrimaryStorage, PrimaryStorageQuery, Result, StoragePool, VmInstance, VmNic, Volume,
    VolumeType,
};
use zsphere_instance::{NetworkInterfaceSpec, VmInstanceSpec};

/// A recorded Cloud API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetImage(String),
    CreateVmInstance(String),
    GetVmInstance(String),
    DestroyVmInstance(String, DeleteMode),
    DeleteDataVolume(String, DeleteMode),
    ExpungeVmInstance(String),
    ExpungeDataVolume(String),
    QueryPrimaryStorage(Vec<String>),
    QueryBackupStorage,
    AddImage(String),
    DeleteImage(String, DeleteMode),
    ExpungeImage(String),
}

/// In-memory Cloud API that records every call
#[derive(Default)]
pub struct MockCloud {
    images: Mutex<HashMap<String, Image>>,
    storages: Mutex<Vec<PrimaryStorage>>,
    instances: Mutex<HashMap<String, VmInstance>>,
    create_response: Mutex<Option<VmInstance>>,
    last_create: Mutex<Option<CreateVmInstanceParam>>,
    backup_storages: Mutex<Vec<BackupStorage>>,
    add_image_response: Mutex<Option<Image>>,
    last_add_image: Mutex<Option<AddImageParam>>,
    failing: Mutex<Vec<Call>>,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, image: Image) -> Self {
        self.images.lock().unwrap().insert(image.uuid.clone(), image);
        self
    }

    pub fn with_storage(self, storage: PrimaryStorage) -> Self {
        self.storages.lock().unwrap().push(storage);
        self
    }

    /// What CreateVmInstance returns; it also becomes readable by UUID
    pub fn with_create_response(self, instance: VmInstance) -> Self {
        *self.create_response.lock().unwrap() = Some(instance);
        self
    }

    pub fn with_backup_storage(self, uuid: &str) -> Self {
        self.backup_storages.lock().unwrap().push(BackupStorage {
            uuid: uuid.to_string(),
            name: format!("backup-{}", uuid),
            state: "Enabled".to_string(),
            status: "Connected".to_string(),
        });
        self
    }

    /// What AddImage returns; it also becomes readable by UUID
    pub fn with_add_image_response(self, image: Image) -> Self {
        *self.add_image_response.lock().unwrap() = Some(image);
        self
    }

    pub fn with_instance(self, instance: VmInstance) -> Self {
        self.put_instance(instance);
        self
    }

    pub fn put_instance(&self, instance: VmInstance) {
        self.instances
            .lock()
            .unwrap()
            .insert(instance.uuid.clone(), instance);
    }

    pub fn remove_instance(&self, uuid: &str) {
        self.instances.lock().unwrap().remove(uuid);
    }

    pub fn put_image(&self, image: Image) {
        self.images.lock().unwrap().insert(image.uuid.clone(), image);
    }

    pub fn remove_image(&self, uuid: &str) {
        self.images.lock().unwrap().remove(uuid);
    }

    /// Make the given call fail with an API error
    pub fn fail_on(&self, call: Call) {
        self.failing.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn last_create(&self) -> Option<CreateVmInstanceParam> {
        self.last_create.lock().unwrap().clone()
    }

    pub fn last_add_image(&self) -> Option<AddImageParam> {
        self.last_add_image.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        if self.failing.lock().unwrap().contains(&call) {
            return Err(CloudError::ApiError(format!("injected failure: {:?}", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl CloudApi for MockCloud {
    async fn get_image(&self, uuid: &str) -> Result<Option<Image>> {
        self.record(Call::GetImage(uuid.to_string()))?;
        Ok(self.images.lock().unwrap().get(uuid).cloned())
    }

    async fn create_vm_instance(&self, param: &CreateVmInstanceParam) -> Result<VmInstance> {
        self.record(Call::CreateVmInstance(param.name.clone()))?;
        *self.last_create.lock().unwrap() = Some(param.clone());

        let instance = self
            .create_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CloudError::ApiError("no create response configured".to_string()))?;
        self.put_instance(instance.clone());
        Ok(instance)
    }

    async fn get_vm_instance(&self, uuid: &str) -> Result<Option<VmInstance>> {
        self.record(Call::GetVmInstance(uuid.to_string()))?;
        Ok(self.instances.lock().unwrap().get(uuid).cloned())
    }

    async fn destroy_vm_instance(&self, uuid: &str, mode: DeleteMode) -> Result<()> {
        self.record(Call::DestroyVmInstance(uuid.to_string(), mode))
    }

    async fn delete_data_volume(&self, uuid: &str, mode: DeleteMode) -> Result<()> {
        self.record(Call::DeleteDataVolume(uuid.to_string(), mode))
    }

    async fn expunge_vm_instance(&self, uuid: &str) -> Result<()> {
        self.record(Call::ExpungeVmInstance(uuid.to_string()))?;
        self.remove_instance(uuid);
        Ok(())
    }

    async fn expunge_data_volume(&self, uuid: &str) -> Result<()> {
        self.record(Call::ExpungeDataVolume(uuid.to_string()))
    }

    async fn query_primary_storage(
        &self,
        query: &PrimaryStorageQuery,
    ) -> Result<Vec<PrimaryStorage>> {
        self.record(Call::QueryPrimaryStorage(query.conditions.clone()))?;

        let matches = |storage: &PrimaryStorage| {
            query.conditions.iter().all(|condition| {
                match condition.split_once('=') {
                    Some(("uuid", value)) => storage.uuid == value,
                    Some(("state", value)) => storage.state == value,
                    _ => true,
                }
            })
        };

        let found: Vec<PrimaryStorage> = self
            .storages
            .lock()
            .unwrap()
            .iter()
            .filter(|s| matches(s))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(found)
    }

    async fn query_backup_storage(&self) -> Result<Vec<BackupStorage>> {
        self.record(Call::QueryBackupStorage)?;
        Ok(self.backup_storages.lock().unwrap().clone())
    }

    async fn add_image(&self, param: &AddImageParam) -> Result<Image> {
        self.record(Call::AddImage(param.name.clone()))?;
        *self.last_add_image.lock().unwrap() = Some(param.clone());

        let image = self
            .add_image_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CloudError::ApiError("no add image response configured".to_string()))?;
        self.put_image(image.clone());
        Ok(image)
    }

    async fn delete_image(&self, uuid: &str, mode: DeleteMode) -> Result<()> {
        self.record(Call::DeleteImage(uuid.to_string(), mode))
    }

    async fn expunge_image(&self, uuid: &str) -> Result<()> {
        self.record(Call::ExpungeImage(uuid.to_string()))?;
        self.remove_image(uuid);
        Ok(())
    }
}

// Fixtures

#[allow(dead_code)]
pub fn image(uuid: &str, architecture: &str) -> Image {
    Image {
        uuid: uuid.to_string(),
        name: format!("image-{}", uuid),
        state: "Enabled".to_string(),
        status: "Ready".to_string(),
        architecture: Some(architecture.to_string()),
        platform: Some("Linux".to_string()),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn storage(uuid: &str, state: &str, pools: &[&str]) -> PrimaryStorage {
    PrimaryStorage {
        uuid: uuid.to_string(),
        name: format!("storage-{}", uuid),
        state: state.to_string(),
        status: "Connected".to_string(),
        pools: pools
            .iter()
            .map(|p| StoragePool {
                pool_name: p.to_string(),
            })
            .collect(),
    }
}

#[allow(dead_code)]
pub fn vm_nic(l3: &str, ip: &str) -> VmNic {
    VmNic {
        uuid: format!("nic-{}", l3),
        l3_network_uuid: l3.to_string(),
        ip: ip.to_string(),
        netmask: "255.255.255.0".to_string(),
        gateway: "10.0.0.1".to_string(),
    }
}

#[allow(dead_code)]
pub fn volume(uuid: &str, volume_type: VolumeType, primary_storage_uuid: &str) -> Volume {
    Volume {
        uuid: uuid.to_string(),
        volume_type,
        size: 10 * 1024 * 1024 * 1024,
        format: "qcow2".to_string(),
        primary_storage_uuid: primary_storage_uuid.to_string(),
        state: "Enabled".to_string(),
        status: "Ready".to_string(),
    }
}

#[allow(dead_code)]
pub fn vm_instance(uuid: &str, name: &str, nics: Vec<VmNic>, volumes: Vec<Volume>) -> VmInstance {
    let default_l3 = nics.first().map(|n| n.l3_network_uuid.clone());
    VmInstance {
        uuid: uuid.to_string(),
        name: name.to_string(),
        description: String::new(),
        image_uuid: "img-1".to_string(),
        cpu_num: 2,
        memory_size: 2048 * 1024 * 1024,
        default_l3_network_uuid: default_l3,
        vm_nics: nics,
        all_volumes: volumes,
    }
}

#[allow(dead_code)]
pub fn nic_spec(l3: &str, default_l3: bool, static_ip: Option<&str>) -> NetworkInterfaceSpec {
    NetworkInterfaceSpec {
        l3_network_uuid: l3.to_string(),
        default_l3,
        static_ip: static_ip.map(str::to_string),
    }
}

#[allow(dead_code)]
pub fn basic_spec(name: &str) -> VmInstanceSpec {
    VmInstanceSpec {
        name: name.to_string(),
        image_uuid: "img-1".to_string(),
        network_interfaces: vec![nic_spec("l3-a", true, None)],
        ..Default::default()
    }
}
