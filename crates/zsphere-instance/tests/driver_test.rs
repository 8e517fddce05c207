mod common;

use common::{Call, MockCloud, basic_spec, image, vm_instance, vm_nic, volume};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};
use zsphere_cloud::{
    CloudApi, CloudError, DeleteMode, ResourceStatus, StateManager, VolumeType,
};
use zsphere_config::{ClientConfig, Credentials};
use zsphere_instance::{InstanceError, InstanceReconciler, InstanceRecord};

fn setup() -> (TempDir, Arc<MockCloud>, InstanceReconciler) {
    let temp_dir = TempDir::new().unwrap();
    let cloud = Arc::new(
        MockCloud::new()
            .with_image(image("img-1", "x86_64"))
            .with_create_response(vm_instance(
                "vm-1",
                "web-01",
                vec![vm_nic("l3-a", "10.0.0.5")],
                vec![
                    volume("vol-root", VolumeType::Root, "ps-1"),
                    volume("vol-a", VolumeType::Data, "ps-1"),
                ],
            )),
    );
    let client: Arc<dyn CloudApi> = cloud.clone();
    let reconciler = InstanceReconciler::new(client, temp_dir.path());
    (temp_dir, cloud, reconciler)
}

async fn stored(temp_dir: &TempDir, name: &str) -> Option<InstanceRecord> {
    let state = StateManager::new(temp_dir.path())
        .load::<InstanceRecord>()
        .await
        .unwrap();
    state.get_resource(name).cloned()
}

fn creates(cloud: &MockCloud) -> usize {
    cloud
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::CreateVmInstance(_)))
        .count()
}

#[tokio::test]
async fn test_apply_creates_and_persists() {
    let (temp_dir, cloud, reconciler) = setup();

    let record = assert_ok!(reconciler.apply(&basic_spec("web-01")).await);

    assert_eq!(record.uuid.as_deref(), Some("vm-1"));
    assert_eq!(creates(&cloud), 1);
    assert_eq!(stored(&temp_dir, "web-01").await, Some(record));
}

#[tokio::test]
async fn test_apply_twice_does_not_recreate() {
    let (temp_dir, cloud, reconciler) = setup();

    let first = assert_ok!(reconciler.apply(&basic_spec("web-01")).await);
    let second = assert_ok!(reconciler.apply(&basic_spec("web-01")).await);

    assert_eq!(creates(&cloud), 1);
    assert_eq!(first, second);
    assert_eq!(stored(&temp_dir, "web-01").await, Some(second));
}

#[tokio::test]
async fn test_apply_recreates_vanished_instance() {
    let (_temp_dir, cloud, reconciler) = setup();

    assert_ok!(reconciler.apply(&basic_spec("web-01")).await);
    cloud.remove_instance("vm-1");

    let record = assert_ok!(reconciler.apply(&basic_spec("web-01")).await);

    assert_eq!(creates(&cloud), 2);
    assert_eq!(record.status, ResourceStatus::Present);
}

#[tokio::test]
async fn test_refresh_unknown_name() {
    let (_temp_dir, cloud, reconciler) = setup();

    assert_eq!(assert_ok!(reconciler.refresh("missing").await), None);
    assert_eq!(cloud.call_count(), 0);
}

#[tokio::test]
async fn test_refresh_records_disappearance() {
    let (temp_dir, cloud, reconciler) = setup();

    assert_ok!(reconciler.apply(&basic_spec("web-01")).await);
    cloud.remove_instance("vm-1");

    let record = assert_ok!(reconciler.refresh("web-01").await).unwrap();
    assert_eq!(record.uuid, None);

    let saved = stored(&temp_dir, "web-01").await.unwrap();
    assert_eq!(saved.uuid, None);
    assert_eq!(saved.status, ResourceStatus::Absent);
}

#[tokio::test]
async fn test_destroy_removes_record() {
    let (temp_dir, cloud, reconciler) = setup();

    assert_ok!(reconciler.apply(&basic_spec("web-01")).await);
    let result = assert_ok!(reconciler.destroy("web-01").await);

    assert_eq!(result.succeeded.len(), 2);
    assert!(
        cloud
            .calls()
            .contains(&Call::DeleteDataVolume("vol-a".to_string(), DeleteMode::Permissive))
    );
    assert_eq!(stored(&temp_dir, "web-01").await, None);
}

#[tokio::test]
async fn test_destroy_failure_keeps_partial_status() {
    let (temp_dir, cloud, reconciler) = setup();

    assert_ok!(reconciler.apply(&basic_spec("web-01")).await);
    cloud.fail_on(Call::DeleteDataVolume(
        "vol-a".to_string(),
        DeleteMode::Permissive,
    ));

    assert_err!(reconciler.destroy("web-01").await);

    let saved = stored(&temp_dir, "web-01").await.unwrap();
    assert_eq!(saved.status, ResourceStatus::Deleting);
    assert_eq!(saved.uuid.as_deref(), Some("vm-1"));
}

#[tokio::test]
async fn test_refresh_after_failed_expunge_keeps_delete_issued() {
    let (temp_dir, cloud, reconciler) = setup();

    let mut spec = basic_spec("web-01");
    spec.expunge = true;
    assert_ok!(reconciler.apply(&spec).await);
    cloud.fail_on(Call::ExpungeVmInstance("vm-1".to_string()));
    assert_err!(reconciler.destroy("web-01").await);

    let record = assert_ok!(reconciler.refresh("web-01").await).unwrap();

    assert_eq!(record.status, ResourceStatus::DeleteIssued);
    let saved = stored(&temp_dir, "web-01").await.unwrap();
    assert_eq!(saved.status, ResourceStatus::DeleteIssued);
}

#[tokio::test]
async fn test_apply_refuses_partially_deleted_instance() {
    let (temp_dir, cloud, reconciler) = setup();

    let mut spec = basic_spec("web-01");
    spec.expunge = true;
    assert_ok!(reconciler.apply(&spec).await);
    cloud.fail_on(Call::ExpungeVmInstance("vm-1".to_string()));
    assert_err!(reconciler.destroy("web-01").await);

    let err = assert_err!(reconciler.apply(&spec).await);

    assert!(err.is_precondition());
    assert!(err.to_string().contains("partially deleted"));
    assert_eq!(creates(&cloud), 1);
    let saved = stored(&temp_dir, "web-01").await.unwrap();
    assert_eq!(saved.status, ResourceStatus::DeleteIssued);
    assert_eq!(saved.uuid.as_deref(), Some("vm-1"));
}

#[tokio::test]
async fn test_destroy_resumes_after_failed_expunge() {
    let (temp_dir, cloud, reconciler) = setup();

    let mut spec = basic_spec("web-01");
    spec.expunge = true;
    assert_ok!(reconciler.apply(&spec).await);
    cloud.fail_on(Call::ExpungeDataVolume("vol-a".to_string()));
    assert_err!(reconciler.destroy("web-01").await);
    assert_eq!(
        stored(&temp_dir, "web-01").await.unwrap().status,
        ResourceStatus::DeleteIssued
    );

    // The instance was expunged, so the second destroy finds it gone
    assert_ok!(reconciler.destroy("web-01").await);
    assert_eq!(stored(&temp_dir, "web-01").await, None);
}

#[tokio::test]
async fn test_destroy_unknown_name_is_noop() {
    let (_temp_dir, cloud, reconciler) = setup();

    let result = assert_ok!(reconciler.destroy("missing").await);
    assert!(result.succeeded.is_empty());
    assert_eq!(cloud.call_count(), 0);
}

#[tokio::test]
async fn test_lock_released_after_error() {
    let (temp_dir, _cloud, reconciler) = setup();

    let mut spec = basic_spec("web-01");
    spec.strategy = Some("Bogus".to_string());
    assert_err!(reconciler.apply(&spec).await);

    // A fresh lock can be taken once the failed apply has returned
    let lock = assert_ok!(StateManager::new(temp_dir.path()).acquire_lock().await);
    assert_ok!(lock.release().await);
}

fn client_config() -> ClientConfig {
    ClientConfig {
        host: "zs.local".to_string(),
        port: 8080,
        credentials: Credentials::AccessKey {
            id: "ak".to_string(),
            secret: "sk".to_string(),
        },
    }
}

#[tokio::test]
async fn test_connect_hands_config_to_connector() {
    let temp_dir = TempDir::new().unwrap();
    let cloud = Arc::new(MockCloud::new().with_image(image("img-1", "x86_64")));
    let mut seen = None;

    let reconciler = assert_ok!(InstanceReconciler::connect(
        &client_config(),
        temp_dir.path(),
        |config| {
            seen = Some(config.endpoint());
            let client: Arc<dyn CloudApi> = cloud.clone();
            Ok(client)
        },
    ));

    assert_eq!(seen.as_deref(), Some("http://zs.local:8080"));
    assert_ok!(reconciler.refresh("web-01").await);
}

#[tokio::test]
async fn test_connect_failure_is_remote_error() {
    let temp_dir = TempDir::new().unwrap();

    let result = InstanceReconciler::connect(&client_config(), temp_dir.path(), |_| {
        Err(CloudError::ApiError("login rejected".to_string()))
    });

    let err = match result {
        Ok(_) => panic!("connect should fail"),
        Err(e) => e,
    };
    assert!(matches!(err, InstanceError::Remote { .. }));
    assert!(err.to_string().contains("connect to http://zs.local:8080"));
}
