//! Cascading deletion of an instance and its data volumes, and of images

use crate::error::{InstanceError, Result};
use std::time::Instant;
use zsphere_cloud::{Action, ApplyResult, CloudApi, DeleteMode, Plan, Step, VmInstance};

/// Order the remote calls that tear an instance down
///
/// The root volume goes away with the instance; only data volumes are
/// deleted explicitly. Expunge steps, when requested, repeat the same order
/// after every soft delete has been issued.
pub fn plan_teardown(instance: &VmInstance, expunge: bool) -> Plan {
    let volume_ids: Vec<&str> = instance
        .data_volumes()
        .map(|volume| volume.uuid.as_str())
        .collect();

    let mut actions = vec![Action::new(Step::DestroyVmInstance, &instance.uuid)];
    actions.extend(
        volume_ids
            .iter()
            .map(|id| Action::new(Step::DeleteDataVolume, id)),
    );

    if expunge {
        actions.push(Action::new(Step::ExpungeVmInstance, &instance.uuid));
        actions.extend(
            volume_ids
                .iter()
                .map(|id| Action::new(Step::ExpungeDataVolume, id)),
        );
    }

    Plan::new(actions)
}

/// Delete an image, then expunge it when requested
pub fn plan_image_teardown(image_uuid: &str, expunge: bool) -> Plan {
    let mut actions = vec![Action::new(Step::DeleteImage, image_uuid)];
    if expunge {
        actions.push(Action::new(Step::ExpungeImage, image_uuid));
    }
    Plan::new(actions)
}

/// Run a teardown plan in order, stopping at the first failure
///
/// Nothing already done is rolled back; `on_step` sees every completed
/// action so the caller can record how far teardown got.
pub async fn execute(
    client: &dyn CloudApi,
    plan: &Plan,
    mut on_step: impl FnMut(&Action),
) -> Result<ApplyResult> {
    let mut result = ApplyResult::new();
    let start = Instant::now();

    for action in &plan.actions {
        tracing::info!("Teardown: {}", action.description);

        let id = action.resource_id.as_str();
        let outcome = match action.step {
            Step::DestroyVmInstance => client.destroy_vm_instance(id, DeleteMode::Permissive).await,
            Step::DeleteDataVolume => client.delete_data_volume(id, DeleteMode::Permissive).await,
            Step::ExpungeVmInstance => client.expunge_vm_instance(id).await,
            Step::ExpungeDataVolume => client.expunge_data_volume(id).await,
            Step::DeleteImage => client.delete_image(id, DeleteMode::Enforcing).await,
            Step::ExpungeImage => client.expunge_image(id).await,
        };

        if let Err(e) = outcome {
            tracing::warn!(
                "Teardown stopped after {} of {} step(s)",
                result.succeeded.len(),
                plan.actions.len()
            );
            return Err(InstanceError::remote(action.description.clone())(e));
        }

        on_step(action);
        result.add_success(action.clone());
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    Ok(result)
}
