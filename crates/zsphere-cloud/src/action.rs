//! Action types for ordered teardown of cloud resources

use serde::{Deserialize, Serialize};

/// A single remote call planned against a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The call to make
    pub step: Step,

    /// Resource UUID
    pub resource_id: String,

    /// Description of the action
    pub description: String,
}

impl Action {
    pub fn new(step: Step, resource_id: &str) -> Self {
        Self {
            description: format!(
                "{} {} {}",
                step.action_type(),
                step.resource_kind(),
                resource_id
            ),
            step,
            resource_id: resource_id.to_string(),
        }
    }
}

/// Every teardown call the platform supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    DestroyVmInstance,
    DeleteDataVolume,
    ExpungeVmInstance,
    ExpungeDataVolume,
    DeleteImage,
    ExpungeImage,
}

impl Step {
    pub fn action_type(self) -> ActionType {
        match self {
            Step::DestroyVmInstance => ActionType::Destroy,
            Step::DeleteDataVolume | Step::DeleteImage => ActionType::Delete,
            Step::ExpungeVmInstance | Step::ExpungeDataVolume | Step::ExpungeImage => {
                ActionType::Expunge
            }
        }
    }

    pub fn resource_kind(self) -> ResourceKind {
        match self {
            Step::DestroyVmInstance | Step::ExpungeVmInstance => ResourceKind::VmInstance,
            Step::DeleteDataVolume | Step::ExpungeDataVolume => ResourceKind::DataVolume,
            Step::DeleteImage | Step::ExpungeImage => ResourceKind::Image,
        }
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Soft-delete a VM instance
    Destroy,
    /// Soft-delete a data volume or image
    Delete,
    /// Permanently remove an already deleted resource
    Expunge,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Destroy => write!(f, "destroy"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::Expunge => write!(f, "expunge"),
        }
    }
}

/// Kind of resource an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    VmInstance,
    DataVolume,
    Image,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::VmInstance => write!(f, "vm instance"),
            ResourceKind::DataVolume => write!(f, "data volume"),
            ResourceKind::Image => write!(f, "image"),
        }
    }
}

/// Result of applying a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Actions that completed, in execution order
    pub succeeded: Vec<Action>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, action: Action) {
        self.succeeded.push(action);
    }
}

/// Ordered list of actions; execution stops at the first failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// List of actions to perform, in order
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.step.action_type() == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            destroy: self.actions_by_type(ActionType::Destroy).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            expunge: self.actions_by_type(ActionType::Expunge).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub destroy: usize,
    pub delete: usize,
    pub expunge: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to destroy, {} to delete, {} to expunge",
            self.destroy, self.delete, self.expunge
        )
    }
}
