//! Planned changes to deployed resources

use crate::resource::ResourceConfig;
use crate::state::GlobalState;
use serde::{Deserialize, Serialize};

/// A planned change to one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Type of action to perform
    pub action_type: ActionType,

    /// Resource key (type:name)
    pub key: String,

    pub resource_type: String,

    pub name: String,

    /// Top-level properties that differ from the recorded state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<String>,
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Update,
    Delete,
    /// Recorded properties already match
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    /// Compare desired resources against recorded state
    ///
    /// Desired resources keep their registration order; deletions of
    /// resources no longer registered come last.
    pub fn diff(desired: &[ResourceConfig], current: &GlobalState) -> Self {
        let mut actions: Vec<Action> = desired
            .iter()
            .map(|resource| {
                let key = resource.key();
                let (action_type, changed) = match current.get_resource(&key) {
                    None => (ActionType::Create, Vec::new()),
                    Some(existing) => {
                        let changed = changed_properties(&existing.properties, &resource.properties);
                        if changed.is_empty() {
                            (ActionType::NoOp, changed)
                        } else {
                            (ActionType::Update, changed)
                        }
                    }
                };
                Action {
                    action_type,
                    key,
                    resource_type: resource.resource_type.clone(),
                    name: resource.name.clone(),
                    changed,
                }
            })
            .collect();

        for (key, existing) in &current.resources {
            if desired.iter().all(|r| &r.key() != key) {
                let name = key
                    .strip_prefix(&format!("{}:", existing.resource_type))
                    .unwrap_or(key)
                    .to_string();
                actions.push(Action {
                    action_type: ActionType::Delete,
                    key: key.clone(),
                    resource_type: existing.resource_type.clone(),
                    name,
                    changed: Vec::new(),
                });
            }
        }

        Self::new(actions)
    }

    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.key == key)
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

fn changed_properties(old: &serde_json::Value, new: &serde_json::Value) -> Vec<String> {
    match (old.as_object(), new.as_object()) {
        (Some(old), Some(new)) => {
            let mut keys: Vec<String> = old
                .keys()
                .chain(new.keys())
                .filter(|k| old.get(*k) != new.get(*k))
                .cloned()
                .collect();
            keys.sort();
            keys.dedup();
            keys
        }
        _ if old != new => vec!["*".to_string()],
        _ => Vec::new(),
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

/// Result of applying a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    pub succeeded: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, key: String, action_type: ActionType, message: String) {
        self.succeeded.push(ActionResult {
            key,
            action_type,
            message,
        });
    }
}

/// Result of a single applied action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub key: String,
    pub action_type: ActionType,
    pub message: String,
}
