use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TerraformError;

/// A planned resource from `planned_values`, at any module depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedResource {
    pub address: String,
    #[serde(default)]
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub values: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PlannedModule {
    #[serde(default)]
    resources: Vec<PlannedResource>,
    #[serde(default)]
    child_modules: Vec<PlannedModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PlannedValues {
    #[serde(default)]
    root_module: PlannedModule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub before: serde_json::Value,
    #[serde(default)]
    pub after: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub address: String,
    #[serde(default)]
    pub module_address: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub provider_name: String,
    pub change: Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    NoOp,
    Create,
    Read,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

/// Counts in the shape of Terraform's "Plan: X to add, Y to change, Z to destroy".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub add: usize,
    pub change: usize,
    pub destroy: usize,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        self.add == 0 && self.change == 0 && self.destroy == 0
    }
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to destroy",
            self.add, self.change, self.destroy
        )
    }
}

/// Structured result of `terraform show -json <planfile>`.
///
/// Keeps the raw document alongside address-indexed views of planned values
/// and resource changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStruct {
    pub raw_plan: serde_json::Value,
    pub resource_planned_values_map: BTreeMap<String, PlannedResource>,
    pub resource_changes_map: BTreeMap<String, ResourceChange>,
}

impl PlanStruct {
    pub fn parse(json: &str) -> Result<Self, TerraformError> {
        if json.trim().is_empty() {
            return Err(TerraformError::InvalidPlan {
                message: "terraform show returned no output".to_string(),
            });
        }

        let raw_plan: serde_json::Value =
            serde_json::from_str(json).map_err(|e| TerraformError::InvalidPlan {
                message: format!("Failed to parse plan JSON: {}", e),
            })?;

        Self::from_value(raw_plan)
    }

    pub fn from_value(raw_plan: serde_json::Value) -> Result<Self, TerraformError> {
        let format_version = raw_plan
            .as_object()
            .and_then(|obj| obj.get("format_version"))
            .and_then(|v| v.as_str());
        if format_version.is_none() {
            return Err(TerraformError::InvalidPlan {
                message: "plan JSON has no format_version".to_string(),
            });
        }

        let planned_values: PlannedValues = match raw_plan.get("planned_values") {
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|e| TerraformError::InvalidPlan {
                    message: format!("Failed to parse planned_values: {}", e),
                })?
            }
            None => PlannedValues::default(),
        };

        let resource_changes: Vec<ResourceChange> = match raw_plan.get("resource_changes") {
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|e| TerraformError::InvalidPlan {
                    message: format!("Failed to parse resource_changes: {}", e),
                })?
            }
            None => Vec::new(),
        };

        let mut resource_planned_values_map = BTreeMap::new();
        collect_planned(&planned_values.root_module, &mut resource_planned_values_map);

        let resource_changes_map = resource_changes
            .into_iter()
            .map(|rc| (rc.address.clone(), rc))
            .collect();

        Ok(Self {
            raw_plan,
            resource_planned_values_map,
            resource_changes_map,
        })
    }

    pub fn format_version(&self) -> Option<&str> {
        self.raw_plan.get("format_version").and_then(|v| v.as_str())
    }

    pub fn terraform_version(&self) -> Option<&str> {
        self.raw_plan
            .get("terraform_version")
            .and_then(|v| v.as_str())
    }

    pub fn resource_count(&self) -> usize {
        self.resource_planned_values_map.len()
    }

    pub fn change_summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for rc in self.resource_changes_map.values() {
            let actions = &rc.change.actions;
            match actions.as_slice() {
                [Action::Create] => summary.add += 1,
                [Action::Update] => summary.change += 1,
                [Action::Delete] => summary.destroy += 1,
                // Replacement in either order
                [Action::Delete, Action::Create] | [Action::Create, Action::Delete] => {
                    summary.add += 1;
                    summary.destroy += 1;
                }
                _ => {}
            }
        }
        summary
    }

    pub fn require_planned_value(&self, address: &str) -> Result<&PlannedResource, TerraformError> {
        self.resource_planned_values_map
            .get(address)
            .ok_or_else(|| TerraformError::MissingResource {
                address: address.to_string(),
                section: "planned_values",
            })
    }

    pub fn require_resource_change(&self, address: &str) -> Result<&ResourceChange, TerraformError> {
        self.resource_changes_map
            .get(address)
            .ok_or_else(|| TerraformError::MissingResource {
                address: address.to_string(),
                section: "resource_changes",
            })
    }

    /// Module addresses that own at least one planned resource, root as `""`.
    pub fn module_addresses(&self) -> Vec<String> {
        let mut modules: Vec<String> = self
            .resource_changes_map
            .values()
            .map(|rc| rc.module_address.clone().unwrap_or_default())
            .collect();
        modules.sort();
        modules.dedup();
        modules
    }
}

fn collect_planned(module: &PlannedModule, out: &mut BTreeMap<String, PlannedResource>) {
    for resource in &module.resources {
        out.insert(resource.address.clone(), resource.clone());
    }
    for child in &module.child_modules {
        collect_planned(child, out);
    }
}
