use std::collections::BTreeMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};
use termtree::Tree;

use crate::smoke::PlanOutcome;
use crate::terraform::{Action, PlanStruct};

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Directory")]
    dir: String,
    #[tabled(rename = "Result")]
    result: &'static str,
    #[tabled(rename = "Resources")]
    resources: String,
    #[tabled(rename = "Changes")]
    changes: String,
}

pub fn outcome_table(outcomes: &[PlanOutcome]) -> String {
    let rows: Vec<OutcomeRow> = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(plan) => OutcomeRow {
                dir: outcome.dir.display().to_string(),
                result: "PASS",
                resources: plan.resource_count().to_string(),
                changes: plan.change_summary().to_string(),
            },
            Err(e) => OutcomeRow {
                dir: outcome.dir.display().to_string(),
                result: "FAIL",
                resources: "-".to_string(),
                changes: first_line(&e.to_string()).to_string(),
            },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Resources grouped by module, with the planned action on each leaf.
pub fn plan_tree(label: &str, plan: &PlanStruct) -> Tree<String> {
    let mut modules: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (address, rc) in &plan.resource_changes_map {
        let module = rc
            .module_address
            .clone()
            .unwrap_or_else(|| "(root)".to_string());
        let actions = rc
            .change
            .actions
            .iter()
            .map(action_label)
            .collect::<Vec<_>>()
            .join("/");
        modules
            .entry(module)
            .or_default()
            .push(format!("{address} [{actions}]"));
    }

    let mut root = Tree::new(label.to_string());
    for (module, resources) in modules {
        root.push(Tree::new(module).with_leaves(resources));
    }
    root
}

pub fn outcomes_json(outcomes: &[PlanOutcome]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(plan) => serde_json::json!({
                "dir": outcome.dir.display().to_string(),
                "passed": true,
                "resource_count": plan.resource_count(),
                "changes": plan.change_summary(),
                "plan": plan.raw_plan,
            }),
            Err(e) => serde_json::json!({
                "dir": outcome.dir.display().to_string(),
                "passed": false,
                "error_kind": format!("{:?}", e.kind()).to_lowercase(),
                "error": e.to_string(),
            }),
        })
        .collect();
    serde_json::Value::Array(entries)
}

fn action_label(action: &Action) -> &'static str {
    match action {
        Action::NoOp => "no-op",
        Action::Create => "create",
        Action::Read => "read",
        Action::Update => "update",
        Action::Delete => "delete",
        Action::Unknown => "unknown",
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
