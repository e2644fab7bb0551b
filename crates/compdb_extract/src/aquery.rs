//! Reading compile actions out of Bazel's `aquery --output=jsonproto`.

use std::collections::HashMap;
use std::io::Read;

use compdb_common::CompileAction;
use serde::Deserialize;
use tracing::debug;

use crate::error::ExtractError;

#[derive(Deserialize)]
struct ActionGraph {
    #[serde(default)]
    actions: Vec<RawAction>,
    #[serde(default)]
    targets: Vec<Target>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    #[serde(default)]
    arguments: Vec<String>,
    #[serde(default)]
    environment_variables: Vec<KeyValue>,
    #[serde(default)]
    action_key: String,
    #[serde(default)]
    target_id: Id,
}

#[derive(Deserialize)]
struct KeyValue {
    key: String,
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct Target {
    id: Id,
    label: String,
}

/// Numeric in jsonproto output, but accepted as a string too.
#[derive(Deserialize, Default)]
#[serde(untagged)]
enum Id {
    Number(u64),
    Text(String),
    #[default]
    Missing,
}

impl Id {
    fn into_string(self) -> String {
        match self {
            Id::Number(n) => n.to_string(),
            Id::Text(s) => s,
            Id::Missing => String::new(),
        }
    }
}

/// Returns `true` for labels of targets outside the main repository.
pub fn is_external_label(label: &str) -> bool {
    label.starts_with('@') && !label.starts_with("@//") && !label.starts_with("@@//")
}

/// Parses an action graph into compile actions, in the order they appear.
///
/// Each action is tagged external when its target's label is. With
/// `exclude_external`, external actions are dropped.
pub fn parse_action_graph(json: &str, exclude_external: bool) -> Result<Vec<CompileAction>, ExtractError> {
    let graph: ActionGraph = serde_json::from_str(json)?;
    Ok(convert(graph, exclude_external))
}

/// Like [`parse_action_graph`], reading from `reader`.
pub fn read_action_graph(reader: impl Read, exclude_external: bool) -> Result<Vec<CompileAction>, ExtractError> {
    let graph: ActionGraph = serde_json::from_reader(reader)?;
    Ok(convert(graph, exclude_external))
}

fn convert(graph: ActionGraph, exclude_external: bool) -> Vec<CompileAction> {
    let labels: HashMap<String, String> = graph
        .targets
        .into_iter()
        .map(|target| (target.id.into_string(), target.label))
        .collect();

    let total = graph.actions.len();
    let actions: Vec<CompileAction> = graph
        .actions
        .into_iter()
        .map(|raw| {
            let target_id = raw.target_id.into_string();
            let is_external = labels
                .get(&target_id)
                .is_some_and(|label| is_external_label(label));
            CompileAction {
                arguments: raw.arguments,
                environment_variables: raw
                    .environment_variables
                    .into_iter()
                    .map(|kv| (kv.key, kv.value))
                    .collect(),
                action_key: raw.action_key,
                target_id,
                is_external,
            }
        })
        .filter(|action| !(exclude_external && action.is_external))
        .collect();
    debug!(total, kept = actions.len(), "read action graph");
    actions
}
