//! SHA-256 digests of workflow and step content.

use flowscribe_protocols::{ParameterDescriptor, StepRecord, WorkflowRecord};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use super::canonical_json::to_canonical_json;

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest of a step's semantic content.
pub fn step_hash(step: &StepRecord) -> String {
    sha256_hex(&to_canonical_json(&step_content(step)))
}

/// Digest of a record's semantic content.
pub fn record_hash(record: &WorkflowRecord) -> String {
    sha256_hex(&to_canonical_json(&record_content(record)))
}

fn step_content(step: &StepRecord) -> Value {
    let mut map = Map::new();
    map.insert("order".into(), Value::from(step.order));
    map.insert("title".into(), Value::from(step.title.as_str()));
    map.insert("action".into(), Value::from(step.action.as_str()));
    map.insert("properties".into(), string_map(&step.properties));
    map.insert("parameters".into(), parameters(&step.parameters));
    Value::Object(map)
}

fn record_content(record: &WorkflowRecord) -> Value {
    let trigger = match record.metadata.trigger.trigger_type {
        Some(t) => Value::from(t.as_str()),
        None => Value::Null,
    };
    let mut trigger_map = Map::new();
    trigger_map.insert("type".into(), trigger);

    let mut metadata = Map::new();
    metadata.insert("trigger".into(), Value::Object(trigger_map));
    metadata.insert("properties".into(), string_map(&record.metadata.properties));

    let mut interface = Map::new();
    interface.insert("inputs".into(), parameters(&record.interface.inputs));
    interface.insert("outputs".into(), strings(&record.interface.outputs));

    let mut map = Map::new();
    map.insert("workflow_id".into(), Value::from(record.workflow_id.as_str()));
    map.insert("wf_item".into(), Value::from(record.wf_item.as_str()));
    map.insert("name".into(), Value::from(record.name.as_str()));
    map.insert("metadata".into(), Value::Object(metadata));
    map.insert("interface".into(), Value::Object(interface));
    map.insert(
        "steps".into(),
        Value::Array(record.steps.iter().map(step_content).collect()),
    );
    map.insert("dependencies".into(), strings(&record.dependencies));
    Value::Object(map)
}

fn string_map(map: &IndexMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect(),
    )
}

fn strings(values: &[String]) -> Value {
    Value::Array(values.iter().map(|v| Value::from(v.as_str())).collect())
}

fn parameters(params: &[ParameterDescriptor]) -> Value {
    Value::Array(
        params
            .iter()
            .map(|p| {
                let mut map = Map::new();
                map.insert("index".into(), Value::from(p.index));
                map.insert("label".into(), Value::from(p.label.as_str()));
                map.insert("value".into(), Value::from(p.value.as_str()));
                Value::Object(map)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use flowscribe_protocols::{ActionType, Position, WorkflowInterface, WorkflowMetadata};

    use super::*;

    fn step(order: u32, title: &str) -> StepRecord {
        StepRecord {
            order,
            title: title.to_string(),
            action: ActionType::CustomAction,
            properties: IndexMap::from([("type".to_string(), "User".to_string())]),
            parameters: Vec::new(),
            position: Position { x: 400.0, y: 100.0 },
            step_hash: String::new(),
        }
    }

    fn record(steps: Vec<StepRecord>) -> WorkflowRecord {
        WorkflowRecord {
            workflow_id: "send-welcome".to_string(),
            wf_item: "bTGzk".to_string(),
            name: "send-welcome".to_string(),
            url: "https://editor.example/?wf_item=bTGzk".to_string(),
            captured_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            version: 1,
            metadata: WorkflowMetadata::default(),
            interface: WorkflowInterface::default(),
            steps,
            dependencies: Vec::new(),
            hash: String::new(),
        }
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_step_hash_ignores_position_and_own_hash() {
        let a = step(1, "Send email");
        let mut b = a.clone();
        b.position = Position { x: 999.0, y: -3.0 };
        b.step_hash = "stale".to_string();
        assert_eq!(step_hash(&a), step_hash(&b));
    }

    #[test]
    fn test_step_hash_changes_with_title() {
        assert_ne!(step_hash(&step(1, "Send email")), step_hash(&step(1, "Send an email")));
    }

    #[test]
    fn test_record_hash_ignores_volatile_fields() {
        let a = record(vec![step(1, "Send email")]);
        let mut b = a.clone();
        b.url = "https://editor.example/other".to_string();
        b.captured_at = Utc::now();
        b.version = 7;
        b.hash = "stale".to_string();
        b.steps[0].position = Position { x: 1.0, y: 2.0 };
        assert_eq!(record_hash(&a), record_hash(&b));
    }

    #[test]
    fn test_record_hash_survives_reserialization() {
        let a = record(vec![step(1, "Send email"), step(2, "Delete thing")]);
        let json = serde_json::to_string(&a).unwrap();
        let b: WorkflowRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record_hash(&a), record_hash(&b));
    }

    #[test]
    fn test_record_hash_property_order_is_irrelevant() {
        let mut a = step(1, "Send email");
        a.properties.insert("to".to_string(), "ops@example.com".to_string());
        let mut b = step(1, "Send email");
        b.properties = IndexMap::from([
            ("to".to_string(), "ops@example.com".to_string()),
            ("type".to_string(), "User".to_string()),
        ]);
        assert_eq!(record_hash(&record(vec![a])), record_hash(&record(vec![b])));
    }
}
