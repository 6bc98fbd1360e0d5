//! Trigger events and their wire payload
//!
//! A [`TriggerEvent`] records that an actor performed an action on an object.
//! [`TriggerPayload`] is the JSON body the trigger endpoint expects:
//!
//! ```text
//! identities -> captured_identities
//! attributes -> captured_attributes
//! variables  -> variables
//! ```
//!
//! Optional maps are left out of the body entirely when they are empty. The
//! body is built as a [`serde_json::Value`] directly, so encoding it cannot fail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value of a captured identity: a single string, a list of strings, or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentityValue {
    Text(String),
    List(Vec<String>),
    Number(serde_json::Number),
}

impl From<&str> for IdentityValue {
    fn from(value: &str) -> Self {
        IdentityValue::Text(value.to_string())
    }
}

impl From<String> for IdentityValue {
    fn from(value: String) -> Self {
        IdentityValue::Text(value)
    }
}

impl From<Vec<String>> for IdentityValue {
    fn from(values: Vec<String>) -> Self {
        IdentityValue::List(values)
    }
}

impl From<Vec<&str>> for IdentityValue {
    fn from(values: Vec<&str>) -> Self {
        IdentityValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl From<i32> for IdentityValue {
    fn from(value: i32) -> Self {
        IdentityValue::Number(value.into())
    }
}

impl From<u32> for IdentityValue {
    fn from(value: u32) -> Self {
        IdentityValue::Number(value.into())
    }
}

impl From<i64> for IdentityValue {
    fn from(value: i64) -> Self {
        IdentityValue::Number(value.into())
    }
}

impl From<u64> for IdentityValue {
    fn from(value: u64) -> Self {
        IdentityValue::Number(value.into())
    }
}

/// Floats go through here: `serde_json::Number::from_f64(1.5)`
impl From<serde_json::Number> for IdentityValue {
    fn from(value: serde_json::Number) -> Self {
        IdentityValue::Number(value)
    }
}

impl From<&IdentityValue> for Value {
    fn from(value: &IdentityValue) -> Self {
        match value {
            IdentityValue::Text(text) => Value::String(text.clone()),
            IdentityValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            IdentityValue::Number(number) => Value::Number(number.clone()),
        }
    }
}

/// A single occurrence reported to the trigger endpoint
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriggerEvent {
    /// Subject of the event, always sent as text
    pub actor_id: String,
    /// Short verb describing what happened
    pub action: String,
    /// Short noun describing what was acted upon
    pub object: String,
    /// Identity facts the server should merge onto the actor
    pub identities: BTreeMap<String, IdentityValue>,
    /// Descriptive facts about the actor
    pub attributes: Map<String, Value>,
    /// Event-scoped context
    pub variables: Map<String, Value>,
}

impl TriggerEvent {
    /// Create an event with no optional data.
    ///
    /// `actor_id` accepts anything printable (UUIDs, integer ids) and is
    /// stored in its text form.
    pub fn new(
        actor_id: impl ToString,
        action: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            action: action.into(),
            object: object.into(),
            ..Default::default()
        }
    }

    pub fn identity(mut self, key: impl Into<String>, value: impl Into<IdentityValue>) -> Self {
        self.identities.insert(key.into(), value.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_identities(mut self, identities: BTreeMap<String, IdentityValue>) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }
}

/// JSON body for POST `<endpoint>trigger/`
///
/// `None` fields are left out of the encoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerPayload<'a> {
    pub actor_id: &'a str,
    pub action: &'a str,
    pub object: &'a str,
    pub captured_identities: Option<&'a BTreeMap<String, IdentityValue>>,
    pub captured_attributes: Option<&'a Map<String, Value>>,
    pub variables: Option<&'a Map<String, Value>>,
}

impl TriggerPayload<'_> {
    /// Encode the payload as a JSON request body.
    pub fn to_json(&self) -> String {
        Value::from(self).to_string()
    }
}

impl From<&TriggerPayload<'_>> for Value {
    fn from(payload: &TriggerPayload<'_>) -> Self {
        let mut body = Map::new();
        body.insert("actor_id".to_string(), payload.actor_id.into());
        body.insert("action".to_string(), payload.action.into());
        body.insert("object".to_string(), payload.object.into());

        if let Some(identities) = payload.captured_identities {
            let identities = identities
                .iter()
                .map(|(key, value)| (key.clone(), Value::from(value)))
                .collect();
            body.insert("captured_identities".to_string(), Value::Object(identities));
        }
        if let Some(attributes) = payload.captured_attributes {
            body.insert(
                "captured_attributes".to_string(),
                Value::Object(attributes.clone()),
            );
        }
        if let Some(variables) = payload.variables {
            body.insert("variables".to_string(), Value::Object(variables.clone()));
        }

        Value::Object(body)
    }
}

impl From<TriggerPayload<'_>> for Value {
    fn from(payload: TriggerPayload<'_>) -> Self {
        Value::from(&payload)
    }
}

impl<'a> From<&'a TriggerEvent> for TriggerPayload<'a> {
    fn from(event: &'a TriggerEvent) -> Self {
        TriggerPayload {
            actor_id: &event.actor_id,
            action: &event.action,
            object: &event.object,
            captured_identities: non_empty(&event.identities, BTreeMap::is_empty),
            captured_attributes: non_empty(&event.attributes, Map::is_empty),
            variables: non_empty(&event.variables, Map::is_empty),
        }
    }
}

fn non_empty<T>(value: &T, is_empty: impl Fn(&T) -> bool) -> Option<&T> {
    if is_empty(value) {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_actor_id_is_coerced_to_text() {
        let event = TriggerEvent::new(42, "viewed", "blog post");
        assert_eq!(event.actor_id, "42");

        let id = uuid::Uuid::new_v4();
        let event = TriggerEvent::new(id, "viewed", "blog post");
        assert_eq!(event.actor_id, id.to_string());
    }

    #[test]
    fn test_identity_values_serialize_untagged() {
        let event = TriggerEvent::new("a", "b", "c")
            .identity("email", vec!["test1@test.com", "test2@test.com"])
            .identity("user_id", 42)
            .identity("handle", "bob");

        let value = serde_json::to_value(&event.identities).unwrap();
        assert_eq!(
            value,
            json!({
                "email": ["test1@test.com", "test2@test.com"],
                "user_id": 42,
                "handle": "bob",
            })
        );
    }

    #[test]
    fn test_identity_value_deserializes() {
        let value: IdentityValue = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(value, IdentityValue::from(vec!["a", "b"]));

        let value: IdentityValue = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(value, IdentityValue::from(7i64));
    }

    #[test]
    fn test_payload_omits_empty_maps() {
        let event = TriggerEvent::new("actor", "viewed", "blog post")
            .with_attributes(Map::new())
            .variable("author", "bob");

        let payload = TriggerPayload::from(&event);
        assert!(payload.captured_identities.is_none());
        assert!(payload.captured_attributes.is_none());
        assert!(payload.variables.is_some());

        let value = Value::from(&payload);
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert!(!object.contains_key("captured_attributes"));
    }

    #[test]
    fn test_bare_numeric_identities() {
        let event = TriggerEvent::new("a", "b", "c")
            .identity("user_id", 42)
            .identity("account", 7u32)
            .identity("score", serde_json::Number::from_f64(1.5).unwrap());

        assert_eq!(event.identities["user_id"], IdentityValue::from(42i64));
        assert_eq!(
            Value::from(TriggerPayload::from(&event))["captured_identities"],
            json!({ "user_id": 42, "account": 7, "score": 1.5 })
        );
    }

    #[test]
    fn test_payload_json_matches_serde_encoding_of_identities() {
        let event = TriggerEvent::new("actor", "viewed", "blog post")
            .identity("email", vec!["test1@test.com", "test2@test.com"])
            .identity("user_id", 42)
            .attribute("plan", "basic");

        let body: Value = serde_json::from_str(&TriggerPayload::from(&event).to_json()).unwrap();
        assert_eq!(
            body["captured_identities"],
            serde_json::to_value(&event.identities).unwrap()
        );
        assert_eq!(body["captured_attributes"], json!({ "plan": "basic" }));
        assert_eq!(body["actor_id"], "actor");
    }
}
