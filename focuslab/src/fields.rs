//! Parsing of `key=value` command-line fields

use std::collections::BTreeMap;

use focuslab_core::IdentityValue;
use serde_json::{Map, Value};

/// A `key=value` pair from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArg {
    pub key: String,
    pub value: Value,
}

/// Parse `key=value`; the value is read as JSON when it parses, otherwise as a string.
pub fn parse_field(raw: &str) -> Result<FieldArg, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))?;

    if key.is_empty() {
        return Err(format!("missing key in {:?}", raw));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    Ok(FieldArg {
        key: key.to_string(),
        value,
    })
}

/// Collect fields into a JSON object; later keys overwrite earlier ones.
pub fn values(fields: Vec<FieldArg>) -> Map<String, Value> {
    fields.into_iter().map(|f| (f.key, f.value)).collect()
}

/// Collect identity fields; a repeated key accumulates into a list.
pub fn identities(fields: Vec<FieldArg>) -> BTreeMap<String, IdentityValue> {
    let mut identities = BTreeMap::new();

    for field in fields {
        let value = identity_value(field.value);
        match identities.remove(&field.key) {
            None => {
                identities.insert(field.key, value);
            }
            Some(existing) => {
                let mut list = into_strings(existing);
                list.extend(into_strings(value));
                identities.insert(field.key, IdentityValue::List(list));
            }
        }
    }

    identities
}

fn identity_value(value: Value) -> IdentityValue {
    match value {
        Value::Number(n) => IdentityValue::Number(n),
        Value::String(s) => IdentityValue::Text(s),
        Value::Array(items) => IdentityValue::List(items.into_iter().map(value_text).collect()),
        other => IdentityValue::Text(other.to_string()),
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn into_strings(value: IdentityValue) -> Vec<String> {
    match value {
        IdentityValue::Text(s) => vec![s],
        IdentityValue::List(items) => items,
        IdentityValue::Number(n) => vec![n.to_string()],
    }
}
