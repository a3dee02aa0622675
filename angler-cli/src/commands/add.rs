use std::path::Path;

use angler_core::manifest::Manifest;
use serde_json::{Map, Value};

use crate::cli::AddArgs;
use crate::error::CliError;

pub async fn run(manifest_path: &Path, args: &AddArgs) -> Result<(), CliError> {
    let value = build_status(&args.rest)?;

    let manifest = Manifest::open(manifest_path)?;
    manifest.insert_node(&args.uri, &value, None).await?;

    for node in &args.before {
        manifest.insert_edge(&args.uri, node, None).await?;
    }
    for node in &args.after {
        manifest.insert_edge(node, &args.uri, None).await?;
    }

    Ok(())
}

/// `rest` absent ⇒ `{"": {}}`. First token containing `=` ⇒ that pair under
/// key `""`. Otherwise the first token is the status key with an empty
/// property map. Remaining tokens must each be `key=value` and are folded
/// into the status's property map.
fn build_status(rest: &[String]) -> Result<Value, CliError> {
    let mut properties = Map::new();
    let status_key;
    let mut remaining = rest;

    match rest.first() {
        None => {
            status_key = String::new();
        }
        Some(first) if first.contains('=') => {
            let (k, v) = split_key_value(first)?;
            status_key = String::new();
            properties.insert(k, Value::String(v));
            remaining = &rest[1..];
        }
        Some(first) => {
            status_key = first.clone();
            remaining = &rest[1..];
        }
    }

    for token in remaining {
        let (k, v) = split_key_value(token)?;
        properties.insert(k, Value::String(v));
    }

    let mut status = Map::new();
    status.insert(status_key, Value::Object(properties));
    Ok(Value::Object(status))
}

fn split_key_value(token: &str) -> Result<(String, String), CliError> {
    token
        .split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| CliError::NotKeyValue(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_rest_yields_empty_status() {
        assert_eq!(build_status(&[]).unwrap(), json!({"": {}}));
    }

    #[test]
    fn bare_word_status_with_no_properties() {
        let rest = vec!["running".to_string()];
        assert_eq!(build_status(&rest).unwrap(), json!({"running": {}}));
    }

    #[test]
    fn leading_key_value_becomes_empty_status_key() {
        let rest = vec!["mode=0755".to_string()];
        assert_eq!(build_status(&rest).unwrap(), json!({"": {"mode": "0755"}}));
    }

    #[test]
    fn status_word_plus_properties() {
        let rest = vec![
            "running".to_string(),
            "port=8080".to_string(),
            "user=www".to_string(),
        ];
        assert_eq!(
            build_status(&rest).unwrap(),
            json!({"running": {"port": "8080", "user": "www"}})
        );
    }

    #[test]
    fn malformed_property_is_rejected() {
        let rest = vec!["running".to_string(), "not-key-value".to_string()];
        assert!(build_status(&rest).is_err());
    }
}
