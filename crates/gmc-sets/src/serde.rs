use std::collections::BTreeMap;
use std::iter::FromIterator;

use gmc_core::{ErrorInfo, GmcError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

fn config_error(code: &str, err: impl ToString) -> GmcError {
    GmcError::Config(ErrorInfo::new(code, err.to_string()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered = map
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect::<BTreeMap<_, _>>();
            Value::Object(Map::from_iter(ordered))
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serializes a value into canonical JSON bytes with sorted keys.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, GmcError> {
    let value = serde_json::to_value(value).map_err(|err| config_error("json_serialize", err))?;
    let mut bytes = Vec::new();
    serde_json::to_writer(&mut bytes, &canonicalize(value))
        .map_err(|err| config_error("json_write", err))?;
    Ok(bytes)
}

/// Pretty canonical JSON, used for evaluation output.
pub fn to_canonical_json_pretty<T: Serialize>(value: &T) -> Result<String, GmcError> {
    let value = serde_json::to_value(value).map_err(|err| config_error("json_serialize", err))?;
    serde_json::to_string_pretty(&canonicalize(value)).map_err(|err| config_error("json_write", err))
}

/// Serializes a value into YAML.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String, GmcError> {
    serde_yaml::to_string(value).map_err(|err| config_error("yaml_serialize", err))
}

/// Deserializes a YAML payload into the requested type.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, GmcError> {
    serde_yaml::from_slice(data).map_err(|err| config_error("yaml_deserialize", err))
}
