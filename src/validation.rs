//! Shape and field checks applied to untrusted input before any identity
//! lookup or store access.

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::invocation::{Function, TransientMap};
use crate::records::{OrgInput, ProductInput, TransientFields};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

pub fn check_arity(function: Function, args: &[String]) -> Result<(), LedgerError> {
    let expected = function.arity();
    if args.len() != expected {
        return Err(LedgerError::ArgumentCount {
            function: function.as_str(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

/// Returns the raw value stored under `key`, rejecting absent, empty, and
/// oversized payloads.
pub fn transient_payload<'a>(
    transient: &'a TransientMap,
    key: &'static str,
    max_bytes: usize,
) -> Result<&'a [u8], LedgerError> {
    let Some(value) = transient.get(key) else {
        return Err(LedgerError::TransientMissing { key });
    };
    if value.is_empty() {
        return Err(LedgerError::TransientEmpty { key });
    }
    if value.len() > max_bytes {
        return Err(LedgerError::Validation(format!(
            "{key} value in the transient map is {} bytes, exceeding the {max_bytes} byte limit",
            value.len()
        )));
    }
    Ok(value)
}

/// Decodes a transient payload. Object keys that differ from a field name
/// only in ASCII case are matched to that field; an exact key wins over a
/// case-folded one.
pub fn decode_transient<T: DeserializeOwned + TransientFields>(
    key: &'static str,
    bytes: &[u8],
) -> Result<T, LedgerError> {
    let decode_err = || LedgerError::TransientDecode {
        key,
        raw: String::from_utf8_lossy(bytes).into_owned(),
    };
    let value = match serde_json::from_slice(bytes).map_err(|_| decode_err())? {
        Value::Object(fields) => Value::Object(fold_field_names(fields, T::FIELDS)),
        other => other,
    };
    serde_json::from_value(value).map_err(|_| decode_err())
}

fn fold_field_names(fields: Map<String, Value>, names: &[&str]) -> Map<String, Value> {
    let mut folded = Map::with_capacity(fields.len());
    let exact: Vec<bool> = names.iter().map(|n| fields.contains_key(*n)).collect();
    for (name, value) in fields {
        if names.contains(&name.as_str()) {
            folded.insert(name, value);
            continue;
        }
        match names.iter().position(|n| n.eq_ignore_ascii_case(&name)) {
            Some(idx) if !exact[idx] => {
                folded.insert(names[idx].to_string(), value);
            }
            Some(_) => {}
            None => {
                folded.insert(name, value);
            }
        }
    }
    folded
}

/// Extracts and decodes the transient input that `function` reads.
pub fn transient_input<T: DeserializeOwned + TransientFields>(
    function: Function,
    transient: &TransientMap,
    max_bytes: usize,
) -> Result<T, LedgerError> {
    let Some(key) = function.transient_key() else {
        return Err(LedgerError::Validation(format!(
            "{function} does not take a transient input"
        )));
    };
    let raw = transient_payload(transient, key, max_bytes)?;
    debug!(%function, transient_bytes = raw.len(), "transient payload received");
    decode_transient(key, raw)
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), LedgerError> {
    if value.is_empty() {
        return Err(LedgerError::Validation(format!(
            "{field} field must be a non-empty string"
        )));
    }
    Ok(())
}

pub fn require_positive(field: &str, value: i64) -> Result<(), LedgerError> {
    if value <= 0 {
        return Err(LedgerError::Validation(format!(
            "{field} field must be a positive integer"
        )));
    }
    Ok(())
}

pub fn check_key_len(key: &str, max_bytes: usize) -> Result<(), LedgerError> {
    if key.len() > max_bytes {
        return Err(LedgerError::Validation(format!(
            "key length {} bytes exceeds maximum {max_bytes} bytes",
            key.len()
        )));
    }
    Ok(())
}

/// Fields are checked in wire order; the first violation is reported.
pub fn validate_product_input(
    input: &ProductInput,
    config: &LedgerConfig,
) -> Result<(), LedgerError> {
    require_non_empty("name", &input.name)?;
    require_non_empty("color", &input.color)?;
    require_non_empty("owner", &input.owner)?;
    require_positive("price", input.price)?;
    check_key_len(&input.name, config.max_key_bytes)
}

pub fn validate_org_input(input: &OrgInput, config: &LedgerConfig) -> Result<(), LedgerError> {
    require_non_empty("name", &input.name)?;
    require_non_empty("desc", &input.desc)?;
    require_positive("size", input.size)?;
    check_key_len(&input.name, config.max_key_bytes)
}
