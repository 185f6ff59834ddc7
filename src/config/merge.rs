//! Configuration merge logic
//!
//! - Objects: deep-merge by key
//! - Arrays and scalars: last layer wins

use serde_json::Value;

/// Deep merge `overlay` onto `base`.
///
/// Objects merge recursively by key; anything else in `overlay` replaces
/// what `base` had, including `null`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let value = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in order; later layers take precedence.
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
