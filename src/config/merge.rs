//! Field-by-field merging of configuration tiers.
//!
//! Higher tiers override lower ones key by key. Arrays are replaced, never
//! concatenated.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// - Objects merge recursively; overlay keys win
/// - Any other value in the overlay replaces the base value
/// - A null overlay keeps the base (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use taskflow::config::deep_merge;
///
/// let base = json!({"server": {"host": "127.0.0.1", "port": 31995}});
/// let overlay = json!({"server": {"port": 8080}});
/// assert_eq!(
///     deep_merge(base, overlay),
///     json!({"server": {"host": "127.0.0.1", "port": 8080}})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold `deep_merge` over tiers, lowest priority first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
