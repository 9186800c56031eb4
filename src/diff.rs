use serde_json::{Map, Value};

/// One leaf-level difference between two JSON documents.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JsonChange {
    pub path: String,
    pub old: Value,
    pub new: Value,
}

/// Recursively compare two JSON values, reporting dotted paths to every
/// leaf that changed or appeared. Keys present only in `previous` are not
/// reported; the vendor never removes fields between polls.
pub(crate) fn diff_json(previous: &Value, current: &Value) -> Vec<JsonChange> {
    let mut changes = Vec::new();
    walk(previous, current, "", &mut changes);
    changes
}

fn walk(previous: &Value, current: &Value, prefix: &str, changes: &mut Vec<JsonChange>) {
    match (previous, current) {
        (Value::Object(prev_map), Value::Object(curr_map)) => {
            for (key, curr_val) in curr_map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match prev_map.get(key) {
                    Some(prev_val) => walk(prev_val, curr_val, &path, changes),
                    None if curr_val.is_object() => {
                        walk(&Value::Object(Map::new()), curr_val, &path, changes);
                    }
                    None => changes.push(JsonChange {
                        path,
                        old: Value::Null,
                        new: curr_val.clone(),
                    }),
                }
            }
        }
        (prev, curr) if prev != curr => changes.push(JsonChange {
            path: prefix.to_string(),
            old: prev.clone(),
            new: curr.clone(),
        }),
        _ => {}
    }
}
