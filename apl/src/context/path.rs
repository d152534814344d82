//! Dotted-path access over JSON values
//!
//! A path is split on `.`. Mappings are indexed by string key; lists are
//! indexed by all-digit segments. Reads fail softly (the caller supplies the
//! default); writes create intermediate mappings and extend lists as needed.

use serde_json::{Map, Value};

/// Parse an all-digit segment as a list index
fn digit_index(segment: &str) -> Option<usize> {
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        segment.parse().ok()
    } else {
        None
    }
}

/// Resolve a dotted path against a value, or `None` when the traversal
/// encounters a missing key or a non-navigable element
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(list) => list.get(digit_index(segment)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Assign a value at a dotted path, creating intermediate structure
///
/// Digit segments index into existing lists (extending them with nulls when
/// short); every other case indexes a mapping, replacing non-container
/// intermediates with fresh mappings.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    assign(root, &segments, value);
}

fn assign(node: &mut Value, segments: &[&str], value: Value) {
    let segment = segments[0];
    let rest = &segments[1..];

    if let Some(idx) = digit_index(segment) {
        if let Value::Array(list) = node {
            if list.len() <= idx {
                list.resize(idx + 1, Value::Null);
            }
            if rest.is_empty() {
                list[idx] = value;
            } else {
                assign(&mut list[idx], rest, value);
            }
            return;
        }
    }

    if !matches!(node, Value::Object(_)) {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        if rest.is_empty() {
            map.insert(segment.to_string(), value);
        } else {
            let child = map.entry(segment.to_string()).or_insert(Value::Null);
            assign(child, rest, value);
        }
    }
}
