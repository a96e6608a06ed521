//! Status extraction from JSON response bodies
//!
//! Control-plane APIs encode status in many shapes: `"ACTIVE"`, `200`,
//! `true`. These helpers read the field at a dotted path and normalize
//! scalars to the string form used by [`StatusTable`](crate::StatusTable).

use serde_json::Value;

/// Walk a dotted path (`graph.status`, `jobs.0.state`) through objects and arrays
pub fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(body, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// String form of a scalar status; `null`, arrays and objects have none
pub fn status_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Extractor for [`StatusTable::with_extractor`](crate::StatusTable::with_extractor)
///
/// ```
/// use opwait::{status, Classification, Classify, StatusTable};
/// use serde_json::json;
///
/// let classifier = StatusTable::new()
///     .success(["400"])
///     .failure(["300", "303", "800"])
///     .with_extractor(status::json_status("graph.status"));
///
/// let body = json!({ "graph": { "status": 400 } });
/// assert_eq!(classifier.classify(&body), Classification::Success);
/// ```
pub fn json_status(path: impl Into<String>) -> impl Fn(&Value) -> Option<String> + Clone {
    let path = path.into();
    move |body: &Value| lookup(body, &path).and_then(status_string)
}
