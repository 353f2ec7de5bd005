//! Flat query-string pairs folded into a nested object.

use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::IntoParams;

/// Keys consumed by the pipeline itself and never used as filters.
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "fields", "keyword"];

/// Parsed query string.
///
/// Bracketed keys nest (`price[gte]=10` becomes `{"price": {"gte": "10"}}`)
/// and repeated keys collect into an array, in arrival order.
///
/// ```
/// use api_features::QueryParams;
///
/// let params = QueryParams::from_pairs(vec![
///     ("price[gte]".to_string(), "10".to_string()),
///     ("page".to_string(), "2".to_string()),
/// ]);
/// assert_eq!(params.get_str("page"), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    values: Map<String, Value>,
}

impl QueryParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = Map::new();
        for (key, value) in pairs {
            let path = split_key(key.as_ref());
            if path.is_empty() {
                continue;
            }
            insert_path(&mut values, &path, Value::String(value.into()));
        }
        Self { values }
    }

    /// First string value stored under a top-level key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.first().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Every top-level key except the reserved ones and raw operators
    /// such as `$where`.
    pub fn filter_values(&self) -> Map<String, Value> {
        self.values
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()) && !key.starts_with('$'))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `a[b][c]` -> `["a", "b", "c"]`; an unterminated bracket keeps the raw key.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return if key.is_empty() { vec![] } else { vec![key.to_string()] };
    };

    let mut path = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return vec![key.to_string()];
        };
        path.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }

    if !rest.is_empty() || path[0].is_empty() {
        return vec![key.to_string()];
    }
    path
}

fn insert_path(target: &mut Map<String, Value>, path: &[String], value: Value) {
    let (head, tail) = (&path[0], &path[1..]);

    if tail.is_empty() {
        match target.get_mut(head) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing @ Value::String(_)) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            // A scalar never overwrites an operator object already present.
            Some(Value::Object(_)) => {}
            _ => {
                target.insert(head.clone(), value);
            }
        }
        return;
    }

    let slot = target
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(inner) = slot {
        insert_path(inner, tail, value);
    }
}

/// OpenAPI description of the shared list vocabulary.
///
/// Any other key is an equality filter; `field[gt|gte|lt|lte]=value` is a range.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page, 25 documents per page
    pub page: Option<String>,
    /// Comma separated fields, `-` prefix for descending (e.g. `-price,title`)
    pub sort: Option<String>,
    /// Comma separated projection, `-` prefix to exclude
    pub fields: Option<String>,
    /// Case-insensitive search over name, title, description and user fields
    pub keyword: Option<String>,
}
