//! Immutable list-query builder: paginate, filter, sort, search, fields.

use std::sync::LazyLock;

use futures_util::TryStreamExt;
use mongodb::{
    Collection,
    bson::{Bson, Document, doc, oid::ObjectId},
    options::FindOptions,
};
use regex::Regex;
use serde_json::{Map, Value};

use crate::metadata::{PAGE_SIZE, PageMetadata, calculate_total_and_pages};
use crate::params::QueryParams;

/// Fields matched by `keyword`, whatever the collection.
pub const SEARCH_FIELDS: [&str; 7] = [
    "fName",
    "lName",
    "email",
    "role",
    "name",
    "title",
    "description",
];

static OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(gt|gte|lt|lte)\b").expect("operator pattern is a valid regex")
});

/// A list query under construction.
///
/// Every stage consumes the builder and returns a new one. The base
/// predicate, filter and search are combined with `$and`, so a caller
/// supplied filter can narrow a scoped base but never widen it.
///
/// ```
/// use api_features::{ListQuery, QueryParams};
/// use mongodb::bson::doc;
///
/// let params = QueryParams::from_pairs(vec![("page", "3".to_string())]);
/// let query = ListQuery::new(doc! { "user": "me" }, params)
///     .paginate()
///     .filter()
///     .sort()
///     .search()
///     .fields();
/// assert_eq!(query.page(), 3);
/// assert_eq!(query.skip(), 50);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ListQuery {
    params: QueryParams,
    base: Document,
    page: u64,
    paginated: bool,
    filter: Document,
    search: Document,
    sort: Option<Document>,
    projection: Option<Document>,
}

impl ListQuery {
    pub fn new(base: Document, params: QueryParams) -> Self {
        Self {
            params,
            base,
            page: 1,
            paginated: false,
            filter: Document::new(),
            search: Document::new(),
            sort: None,
            projection: None,
        }
    }

    /// Run every stage in the fixed order.
    pub fn from_params(base: Document, params: QueryParams) -> Self {
        Self::new(base, params)
            .paginate()
            .filter()
            .sort()
            .search()
            .fields()
    }

    /// Resolve the page number; zero, negative and non-numeric pages become 1.
    pub fn paginate(mut self) -> Self {
        self.page = parse_page(self.params.get_str("page"));
        self.paginated = true;
        self
    }

    /// Equality and range filters from every non-reserved key.
    pub fn filter(mut self) -> Self {
        self.filter = build_filter(self.params.filter_values());
        self
    }

    pub fn sort(mut self) -> Self {
        self.sort = self
            .params
            .get_str("sort")
            .map(|raw| signed_fields(raw, -1))
            .filter(|d| !d.is_empty());
        self
    }

    /// Case-insensitive keyword match across [`SEARCH_FIELDS`].
    pub fn search(mut self) -> Self {
        if let Some(keyword) = self.params.get_str("keyword").filter(|k| !k.is_empty()) {
            let pattern = regex::escape(keyword);
            let clauses: Vec<Bson> = SEARCH_FIELDS
                .iter()
                .map(|field| {
                    Bson::Document(doc! { *field: { "$regex": pattern.as_str(), "$options": "i" } })
                })
                .collect();
            self.search = doc! { "$or": clauses };
        }
        self
    }

    pub fn fields(mut self) -> Self {
        self.projection = self
            .params
            .get_str("fields")
            .map(|raw| signed_fields(raw, 0))
            .filter(|d| !d.is_empty());
        self
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(PAGE_SIZE)
    }

    /// The combined predicate, also usable for `count_documents`.
    pub fn conditions(&self) -> Document {
        let parts: Vec<&Document> = [&self.base, &self.filter, &self.search]
            .into_iter()
            .filter(|d| !d.is_empty())
            .collect();

        match parts.as_slice() {
            [] => Document::new(),
            [only] => (*only).clone(),
            many => {
                let all: Vec<Bson> = many.iter().map(|d| Bson::Document((*d).clone())).collect();
                doc! { "$and": all }
            }
        }
    }

    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        if self.paginated {
            options.skip = Some(self.skip());
            options.limit = Some(PAGE_SIZE as i64);
        }
        options.sort = self.sort.clone();
        options.projection = self.projection.clone();
        options
    }

    /// Predicate and options, ready for `Collection::find`.
    pub fn compile(&self) -> (Document, FindOptions) {
        (self.conditions(), self.find_options())
    }

    /// Fetch the current page as raw documents; projections may drop any field.
    pub async fn execute<T: Send + Sync>(
        &self,
        collection: &Collection<T>,
    ) -> mongodb::error::Result<Vec<Document>> {
        let (filter, options) = self.compile();
        tracing::debug!(collection = %collection.name(), filter = %filter, "executing list query");

        collection
            .clone_with_type::<Document>()
            .find(filter)
            .with_options(options)
            .await?
            .try_collect()
            .await
    }

    /// Count every document matching [`Self::conditions`], ignoring pagination.
    pub async fn count<T: Send + Sync>(
        &self,
        collection: &Collection<T>,
    ) -> mongodb::error::Result<u64> {
        collection.count_documents(self.conditions()).await
    }

    pub fn metadata(&self, total: u64) -> PageMetadata {
        calculate_total_and_pages(total)
    }
}

fn parse_page(raw: Option<&str>) -> u64 {
    let Some(value) = raw.and_then(|r| r.trim().parse::<f64>().ok()) else {
        return 1;
    };
    if !value.is_finite() || value < 1.0 {
        return 1;
    }
    // Float to int casts saturate.
    value.floor() as u64
}

/// `"-price,title"` -> `{price: neg, title: 1}`.
fn signed_fields(raw: &str, negative: i32) -> Document {
    let mut out = Document::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.strip_prefix('-') {
            Some(field) if !field.is_empty() => {
                out.insert(field, negative);
            }
            Some(_) => {}
            None => {
                out.insert(token, 1);
            }
        }
    }
    out
}

/// Comparison operators a caller may put inside a field object.
const RANGE_OPERATORS: [&str; 4] = ["$gt", "$gte", "$lt", "$lte"];

/// Rewrite range operators over the serialized object, then type the values.
///
/// Equality keeps the raw text next to its typed reading, so `code=007`
/// still finds a stored `"007"`. Only range bounds are coerced outright.
fn build_filter(values: Map<String, Value>) -> Document {
    if values.is_empty() {
        return Document::new();
    }

    let serialized = Value::Object(values).to_string();
    let rewritten = OPERATOR.replace_all(&serialized, "$$$1");

    let parsed = match serde_json::from_str::<Value>(&rewritten) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::warn!(filter = %rewritten, "operator rewrite produced invalid JSON, ignoring filter");
            return Document::new();
        }
    };

    parsed
        .into_iter()
        // A bare `gte=` key turns into a top-level operator after the rewrite.
        .filter(|(key, _)| !key.starts_with('$'))
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Array(items) => {
                    let any_of: Vec<Bson> = items.into_iter().flat_map(equality_candidates).collect();
                    Bson::Document(doc! { "$in": any_of })
                }
                Value::Object(map) => {
                    let object = field_object(map);
                    if object.is_empty() {
                        return None;
                    }
                    Bson::Document(object)
                }
                other => match equality_candidates(other).as_slice() {
                    [only] => only.clone(),
                    any_of => Bson::Document(doc! { "$in": any_of.to_vec() }),
                },
            };
            Some((key, value))
        })
        .collect()
}

/// Range bounds are coerced; nested equality keeps its text; any other
/// operator is dropped.
fn field_object(map: Map<String, Value>) -> Document {
    map.into_iter()
        .filter_map(|(key, value)| {
            if RANGE_OPERATORS.contains(&key.as_str()) {
                Some((key, coerce(value)))
            } else if key.starts_with('$') {
                None
            } else {
                Some((key, raw(value)))
            }
        })
        .collect()
}

/// The typed reading of a query value followed by its raw text, when they differ.
fn equality_candidates(value: Value) -> Vec<Bson> {
    match value {
        Value::String(s) => match coerce_str(s.clone()) {
            Bson::String(_) => vec![Bson::String(s)],
            typed => vec![typed, Bson::String(s)],
        },
        other => vec![raw(other)],
    }
}

/// Map query-string text to the BSON type a stored field most likely has.
fn coerce(value: Value) -> Bson {
    match value {
        Value::String(s) => coerce_str(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(coerce).collect()),
        Value::Object(map) => Bson::Document(
            map.into_iter()
                .map(|(key, value)| (key, coerce(value)))
                .collect(),
        ),
        other => raw(other),
    }
}

/// JSON to BSON without reinterpreting strings.
fn raw(value: Value) -> Bson {
    match value {
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(raw).collect()),
        Value::Object(map) => Bson::Document(
            map.into_iter()
                .map(|(key, value)| (key, raw(value)))
                .collect(),
        ),
        Value::Bool(b) => Bson::Boolean(b),
        Value::Null => Bson::Null,
        Value::Number(n) => n
            .as_i64()
            .map(Bson::Int64)
            .or_else(|| n.as_f64().map(Bson::Double))
            .unwrap_or(Bson::Null),
    }
}

fn coerce_str(s: String) -> Bson {
    if let Ok(i) = s.parse::<i64>() {
        return Bson::Int64(i);
    }
    let numeric_shape = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if numeric_shape {
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return Bson::Double(f);
            }
        }
    }
    match s.as_str() {
        "true" => return Bson::Boolean(true),
        "false" => return Bson::Boolean(false),
        _ => {}
    }
    if s.len() == 24 {
        if let Ok(oid) = ObjectId::parse_str(&s) {
            return Bson::ObjectId(oid);
        }
    }
    Bson::String(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        ListQuery::from_params(
            Document::new(),
            QueryParams::from_pairs(pairs.iter().map(|(k, v)| (*k, v.to_string()))),
        )
    }

    #[test]
    fn test_page_defaults_and_normalisation() {
        assert_eq!(query(&[]).page(), 1);
        assert_eq!(query(&[("page", "0")]).page(), 1);
        assert_eq!(query(&[("page", "-4")]).page(), 1);
        assert_eq!(query(&[("page", "abc")]).page(), 1);
        assert_eq!(query(&[("page", "2.7")]).page(), 2);
    }

    #[test]
    fn test_page_window() {
        let q = query(&[("page", "3")]);
        let options = q.find_options();
        assert_eq!(options.skip, Some(50));
        assert_eq!(options.limit, Some(25));
    }

    #[test]
    fn test_unpaginated_query_has_no_window() {
        let q = ListQuery::new(Document::new(), QueryParams::default()).filter();
        assert_eq!(q.find_options().limit, None);
    }

    #[test]
    fn test_range_operators_are_rewritten() {
        let q = query(&[("price[gte]", "10"), ("price[lt]", "99.5")]);
        assert_eq!(
            q.conditions(),
            doc! { "price": { "$gte": 10_i64, "$lt": 99.5 } }
        );
    }

    #[test]
    fn test_literal_operator_values_are_rewritten_too() {
        let q = query(&[("status", "gte"), ("code", "a-gte")]);
        let conditions = q.conditions();
        assert_eq!(conditions.get_str("status").unwrap(), "$gte");
        assert_eq!(conditions.get_str("code").unwrap(), "a-$gte");
    }

    #[test]
    fn test_operator_inside_word_is_untouched() {
        let q = query(&[("title", "lightweight")]);
        assert_eq!(q.conditions().get_str("title").unwrap(), "lightweight");
    }

    #[test]
    fn test_unknown_fields_pass_through_as_equality() {
        let q = query(&[("doesNotExist", "x"), ("empty", "true")]);
        assert_eq!(
            q.conditions(),
            doc! { "doesNotExist": "x", "empty": { "$in": [true, "true"] } }
        );
    }

    #[test]
    fn test_numeric_looking_equality_keeps_the_raw_text() {
        let params = QueryParams::from_pairs([("code", "007"), ("title", "2024")]);
        assert_eq!(params.get_str("code"), Some("007"));

        let q = ListQuery::from_params(Document::new(), params);
        assert_eq!(
            q.conditions(),
            doc! {
                "code": { "$in": [7_i64, "007"] },
                "title": { "$in": [2024_i64, "2024"] },
            }
        );
    }

    #[test]
    fn test_object_id_values_match_either_form() {
        let id = "65a1b2c3d4e5f60718293a4b";
        let q = query(&[("category", id)]);
        assert_eq!(
            q.conditions(),
            doc! { "category": { "$in": [ObjectId::parse_str(id).unwrap(), id] } }
        );
    }

    #[test]
    fn test_repeated_values_become_in() {
        let q = query(&[("brand", "x"), ("brand", "y"), ("brand", "3")]);
        assert_eq!(
            q.conditions(),
            doc! { "brand": { "$in": ["x", "y", 3_i64, "3"] } }
        );
    }

    #[test]
    fn test_nested_equality_is_not_coerced() {
        let q = query(&[("size[label]", "42"), ("price[gt]", "5")]);
        assert_eq!(
            q.conditions(),
            doc! { "size": { "label": "42" }, "price": { "$gt": 5_i64 } }
        );
    }

    #[test]
    fn test_operator_keys_outside_ranges_are_dropped() {
        let q = query(&[("gte", "1"), ("price[$where]", "sleep(1)"), ("sold", "x")]);
        assert_eq!(q.conditions(), doc! { "sold": "x" });
    }

    #[test]
    fn test_sort_and_fields() {
        let q = query(&[("sort", "-price,title"), ("fields", "title,-description")]);
        let options = q.find_options();
        assert_eq!(options.sort, Some(doc! { "price": -1, "title": 1 }));
        assert_eq!(options.projection, Some(doc! { "title": 1, "description": 0 }));
    }

    #[test]
    fn test_keyword_searches_whitelist_case_insensitively() {
        let q = query(&[("keyword", "phone")]);
        let conditions = q.conditions();
        let clauses = conditions.get_array("$or").unwrap();
        assert_eq!(clauses.len(), SEARCH_FIELDS.len());
        assert_eq!(
            clauses[5],
            Bson::Document(doc! { "title": { "$regex": "phone", "$options": "i" } })
        );
    }

    #[test]
    fn test_base_filter_and_search_are_and_combined() {
        let q = ListQuery::from_params(
            doc! { "user": "me" },
            QueryParams::from_pairs(vec![
                ("user", "someone-else".to_string()),
                ("keyword", "baby".to_string()),
            ]),
        );
        let conditions = q.conditions();
        let parts = conditions.get_array("$and").unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], Bson::Document(doc! { "user": "me" }));
    }

    #[test]
    fn test_base_only_is_returned_unwrapped() {
        let q = ListQuery::from_params(doc! { "hospital": 1 }, QueryParams::default());
        assert_eq!(q.conditions(), doc! { "hospital": 1 });
    }

    #[test]
    fn test_metadata() {
        let q = query(&[]);
        let meta = q.metadata(51);
        assert_eq!(meta.total, 51);
        assert_eq!(meta.pages, 3);
    }
}
