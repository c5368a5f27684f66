//! Query encoding for list operations.
//!
//! Turns a [`FilterSpec`], an optional [`OrderSpec`] and an optional
//! [`PageSpec`] into [`QueryParameters`], which render either as ordered
//! query-string pairs (`filter[size][gt]=5&page[limit]=20`) or as a JSON:API
//! request body for endpoints that take their query by POST.
//!
//! All validation happens here, before a request is built.
//!
//! # Example
//!
//! ```rust
//! use cms_client::rest::{encode, FilterOperator, FilterSpec, PageSpec};
//!
//! let filter = FilterSpec::new()
//!     .field("type", FilterOperator::Eq, "image")
//!     .field("size", FilterOperator::Gt, 1_048_576);
//!
//! let params = encode(&filter, None, Some(&PageSpec::offset(0, 2)), 100).unwrap();
//! let pairs = params.to_query_pairs();
//! assert!(pairs.contains(&("filter[type][eq]".to_string(), "image".to_string())));
//! assert!(pairs.contains(&("page[limit]".to_string(), "2".to_string())));
//! ```

mod filter;
mod order;
mod page;

pub use filter::{FieldFilter, FilterEntry, FilterOperator, FilterSpec, FILTER_GROUPS};
pub use order::{OrderClause, OrderSpec, SortDirection};
pub use page::PageSpec;

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors raised while validating a query, before any request is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A filter used an operator outside the supported set.
    #[error("Invalid filter operator `{operator}` on field `{field}`")]
    InvalidFilterOperator {
        /// The filtered field.
        field: String,
        /// The unrecognized operator key.
        operator: String,
    },

    /// A filter condition has the wrong shape.
    #[error("Invalid filter on `{field}`: {reason}")]
    InvalidFilter {
        /// The filtered field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A sort token has an unknown direction suffix.
    #[error("Invalid sort direction in `{token}` (expected `_ASC` or `_DESC`)")]
    InvalidSortDirection {
        /// The offending token.
        token: String,
    },

    /// The requested page size exceeds the resource maximum.
    #[error("Page limit {limit} exceeds the maximum of {max}")]
    PageLimitExceeded {
        /// The requested limit.
        limit: u32,
        /// The resource maximum.
        max: u32,
    },

    /// The requested page size is zero.
    #[error("Page limit must be at least 1")]
    EmptyPage,

    /// An offset page was given to a cursor-paginated resource, or the reverse.
    #[error("This resource uses {expected} pagination")]
    PaginationMismatch {
        /// The style the resource uses.
        expected: &'static str,
    },
}

/// Validates and bundles the parts of a list query.
///
/// # Errors
///
/// Returns a [`QueryError`] if the filter, order or page is invalid, or if
/// the page limit exceeds `max_limit`.
pub fn encode(
    filter: &FilterSpec,
    order: Option<&OrderSpec>,
    page: Option<&PageSpec>,
    max_limit: u32,
) -> Result<QueryParameters, QueryError> {
    filter.validate()?;
    if let Some(page) = page {
        page.validate(max_limit)?;
    }

    Ok(QueryParameters {
        filter: filter.to_value(),
        order: order.filter(|o| !o.is_empty()).cloned(),
        page: page.cloned(),
        extra: Vec::new(),
    })
}

/// Parameters for a list call.
///
/// # Example
///
/// ```rust
/// use cms_client::rest::{ListParams, FilterSpec, OrderSpec, PageSpec};
///
/// let params = ListParams::new()
///     .filter(FilterSpec::new().equals("type", "image"))
///     .order(OrderSpec::new().desc("created_at"))
///     .page(PageSpec::offset(0, 50))
///     .param("locale", "en");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    /// The filter; empty means "everything".
    pub filter: FilterSpec,
    /// The sort order.
    pub order: Option<OrderSpec>,
    /// The page to fetch; `None` uses the resource default.
    pub page: Option<PageSpec>,
    /// Additional resource-specific parameters, passed through verbatim.
    pub extra: Vec<(String, String)>,
}

impl ListParams {
    /// Creates empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter.
    #[must_use]
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    /// Parses and sets an untyped filter object.
    ///
    /// # Errors
    ///
    /// See [`FilterSpec::from_json`].
    pub fn filter_json(mut self, filter: &Value) -> Result<Self, QueryError> {
        self.filter = FilterSpec::from_json(filter)?;
        Ok(self)
    }

    /// Sets the sort order.
    #[must_use]
    pub fn order(mut self, order: OrderSpec) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the page.
    #[must_use]
    pub fn page(mut self, page: PageSpec) -> Self {
        self.page = Some(page);
        self
    }

    /// Adds a pass-through parameter such as `locale` or `nested`.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Validates and encodes these parameters.
    ///
    /// # Errors
    ///
    /// See [`encode`].
    pub fn encode(&self, max_limit: u32) -> Result<QueryParameters, QueryError> {
        let mut params = encode(
            &self.filter,
            self.order.as_ref(),
            self.page.as_ref(),
            max_limit,
        )?;
        params.extra.clone_from(&self.extra);
        Ok(params)
    }
}

/// A validated query, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameters {
    filter: Value,
    order: Option<OrderSpec>,
    page: Option<PageSpec>,
    extra: Vec<(String, String)>,
}

impl QueryParameters {
    /// Returns the page this query asks for.
    #[must_use]
    pub const fn page(&self) -> Option<&PageSpec> {
        self.page.as_ref()
    }

    /// Returns the rendered filter object.
    #[must_use]
    pub const fn filter(&self) -> &Value {
        &self.filter
    }

    /// Renders the query as ordered query-string pairs.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if self.filter.as_object().is_some_and(|m| !m.is_empty()) {
            flatten_into("filter", &self.filter, &mut pairs);
        }
        if let Some(order) = &self.order {
            pairs.push(("order_by".to_string(), order.to_string()));
        }
        match &self.page {
            Some(PageSpec::Offset { offset, limit }) => {
                pairs.push(("page[offset]".to_string(), offset.to_string()));
                pairs.push(("page[limit]".to_string(), limit.to_string()));
            }
            Some(PageSpec::Cursor { cursor, limit }) => {
                if let Some(limit) = limit {
                    pairs.push(("page[limit]".to_string(), limit.to_string()));
                }
                if let Some(cursor) = cursor {
                    pairs.push(("next_token".to_string(), cursor.clone()));
                }
            }
            None => {}
        }
        pairs.extend(self.extra.iter().cloned());

        pairs
    }

    /// Renders the query as a JSON:API body of the given type.
    #[must_use]
    pub fn to_json_body(&self, query_type: &str) -> Value {
        let mut attributes = Map::new();

        if self.filter.as_object().is_some_and(|m| !m.is_empty()) {
            attributes.insert("filter".to_string(), self.filter.clone());
        }
        if let Some(order) = &self.order {
            attributes.insert("order_by".to_string(), json!(order.to_string()));
        }
        match &self.page {
            Some(PageSpec::Offset { offset, limit }) => {
                attributes.insert(
                    "page".to_string(),
                    json!({"offset": offset, "limit": limit}),
                );
            }
            Some(PageSpec::Cursor { cursor, limit }) => {
                if let Some(limit) = limit {
                    attributes.insert("page".to_string(), json!({ "limit": limit }));
                }
                if let Some(cursor) = cursor {
                    attributes.insert("next_token".to_string(), json!(cursor));
                }
            }
            None => {}
        }
        for (key, value) in &self.extra {
            attributes.insert(key.clone(), json!(value));
        }

        json!({
            "data": {
                "type": query_type,
                "attributes": attributes,
            }
        })
    }
}

/// Flattens a JSON value into bracketed query keys.
///
/// Scalars render as text and `null` as an empty string. Arrays of scalars
/// repeat `key[]`; arrays holding objects or arrays are indexed `key[i]`.
fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => out.push((prefix.to_string(), String::new())),
        Value::Bool(b) => out.push((prefix.to_string(), b.to_string())),
        Value::Number(n) => out.push((prefix.to_string(), n.to_string())),
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        Value::Array(items) => {
            let nested = items.iter().any(|v| v.is_object() || v.is_array());
            for (i, item) in items.iter().enumerate() {
                let key = if nested {
                    format!("{prefix}[{i}]")
                } else {
                    format!("{prefix}[]")
                };
                flatten_into(&key, item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_into(&format!("{prefix}[{key}]"), item, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_encode_example_filter_and_page() {
        let filter = FilterSpec::from_json(&json!({
            "type": {"eq": "image"},
            "size": {"gt": 1_048_576}
        }))
        .unwrap();

        let params = encode(&filter, None, Some(&PageSpec::offset(0, 2)), 100).unwrap();
        let pairs = params.to_query_pairs();

        assert!(pairs.contains(&pair("filter[type][eq]", "image")));
        assert!(pairs.contains(&pair("filter[size][gt]", "1048576")));
        assert!(pairs.contains(&pair("page[offset]", "0")));
        assert!(pairs.contains(&pair("page[limit]", "2")));
    }

    #[test]
    fn test_scalar_arrays_repeat_bracket_key() {
        let filter = FilterSpec::new().field("tags", FilterOperator::AnyIn, json!(["a", "b"]));
        let pairs = encode(&filter, None, None, 100).unwrap().to_query_pairs();

        assert_eq!(
            pairs,
            vec![pair("filter[tags][any_in][]", "a"), pair("filter[tags][any_in][]", "b")]
        );
    }

    #[test]
    fn test_object_values_nest_and_null_is_empty() {
        let filter = FilterSpec::from_json(&json!({
            "fields": {"title": {"matches": {"pattern": "foo", "case_sensitive": false}}},
            "alt": {"eq": null}
        }))
        .unwrap();
        let pairs = encode(&filter, None, None, 100).unwrap().to_query_pairs();

        assert!(pairs.contains(&pair("filter[fields][title][matches][pattern]", "foo")));
        assert!(pairs.contains(&pair(
            "filter[fields][title][matches][case_sensitive]",
            "false"
        )));
        assert!(pairs.contains(&pair("filter[alt][eq]", "")));
    }

    #[test]
    fn test_arrays_of_objects_are_indexed() {
        let mut out = Vec::new();
        flatten_into("x", &json!([{"a": 1}, {"a": 2}]), &mut out);
        assert_eq!(out, vec![pair("x[0][a]", "1"), pair("x[1][a]", "2")]);
    }

    #[test]
    fn test_order_and_cursor_rendering() {
        let order = OrderSpec::parse("created_at_DESC,title_ASC").unwrap();
        let page = PageSpec::cursor("tok", Some(50));
        let pairs = encode(&FilterSpec::new(), Some(&order), Some(&page), 500)
            .unwrap()
            .to_query_pairs();

        assert_eq!(
            pairs,
            vec![
                pair("order_by", "created_at_DESC,title_ASC"),
                pair("page[limit]", "50"),
                pair("next_token", "tok"),
            ]
        );
    }

    #[test]
    fn test_json_body_rendering() {
        let filter = FilterSpec::new().field("action_name", FilterOperator::Eq, "items.update");
        let params = ListParams::new()
            .filter(filter)
            .order(OrderSpec::new().desc("created_at"))
            .page(PageSpec::cursor("abc", Some(20)))
            .encode(500)
            .unwrap();

        assert_eq!(
            params.to_json_body("audit_log_query"),
            json!({
                "data": {
                    "type": "audit_log_query",
                    "attributes": {
                        "filter": {"action_name": {"eq": "items.update"}},
                        "order_by": "created_at_DESC",
                        "page": {"limit": 20},
                        "next_token": "abc"
                    }
                }
            })
        );
    }

    #[test]
    fn test_page_limit_is_enforced_before_rendering() {
        let result = encode(&FilterSpec::new(), None, Some(&PageSpec::offset(0, 101)), 100);
        assert_eq!(result, Err(QueryError::PageLimitExceeded { limit: 101, max: 100 }));
    }

    #[test]
    fn test_extra_params_are_appended() {
        let pairs = ListParams::new()
            .param("locale", "en")
            .encode(100)
            .unwrap()
            .to_query_pairs();
        assert_eq!(pairs, vec![pair("locale", "en")]);
    }

    #[test]
    fn test_pairs_survive_url_encoding() {
        let filter = FilterSpec::new()
            .field("filename", FilterOperator::Matches, "a b&c=d/é")
            .field("tags", FilterOperator::In, json!(["x y", "z"]));
        let pairs = encode(&filter, None, None, 100).unwrap().to_query_pairs();

        for (key, value) in &pairs {
            let encoded_key = urlencoding::encode(key);
            let encoded_value = urlencoding::encode(value);
            assert_eq!(urlencoding::decode(&encoded_key).unwrap(), *key);
            assert_eq!(urlencoding::decode(&encoded_value).unwrap(), *value);
        }
        assert!(pairs.contains(&pair("filter[filename][matches]", "a b&c=d/é")));
    }
}
