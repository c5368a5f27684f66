//! Filter specifications.
//!
//! A [`FilterSpec`] maps field names to conditions. A condition is either a
//! literal (implicit equality) or a set of operator/value pairs such as
//! `{gte: 10, lt: 20}`. Item field filters live in a named group, rendered
//! as `filter[fields][title][matches]`.
//!
//! Operators are a closed set ([`FilterOperator`]). Untyped input parsed with
//! [`FilterSpec::from_json`] is validated against it before any request is
//! built.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::QueryError;

/// Names that introduce a nested group of field conditions.
pub const FILTER_GROUPS: &[&str] = &["fields"];

/// A filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Equal to.
    Eq,
    /// Not equal to.
    Neq,
    /// Value is one of the given list.
    In,
    /// Value is none of the given list.
    NotIn,
    /// Field shares at least one element with the list.
    AnyIn,
    /// Field contains every element of the list.
    AllIn,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Field is present (`true`) or absent (`false`).
    Exists,
    /// Text pattern match.
    Matches,
}

impl FilterOperator {
    /// Every operator, in wire-name order.
    pub const ALL: [Self; 12] = [
        Self::Eq,
        Self::Neq,
        Self::In,
        Self::NotIn,
        Self::AnyIn,
        Self::AllIn,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Exists,
        Self::Matches,
    ];

    /// Returns the name sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::AnyIn => "any_in",
            Self::AllIn => "all_in",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Exists => "exists",
            Self::Matches => "matches",
        }
    }

    /// Parses an operator name. Both `notIn` and `not_in` are accepted.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "notIn" => Some(Self::NotIn),
            other => Self::ALL.into_iter().find(|op| op.as_str() == other),
        }
    }

    const fn expects_list(self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::AnyIn | Self::AllIn)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| s.to_string())
    }
}

/// The condition placed on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// A bare literal, equivalent to `{eq: value}`.
    Equals(Value),
    /// Explicit operator/value pairs, all of which must hold.
    Operators(Vec<(FilterOperator, Value)>),
}

impl FieldFilter {
    fn to_value(&self) -> Value {
        let mut map = Map::new();
        match self {
            Self::Equals(value) => {
                map.insert(FilterOperator::Eq.as_str().to_string(), value.clone());
            }
            Self::Operators(pairs) => {
                for (op, value) in pairs {
                    map.insert(op.as_str().to_string(), value.clone());
                }
            }
        }
        Value::Object(map)
    }

    fn validate(&self, field: &str) -> Result<(), QueryError> {
        let pairs = match self {
            Self::Equals(value) => return check_not_empty(field, FilterOperator::Eq, value),
            Self::Operators(pairs) => pairs,
        };
        if pairs.is_empty() {
            return Err(QueryError::InvalidFilter {
                field: field.to_string(),
                reason: "no operators given".to_string(),
            });
        }
        for (op, value) in pairs {
            if op.expects_list() && !value.is_array() {
                return Err(QueryError::InvalidFilter {
                    field: field.to_string(),
                    reason: format!("`{op}` expects a list"),
                });
            }
            if *op == FilterOperator::Exists && !value.is_boolean() {
                return Err(QueryError::InvalidFilter {
                    field: field.to_string(),
                    reason: "`exists` expects true or false".to_string(),
                });
            }
            check_not_empty(field, *op, value)?;
        }
        Ok(())
    }
}

// An empty list or object encodes to no query pairs at all, which the server
// reads as "no condition" instead of "match nothing".
fn check_not_empty(field: &str, op: FilterOperator, value: &Value) -> Result<(), QueryError> {
    let empty = match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return Err(QueryError::InvalidFilter {
            field: field.to_string(),
            reason: format!("`{op}` needs a non-empty value"),
        });
    }
    Ok(())
}

/// One entry of a [`FilterSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEntry {
    /// A condition on a single field.
    Field {
        /// The field name.
        field: String,
        /// The condition.
        filter: FieldFilter,
    },
    /// A named group of nested conditions.
    Group {
        /// The group name, e.g. `fields`.
        name: String,
        /// The nested filter.
        filter: FilterSpec,
    },
}

/// A structured filter, validated before it is encoded.
///
/// # Example
///
/// ```rust
/// use cms_client::rest::{FilterOperator, FilterSpec};
///
/// let filter = FilterSpec::new()
///     .field("type", FilterOperator::Eq, "image")
///     .field("size", FilterOperator::Gt, 1_048_576);
/// assert_eq!(filter.len(), 2);
///
/// let parsed = FilterSpec::from_json(&serde_json::json!({
///     "type": {"eq": "image"},
///     "size": {"gt": 1048576}
/// }))
/// .unwrap();
/// assert_eq!(parsed.to_value(), filter.to_value());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    entries: Vec<FilterEntry>,
}

impl FilterSpec {
    /// Creates an empty filter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds `field <op> value`, merging with earlier operators on the same field.
    #[must_use]
    pub fn field(
        mut self,
        field: impl Into<String>,
        op: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        let field = field.into();
        let value = value.into();

        let existing = self.entries.iter_mut().find_map(|entry| match entry {
            FilterEntry::Field { field: name, filter } if *name == field => Some(filter),
            _ => None,
        });

        match existing {
            Some(filter) => {
                let previous = std::mem::replace(filter, FieldFilter::Operators(Vec::new()));
                let mut pairs = match previous {
                    FieldFilter::Equals(previous) => vec![(FilterOperator::Eq, previous)],
                    FieldFilter::Operators(pairs) => pairs,
                };
                pairs.retain(|(existing_op, _)| *existing_op != op);
                pairs.push((op, value));
                *filter = FieldFilter::Operators(pairs);
            }
            None => self.entries.push(FilterEntry::Field {
                field,
                filter: FieldFilter::Operators(vec![(op, value)]),
            }),
        }
        self
    }

    /// Adds a literal condition (implicit equality).
    #[must_use]
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push(FilterEntry::Field {
            field: field.into(),
            filter: FieldFilter::Equals(value.into()),
        });
        self
    }

    /// Adds a condition given an operator by name.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidFilterOperator`] if `op` is not a known
    /// operator.
    pub fn condition(
        self,
        field: impl Into<String>,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        let field = field.into();
        let operator = FilterOperator::parse(op).ok_or_else(|| QueryError::InvalidFilterOperator {
            field: field.clone(),
            operator: op.to_string(),
        })?;
        Ok(self.field(field, operator, value))
    }

    /// Adds a nested group such as `fields`.
    #[must_use]
    pub fn group(mut self, name: impl Into<String>, filter: Self) -> Self {
        self.entries.push(FilterEntry::Group {
            name: name.into(),
            filter,
        });
        self
    }

    /// Parses an untyped filter object.
    ///
    /// Scalars and arrays are literals. Objects must contain only operator
    /// keys, except under a group name from [`FILTER_GROUPS`].
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidFilterOperator`] naming the field and the
    /// unrecognized key, or [`QueryError::InvalidFilter`] when the input is
    /// not an object or an operator value has the wrong shape.
    pub fn from_json(value: &Value) -> Result<Self, QueryError> {
        Self::from_json_scoped(value, None)
    }

    fn from_json_scoped(value: &Value, scope: Option<&str>) -> Result<Self, QueryError> {
        let Value::Object(map) = value else {
            return Err(QueryError::InvalidFilter {
                field: scope.unwrap_or("filter").to_string(),
                reason: "expected an object".to_string(),
            });
        };

        let mut spec = Self::new();
        for (field, condition) in map {
            let qualified = scope.map_or_else(|| field.clone(), |s| format!("{s}.{field}"));

            if scope.is_none() && FILTER_GROUPS.contains(&field.as_str()) {
                let nested = Self::from_json_scoped(condition, Some(field))?;
                spec.entries.push(FilterEntry::Group {
                    name: field.clone(),
                    filter: nested,
                });
                continue;
            }

            let filter = match condition {
                Value::Object(ops) => {
                    let mut pairs = Vec::with_capacity(ops.len());
                    for (key, operand) in ops {
                        let op = FilterOperator::parse(key).ok_or_else(|| {
                            QueryError::InvalidFilterOperator {
                                field: qualified.clone(),
                                operator: key.clone(),
                            }
                        })?;
                        pairs.push((op, operand.clone()));
                    }
                    FieldFilter::Operators(pairs)
                }
                literal => FieldFilter::Equals(literal.clone()),
            };
            filter.validate(&qualified)?;
            spec.entries.push(FilterEntry::Field {
                field: field.clone(),
                filter,
            });
        }
        Ok(spec)
    }

    /// Checks every operator value has a usable shape.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidFilter`] naming the offending field.
    pub fn validate(&self) -> Result<(), QueryError> {
        self.validate_scoped(None)
    }

    fn validate_scoped(&self, scope: Option<&str>) -> Result<(), QueryError> {
        for entry in &self.entries {
            match entry {
                FilterEntry::Field { field, filter } => {
                    let qualified = scope.map_or_else(|| field.clone(), |s| format!("{s}.{field}"));
                    filter.validate(&qualified)?;
                }
                FilterEntry::Group { name, filter } => filter.validate_scoped(Some(name))?,
            }
        }
        Ok(())
    }

    /// Returns the entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// Returns the number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the filter has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the filter as a JSON object of `field -> {op: value}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for entry in &self.entries {
            match entry {
                FilterEntry::Field { field, filter } => {
                    let rendered = filter.to_value();
                    match map.get_mut(field) {
                        Some(Value::Object(existing)) => {
                            if let Value::Object(new_ops) = rendered {
                                existing.extend(new_ops);
                            }
                        }
                        _ => {
                            map.insert(field.clone(), rendered);
                        }
                    }
                }
                FilterEntry::Group { name, filter } => {
                    map.insert(name.clone(), filter.to_value());
                }
            }
        }
        Value::Object(map)
    }
}
