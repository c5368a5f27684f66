//! Sort order specifications.

use std::fmt;

use super::QueryError;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Returns the wire suffix (`ASC` or `DESC`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    /// The field to sort by.
    pub field: String,
    /// The direction.
    pub direction: SortDirection,
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.field, self.direction.as_str())
    }
}

/// An ordered list of sort keys, rendered as `order_by=a_ASC,b_DESC`.
///
/// Accepts either a sequence of `field_DIRECTION` tokens or a single
/// shorthand token (`field` ascending, `-field` descending).
///
/// # Example
///
/// ```rust
/// use cms_client::rest::OrderSpec;
///
/// let order = OrderSpec::parse_tokens(&["created_at_DESC", "title_ASC"]).unwrap();
/// assert_eq!(order.to_string(), "created_at_DESC,title_ASC");
///
/// let order = OrderSpec::parse("-size").unwrap();
/// assert_eq!(order.to_string(), "size_DESC");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSpec {
    clauses: Vec<OrderClause>,
}

impl OrderSpec {
    /// Creates an empty order.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Appends an ascending key.
    #[must_use]
    pub fn asc(mut self, field: impl Into<String>) -> Self {
        self.clauses.push(OrderClause {
            field: field.into(),
            direction: SortDirection::Asc,
        });
        self
    }

    /// Appends a descending key.
    #[must_use]
    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.clauses.push(OrderClause {
            field: field.into(),
            direction: SortDirection::Desc,
        });
        self
    }

    /// Parses a single token or a comma-separated list of tokens.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidSortDirection`] for a token with an
    /// unknown direction suffix.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let tokens: Vec<&str> = input
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        Self::parse_tokens(&tokens)
    }

    /// Parses a sequence of tokens.
    ///
    /// A lone token may use the shorthand form. In a sequence of two or more,
    /// every token must carry an `_ASC` or `_DESC` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidSortDirection`] naming the bad token.
    pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, QueryError> {
        let allow_shorthand = tokens.len() == 1;
        let clauses = tokens
            .iter()
            .map(|token| parse_token(token.as_ref(), allow_shorthand))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { clauses })
    }

    /// Returns the sort keys.
    #[must_use]
    pub fn clauses(&self) -> &[OrderClause] {
        &self.clauses
    }

    /// Returns `true` if no sort key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

fn parse_token(token: &str, allow_shorthand: bool) -> Result<OrderClause, QueryError> {
    let invalid = || QueryError::InvalidSortDirection {
        token: token.to_string(),
    };

    let (body, negated) = token
        .strip_prefix('-')
        .map_or((token, false), |rest| (rest, true));
    if body.is_empty() {
        return Err(invalid());
    }

    if let Some((field, suffix)) = body.rsplit_once('_') {
        let direction = match suffix {
            "ASC" => Some(SortDirection::Asc),
            "DESC" => Some(SortDirection::Desc),
            _ => None,
        };
        if let Some(direction) = direction {
            if negated || field.is_empty() {
                return Err(invalid());
            }
            return Ok(OrderClause {
                field: field.to_string(),
                direction,
            });
        }
        // An uppercase suffix is a direction attempt, e.g. `title_UP`.
        if suffix.chars().all(|c| c.is_ascii_uppercase()) && !suffix.is_empty() {
            return Err(invalid());
        }
    }

    if !allow_shorthand {
        return Err(invalid());
    }

    Ok(OrderClause {
        field: body.to_string(),
        direction: if negated {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_of_suffixed_tokens() {
        let order = OrderSpec::parse_tokens(&["created_at_DESC", "title_ASC"]).unwrap();
        assert_eq!(order.clauses().len(), 2);
        assert_eq!(order.clauses()[0].field, "created_at");
        assert_eq!(order.clauses()[0].direction, SortDirection::Desc);
        assert_eq!(order.to_string(), "created_at_DESC,title_ASC");
    }

    #[test]
    fn test_shorthand_forms() {
        assert_eq!(OrderSpec::parse("size").unwrap().to_string(), "size_ASC");
        assert_eq!(OrderSpec::parse("-size").unwrap().to_string(), "size_DESC");
        assert_eq!(
            OrderSpec::parse("updated_at").unwrap().to_string(),
            "updated_at_ASC"
        );
    }

    #[test]
    fn test_unknown_direction_suffix_is_rejected() {
        let error = OrderSpec::parse("title_UP").unwrap_err();
        assert!(matches!(error, QueryError::InvalidSortDirection { token } if token == "title_UP"));
    }

    #[test]
    fn test_sequence_requires_suffixes() {
        let error = OrderSpec::parse_tokens(&["title_ASC", "size"]).unwrap_err();
        assert!(matches!(error, QueryError::InvalidSortDirection { token } if token == "size"));
    }

    #[test]
    fn test_negated_suffixed_token_is_rejected() {
        assert!(OrderSpec::parse("-title_ASC").is_err());
        assert!(OrderSpec::parse("-").is_err());
    }

    #[test]
    fn test_builder_matches_parsed() {
        let built = OrderSpec::new().desc("created_at").asc("title");
        let parsed = OrderSpec::parse("created_at_DESC, title_ASC").unwrap();
        assert_eq!(built, parsed);
    }
}
