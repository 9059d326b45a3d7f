use async_trait::async_trait;
use orgair_errors::OrgAirResult;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// A single column value as handed back by the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl StoreValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            StoreValue::Null => "null",
            StoreValue::Bool(_) => "bool",
            StoreValue::Integer(_) => "integer",
            StoreValue::Float(_) => "float",
            StoreValue::Text(_) => "text",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StoreValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StoreValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Exact decimal view of the value.
    ///
    /// Floats go through their shortest textual form, so a driver that hands
    /// back `0.15` as a double still yields the decimal `0.15`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            StoreValue::Text(text) => parse_decimal(text.trim()),
            StoreValue::Integer(value) => Some(Decimal::from(*value)),
            StoreValue::Float(value) if value.is_finite() => parse_decimal(&value.to_string()),
            _ => None,
        }
    }
}

pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

impl fmt::Display for StoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreValue::Null => write!(f, "NULL"),
            StoreValue::Bool(value) => write!(f, "{value}"),
            StoreValue::Integer(value) => write!(f, "{value}"),
            StoreValue::Float(value) => write!(f, "{value}"),
            StoreValue::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        StoreValue::Text(value.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        StoreValue::Text(value)
    }
}

impl From<bool> for StoreValue {
    fn from(value: bool) -> Self {
        StoreValue::Bool(value)
    }
}

impl From<i64> for StoreValue {
    fn from(value: i64) -> Self {
        StoreValue::Integer(value)
    }
}

impl<T: Into<StoreValue>> From<Option<T>> for StoreValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(StoreValue::Null)
    }
}

/// Column-ordered row mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreRow {
    columns: Vec<(String, StoreValue)>,
}

impl StoreRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<StoreValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<StoreValue>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&StoreValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoreValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Read-only access to the relational store.
///
/// Implementations only run the query they are given; they never cache and
/// never interpret rows. Connection problems must surface as
/// `OrgAirError::StoreUnavailable` so callers can tell them apart from a
/// missing record.
#[async_trait]
pub trait StoreAccessPort: Send + Sync {
    async fn fetch_one(&self, query: &str, params: &[StoreValue])
        -> OrgAirResult<Option<StoreRow>>;

    async fn fetch_many(&self, query: &str, params: &[StoreValue]) -> OrgAirResult<Vec<StoreRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_preserves_column_order() {
        let row = StoreRow::new()
            .with("focus_group_id", "pe_technology")
            .with("group_name", "Technology")
            .with("group_code", "TECHNOLOGY");

        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["focus_group_id", "group_name", "group_code"]);
        assert_eq!(row.get("group_name").and_then(StoreValue::as_text), Some("Technology"));
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_decimal_conversion() {
        assert_eq!(
            StoreValue::from("0.30").to_decimal(),
            Some(Decimal::from_str("0.30").unwrap())
        );
        assert_eq!(
            StoreValue::Float(0.15).to_decimal(),
            Some(Decimal::from_str("0.15").unwrap())
        );
        assert_eq!(StoreValue::Integer(75).to_decimal(), Some(Decimal::from(75)));
        assert_eq!(StoreValue::from("abc").to_decimal(), None);
        assert_eq!(StoreValue::Null.to_decimal(), None);
        assert_eq!(StoreValue::Float(f64::NAN).to_decimal(), None);
    }

    #[test]
    fn test_option_into_store_value() {
        let none: Option<&str> = None;
        assert!(StoreValue::from(none).is_null());
        assert_eq!(StoreValue::from(Some("x")), StoreValue::Text("x".to_string()));
    }
}
