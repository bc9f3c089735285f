use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a sub-table field, keyed by column id.
pub type Row = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    /// Multi-select members in selection order, without duplicates.
    Choices(Vec<String>),
    Rows(Vec<Row>),
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b).is_eq(),
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Choices(a), Self::Choices(b)) => a == b,
            (Self::Rows(a), Self::Rows(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    /// Blank for required-field checks: no value, whitespace-only text,
    /// no selected choices, or no rows.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Choices(c) => c.is_empty(),
            FieldValue::Rows(r) => r.is_empty(),
            FieldValue::Integer(_) | FieldValue::Number(_) | FieldValue::Boolean(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_choices(&self) -> Option<&[String]> {
        match self {
            FieldValue::Choices(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            FieldValue::Rows(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the choice set with `member` added or removed. Any value other
    /// than `Choices` counts as an empty selection; callers editing a stored
    /// field reject non-choice values first.
    pub fn with_member(&self, member: &str, included: bool) -> FieldValue {
        let mut members: Vec<String> = self.as_choices().map(<[String]>::to_vec).unwrap_or_default();
        let present = members.iter().any(|m| m == member);
        if included && !present {
            members.push(member.to_string());
        } else if !included && present {
            members.retain(|m| m != member);
        }
        FieldValue::Choices(members)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}
