//! The attribute write primitive.
//!
//! Every mapper that writes to a local user goes through
//! [`apply_attribute`]; values are typed as [`AttributeValue`] so the
//! write path can match on absence, scalars and lists.

use kc_model::User;
use serde::{Deserialize, Serialize};

/// A value read off a remote record, ready to be written locally.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttributeValue {
    /// No value: the local attribute is removed.
    #[default]
    Absent,
    /// A single value.
    Scalar(String),
    /// An ordered list of values.
    List(Vec<String>),
}

impl AttributeValue {
    /// Builds a scalar from anything printable.
    #[must_use]
    pub fn scalar(value: impl ToString) -> Self {
        Self::Scalar(value.to_string())
    }

    /// Returns true if there is nothing to write.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<Option<String>> for AttributeValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Absent, Self::Scalar)
    }
}

impl From<Option<Vec<String>>> for AttributeValue {
    fn from(value: Option<Vec<String>>) -> Self {
        value.map_or(Self::Absent, Self::List)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Writes `value` to the user attribute `attribute_name`.
///
/// - [`AttributeValue::Absent`] removes the attribute
/// - [`AttributeValue::List`] sets it multi-valued
/// - [`AttributeValue::Scalar`] sets it single-valued
pub fn apply_attribute(user: &mut User, attribute_name: &str, value: AttributeValue) {
    match value {
        AttributeValue::Absent => {
            user.remove_attribute(attribute_name);
        }
        AttributeValue::List(values) => user.set_attribute(attribute_name, values),
        AttributeValue::Scalar(value) => user.set_single_attribute(attribute_name, value),
    }
}
