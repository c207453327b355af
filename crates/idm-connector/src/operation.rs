//! Connector Framework operation types
//!
//! Types for CRUD operations: UIDs, attribute sets, connector objects, filters,
//! and search options.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::names;

/// Unique identifier for an object in a target system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid {
    /// The attribute name used as the identifier (e.g., "__UID__", "id").
    attribute_name: String,
    /// The actual value of the identifier.
    value: String,
}

impl Uid {
    /// Create a new UID with the given attribute name and value.
    pub fn new(attribute_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            value: value.into(),
        }
    }

    /// Create a UID using the host's `__UID__` attribute name.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self::new(names::UID, value)
    }

    /// Get the attribute name.
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// Get the value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.attribute_name, self.value)
    }
}

/// A set of attributes for create/update operations or search results.
///
/// Attributes are kept ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    /// Map of attribute name to attribute value(s).
    #[serde(flatten)]
    attributes: BTreeMap<String, AttributeValue>,
}

impl AttributeSet {
    /// Create a new empty attribute set.
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Set an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Get a single-valued string attribute.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_string())
    }

    /// Get a multi-valued string attribute.
    pub fn get_strings(&self, name: &str) -> Option<Vec<&str>> {
        self.get(name).map(|v| v.as_strings())
    }

    /// Check if an attribute exists.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Remove an attribute.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    /// Keep only the attributes whose names satisfy the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.attributes.retain(|name, _| keep(name));
    }

    /// Get all attribute names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(|s| s.as_str())
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate over all attributes.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.attributes.iter()
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for AttributeSet {
    type Item = (String, AttributeValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.into_iter()
    }
}

/// A value for an attribute, which may be single or multi-valued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// No value (null).
    Null,
    /// A single boolean value.
    Boolean(bool),
    /// A single integer value (also used for epoch milliseconds).
    Integer(i64),
    /// A single string value.
    String(String),
    /// A single instant.
    DateTime(DateTime<Utc>),
    /// Multiple values, in caller order.
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Get as a string if this is a single string value.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as strings (works for both single and multi-valued).
    pub fn as_strings(&self) -> Vec<&str> {
        match self {
            AttributeValue::String(s) => vec![s.as_str()],
            AttributeValue::Array(arr) => arr.iter().filter_map(|v| v.as_string()).collect(),
            _ => vec![],
        }
    }

    /// Get as an integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as an instant if this is a date-time value.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// First scalar value: the value itself, or the first element of an array.
    pub fn first(&self) -> Option<&AttributeValue> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Array(arr) => arr.first().and_then(|v| v.first()),
            scalar => Some(scalar),
        }
    }

    /// All non-null scalar values, flattening arrays.
    pub fn values(&self) -> Vec<&AttributeValue> {
        match self {
            AttributeValue::Null => vec![],
            AttributeValue::Array(arr) => arr.iter().flat_map(|v| v.values()).collect(),
            scalar => vec![scalar],
        }
    }

    /// Textual form of a scalar value. Null renders as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            AttributeValue::Null => String::new(),
            AttributeValue::Boolean(b) => b.to_string(),
            AttributeValue::Integer(i) => i.to_string(),
            AttributeValue::String(s) => s.clone(),
            AttributeValue::DateTime(dt) => dt.to_rfc3339(),
            AttributeValue::Array(arr) => arr.first().map(|v| v.to_text()).unwrap_or_default(),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Integer(i64::from(i))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(dt: DateTime<Utc>) -> Self {
        AttributeValue::DateTime(dt)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(vec: Vec<T>) -> Self {
        AttributeValue::Array(vec.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttributeValue::Null, Into::into)
    }
}

/// An object read from the target system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorObject {
    /// Host object class name (e.g., `__ACCOUNT__`).
    pub object_class: String,
    /// Unique identifier.
    pub uid: Uid,
    /// Display or logon name.
    pub name: String,
    /// Remaining attributes.
    pub attributes: AttributeSet,
}

impl ConnectorObject {
    /// Create a new connector object.
    pub fn new(
        object_class: impl Into<String>,
        uid: Uid,
        name: impl Into<String>,
        attributes: AttributeSet,
    ) -> Self {
        Self {
            object_class: object_class.into(),
            uid,
            name: name.into(),
            attributes,
        }
    }
}

/// Filter for search operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Match objects where attribute equals value.
    Equals { attribute: String, value: String },

    /// Match objects where attribute contains value (substring).
    Contains { attribute: String, value: String },

    /// Match objects where attribute starts with value.
    StartsWith { attribute: String, value: String },

    /// Match objects where attribute ends with value.
    EndsWith { attribute: String, value: String },

    /// Match objects where a multi-valued attribute holds all the values.
    ContainsAll {
        attribute: String,
        values: Vec<String>,
    },

    /// Logical AND of multiple filters.
    And { filters: Vec<Filter> },

    /// Logical OR of multiple filters.
    Or { filters: Vec<Filter> },
}

impl Filter {
    /// Create an equals filter.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a contains filter.
    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Contains {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a starts-with filter.
    pub fn starts_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::StartsWith {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create an ends-with filter.
    pub fn ends_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::EndsWith {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a contains-all-values filter.
    pub fn contains_all<S: Into<String>>(
        attribute: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Filter::ContainsAll {
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an AND filter.
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    /// Create an OR filter.
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or { filters }
    }

    /// Combine this filter with another using AND.
    pub fn and_with(self, other: Filter) -> Self {
        match self {
            Filter::And { mut filters } => {
                filters.push(other);
                Filter::And { filters }
            }
            _ => Filter::And {
                filters: vec![self, other],
            },
        }
    }

    /// Combine this filter with another using OR.
    pub fn or_with(self, other: Filter) -> Self {
        match self {
            Filter::Or { mut filters } => {
                filters.push(other);
                Filter::Or { filters }
            }
            _ => Filter::Or {
                filters: vec![self, other],
            },
        }
    }
}

/// Options for search operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Attributes to return. `None` returns everything the connector reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,
}

impl SearchOptions {
    /// Create default search options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned attributes.
    #[must_use]
    pub fn with_attributes_to_get<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.attributes_to_get = Some(names.into_iter().map(Into::into).collect());
        self
    }
}
