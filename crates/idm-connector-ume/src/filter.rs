//! Filter translation
//!
//! Converts host filter trees into SPML filter terms. Chained AND/OR of the
//! same operator collapse into one n-ary term.

use idm_connector::error::{ConnectorError, ConnectorResult};
use idm_connector::operation::Filter;

use crate::object_class::UmeObjectClass;

/// An SPML (DSML) filter term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterTerm {
    /// Equality match against one or more values.
    Equal { name: String, values: Vec<String> },
    /// Substring match.
    Substrings {
        name: String,
        initial: Option<String>,
        any: Vec<String>,
        ending: Option<String>,
    },
    /// All operands match.
    And(Vec<FilterTerm>),
    /// Any operand matches.
    Or(Vec<FilterTerm>),
}

impl FilterTerm {
    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        FilterTerm::Equal {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    pub fn initial(name: impl Into<String>, value: impl Into<String>) -> Self {
        FilterTerm::Substrings {
            name: name.into(),
            initial: Some(value.into()),
            any: Vec::new(),
            ending: None,
        }
    }

    pub fn any(name: impl Into<String>, value: impl Into<String>) -> Self {
        FilterTerm::Substrings {
            name: name.into(),
            initial: None,
            any: vec![value.into()],
            ending: None,
        }
    }

    pub fn ending(name: impl Into<String>, value: impl Into<String>) -> Self {
        FilterTerm::Substrings {
            name: name.into(),
            initial: None,
            any: Vec::new(),
            ending: Some(value.into()),
        }
    }

    /// Attribute name of a primitive term.
    pub fn name(&self) -> Option<&str> {
        match self {
            FilterTerm::Equal { name, .. } | FilterTerm::Substrings { name, .. } => Some(name),
            FilterTerm::And(_) | FilterTerm::Or(_) => None,
        }
    }

    /// Operands of a composite term.
    pub fn operands(&self) -> &[FilterTerm] {
        match self {
            FilterTerm::And(operands) | FilterTerm::Or(operands) => operands,
            _ => &[],
        }
    }

    /// Rename an attribute everywhere in the tree.
    #[must_use]
    pub fn rename(self, from: &str, to: &str) -> Self {
        match self {
            FilterTerm::Equal { name, values } => FilterTerm::Equal {
                name: swap(name, from, to),
                values,
            },
            FilterTerm::Substrings {
                name,
                initial,
                any,
                ending,
            } => FilterTerm::Substrings {
                name: swap(name, from, to),
                initial,
                any,
                ending,
            },
            FilterTerm::And(operands) => {
                FilterTerm::And(operands.into_iter().map(|t| t.rename(from, to)).collect())
            }
            FilterTerm::Or(operands) => {
                FilterTerm::Or(operands.into_iter().map(|t| t.rename(from, to)).collect())
            }
        }
    }
}

fn swap(name: String, from: &str, to: &str) -> String {
    if name == from {
        to.to_string()
    } else {
        name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

/// Combine two terms, appending to the left term when it already uses `op`.
fn combine(op: Operator, left: FilterTerm, right: FilterTerm) -> FilterTerm {
    match (op, left) {
        (Operator::And, FilterTerm::And(mut operands)) => {
            operands.push(right);
            FilterTerm::And(operands)
        }
        (Operator::Or, FilterTerm::Or(mut operands)) => {
            operands.push(right);
            FilterTerm::Or(operands)
        }
        (Operator::And, left) => FilterTerm::And(vec![left, right]),
        (Operator::Or, left) => FilterTerm::Or(vec![left, right]),
    }
}

fn fold(
    object_class: UmeObjectClass,
    op: Operator,
    filters: &[Filter],
) -> ConnectorResult<FilterTerm> {
    let mut iter = filters.iter();
    let first = iter.next().ok_or_else(|| {
        ConnectorError::invalid_attribute_value("composite filter without operands")
    })?;

    let mut term = translate(object_class, first)?;
    for filter in iter {
        term = combine(op, term, translate(object_class, filter)?);
    }
    Ok(term)
}

/// Translate a host filter for the given object class.
///
/// Attribute names go through [`UmeObjectClass::remote_name`].
pub fn translate(object_class: UmeObjectClass, filter: &Filter) -> ConnectorResult<FilterTerm> {
    let remote = |attribute: &str| object_class.remote_name(attribute).to_string();

    let term = match filter {
        Filter::Equals { attribute, value } => FilterTerm::equal(remote(attribute), value),
        Filter::Contains { attribute, value } => FilterTerm::any(remote(attribute), value),
        Filter::StartsWith { attribute, value } => FilterTerm::initial(remote(attribute), value),
        Filter::EndsWith { attribute, value } => FilterTerm::ending(remote(attribute), value),
        Filter::ContainsAll { attribute, values } => FilterTerm::Equal {
            name: remote(attribute),
            values: values.clone(),
        },
        Filter::And { filters } => fold(object_class, Operator::And, filters)?,
        Filter::Or { filters } => fold(object_class, Operator::Or, filters)?,
    };
    Ok(term)
}

/// Filter matching every object: one prefix search per pattern character.
pub fn full_scan(name_attribute: &str, pattern: &str) -> FilterTerm {
    FilterTerm::Or(
        pattern
            .chars()
            .map(|c| FilterTerm::initial(name_attribute, c.to_string()))
            .collect(),
    )
}
