//! Connector Framework schema types
//!
//! Types for describing the object classes and attributes a connector manages.

use serde::{Deserialize, Serialize};

/// Schema representing the structure of a target system.
///
/// A schema contains one or more object classes, each with their own
/// attributes and capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The object classes available in this schema.
    pub object_classes: Vec<ObjectClass>,
}

impl Schema {
    /// Create a new empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema with the given object classes.
    #[must_use]
    pub fn with_object_classes(object_classes: Vec<ObjectClass>) -> Self {
        Self { object_classes }
    }

    /// Get an object class by name.
    pub fn get_object_class(&self, name: &str) -> Option<&ObjectClass> {
        self.object_classes.iter().find(|oc| oc.name == name)
    }

    /// Check if an object class exists.
    pub fn has_object_class(&self, name: &str) -> bool {
        self.get_object_class(name).is_some()
    }

    /// Get all object class names.
    pub fn object_class_names(&self) -> Vec<&str> {
        self.object_classes.iter().map(|oc| oc.name.as_str()).collect()
    }
}

/// An object class definition.
///
/// Object classes define the types of objects that can be managed
/// (e.g., accounts, groups, roles).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectClass {
    /// Host name for this object class (e.g., `__ACCOUNT__`).
    pub name: String,

    /// Native name in the target system (e.g., "sapuser").
    pub native_name: String,

    /// Attributes belonging to this object class.
    pub attributes: Vec<SchemaAttribute>,

    /// Whether this object class supports create operations.
    #[serde(default = "default_true")]
    pub supports_create: bool,

    /// Whether this object class supports update operations.
    #[serde(default = "default_true")]
    pub supports_update: bool,

    /// Whether this object class supports delete operations.
    #[serde(default = "default_true")]
    pub supports_delete: bool,
}

fn default_true() -> bool {
    true
}

impl ObjectClass {
    /// Create a new object class with the given name.
    pub fn new(name: impl Into<String>, native_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_name: native_name.into(),
            attributes: Vec::new(),
            supports_create: true,
            supports_update: true,
            supports_delete: true,
        }
    }

    /// Add an attribute to this object class.
    pub fn add_attribute(&mut self, attribute: SchemaAttribute) {
        self.attributes.push(attribute);
    }

    /// Add an attribute using builder pattern.
    #[must_use]
    pub fn with_attribute(mut self, attribute: SchemaAttribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    /// Add several attributes using builder pattern.
    #[must_use]
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = SchemaAttribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Disable create and delete for this object class.
    #[must_use]
    pub fn without_create_delete(mut self) -> Self {
        self.supports_create = false;
        self.supports_delete = false;
        self
    }

    /// Get an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&SchemaAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check if an attribute exists.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Get all attribute names, in declaration order.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    /// Get required attributes.
    pub fn required_attributes(&self) -> Vec<&SchemaAttribute> {
        self.attributes.iter().filter(|a| a.required).collect()
    }

    /// Get multi-valued attributes.
    pub fn multi_valued_attributes(&self) -> Vec<&SchemaAttribute> {
        self.attributes.iter().filter(|a| a.multi_valued).collect()
    }
}

/// An attribute in an object class schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaAttribute {
    /// Host name for this attribute.
    pub name: String,

    /// Native name in the target system.
    pub native_name: String,

    /// Data type of this attribute.
    pub data_type: AttributeDataType,

    /// Whether this attribute can have multiple values.
    #[serde(default)]
    pub multi_valued: bool,

    /// Whether this attribute is required for create operations.
    #[serde(default)]
    pub required: bool,

    /// Whether this attribute can be read.
    #[serde(default = "default_true")]
    pub readable: bool,

    /// Whether this attribute can be set on create.
    #[serde(default = "default_true")]
    pub creatable: bool,

    /// Whether this attribute can be changed on update.
    #[serde(default = "default_true")]
    pub updatable: bool,
}

impl SchemaAttribute {
    /// Create a new attribute with the given name and type.
    pub fn new(
        name: impl Into<String>,
        native_name: impl Into<String>,
        data_type: AttributeDataType,
    ) -> Self {
        Self {
            name: name.into(),
            native_name: native_name.into(),
            data_type,
            multi_valued: false,
            required: false,
            readable: true,
            creatable: true,
            updatable: true,
        }
    }

    /// Create a string attribute whose host and native names are equal.
    pub fn string(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, AttributeDataType::String)
    }

    /// Mark this attribute as multi-valued.
    #[must_use]
    pub fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    /// Mark this attribute as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark this attribute as read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.creatable = false;
        self.updatable = false;
        self
    }

    /// Mark this attribute as write-only (e.g., passwords).
    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Mark this attribute as not settable on create.
    #[must_use]
    pub fn not_creatable(mut self) -> Self {
        self.creatable = false;
        self
    }

    /// Mark this attribute as immutable after create.
    #[must_use]
    pub fn not_updatable(mut self) -> Self {
        self.updatable = false;
        self
    }

    /// Check if the attribute can only be read.
    pub fn is_read_only(&self) -> bool {
        !self.creatable && !self.updatable
    }
}

/// Data type for schema attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeDataType {
    /// String/text value.
    String,
    /// Integer value.
    Integer,
    /// Boolean value.
    Boolean,
    /// Date/time value.
    DateTime,
    /// Secret value (passwords), never returned.
    Secret,
}

impl AttributeDataType {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeDataType::String => "string",
            AttributeDataType::Integer => "integer",
            AttributeDataType::Boolean => "boolean",
            AttributeDataType::DateTime => "datetime",
            AttributeDataType::Secret => "secret",
        }
    }
}

impl std::fmt::Display for AttributeDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
