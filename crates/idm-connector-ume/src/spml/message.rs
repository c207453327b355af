//! SPML request and response model

use crate::filter::FilterTerm;
use crate::schema::{ATTR_OLDPASSWORD, ATTR_PASSWORD, SCHEMA_ID, SCHEMA_PROVIDER};

use idm_connector::names;

/// Mask written over password values in logged requests.
pub const HIDDEN_PASSWORD: &str = "********";

/// Result URI of a successful response.
pub const RESULT_SUCCESS: &str = "urn:oasis:names:tc:SPML:1:0#success";

/// Result URI of a failed response.
pub const RESULT_FAILURE: &str = "urn:oasis:names:tc:SPML:1:0#failure";

fn is_password_attribute(name: &str) -> bool {
    matches!(name, ATTR_PASSWORD | ATTR_OLDPASSWORD | names::PASSWORD)
}

/// A named attribute with its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpmlAttribute {
    pub name: String,
    pub values: Vec<String>,
}

impl SpmlAttribute {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, vec![value.into()])
    }

    /// First value, if any.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// Operation of a modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationOp {
    Replace,
    Add,
    Delete,
}

impl ModificationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationOp::Replace => "replace",
            ModificationOp::Add => "add",
            ModificationOp::Delete => "delete",
        }
    }
}

/// One change inside a modify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub name: String,
    pub operation: ModificationOp,
    pub values: Vec<String>,
}

impl Modification {
    pub fn replace(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation: ModificationOp::Replace,
            values: vec![value.into()],
        }
    }

    pub fn add(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation: ModificationOp::Add,
            values: vec![value.into()],
        }
    }

    pub fn delete(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation: ModificationOp::Delete,
            values: vec![value.into()],
        }
    }
}

/// Create an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    pub object_class: String,
    pub attributes: Vec<SpmlAttribute>,
}

impl AddRequest {
    pub fn new(object_class: impl Into<String>) -> Self {
        Self {
            object_class: object_class.into(),
            attributes: Vec::new(),
        }
    }

    /// Set an attribute, replacing any earlier value under the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.values = values,
            None => self.attributes.push(SpmlAttribute::new(name, values)),
        }
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set_attribute(name, vec![value.into()]);
    }

    pub fn attribute(&self, name: &str) -> Option<&SpmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Change an existing object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRequest {
    pub identifier: String,
    pub modifications: Vec<Modification>,
}

impl ModifyRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            modifications: Vec::new(),
        }
    }

    pub fn push(&mut self, modification: Modification) {
        self.modifications.push(modification);
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }
}

/// Delete an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub identifier: String,
}

impl DeleteRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

/// Search below a base type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub search_base: String,
    pub filter: Option<FilterTerm>,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(search_base: impl Into<String>) -> Self {
        Self {
            search_base: search_base.into(),
            filter: None,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterTerm) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_attributes<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Describe a provider schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRequest {
    pub provider_identifier: String,
    pub schema_identifier: String,
}

impl Default for SchemaRequest {
    fn default() -> Self {
        Self {
            provider_identifier: SCHEMA_PROVIDER.to_string(),
            schema_identifier: SCHEMA_ID.to_string(),
        }
    }
}

/// Any SPML request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpmlRequest {
    Add(AddRequest),
    Modify(ModifyRequest),
    Delete(DeleteRequest),
    Search(SearchRequest),
    Schema(SchemaRequest),
}

impl SpmlRequest {
    /// Element name of the request.
    pub fn kind(&self) -> &'static str {
        match self {
            SpmlRequest::Add(_) => "addRequest",
            SpmlRequest::Modify(_) => "modifyRequest",
            SpmlRequest::Delete(_) => "deleteRequest",
            SpmlRequest::Search(_) => "searchRequest",
            SpmlRequest::Schema(_) => "schemaRequest",
        }
    }

    /// Identifier of the target object, if the request has one.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            SpmlRequest::Modify(r) => Some(&r.identifier),
            SpmlRequest::Delete(r) => Some(&r.identifier),
            _ => None,
        }
    }

    /// Copy with password values replaced by [`HIDDEN_PASSWORD`].
    #[must_use]
    pub fn redacted(&self) -> Self {
        match self {
            SpmlRequest::Add(add) => {
                let mut add = add.clone();
                for attr in &mut add.attributes {
                    if is_password_attribute(&attr.name) {
                        attr.values = vec![HIDDEN_PASSWORD.to_string()];
                    }
                }
                SpmlRequest::Add(add)
            }
            SpmlRequest::Modify(modify) => {
                let mut modify = modify.clone();
                for m in &mut modify.modifications {
                    if is_password_attribute(&m.name) {
                        m.values = vec![HIDDEN_PASSWORD.to_string()];
                    }
                }
                SpmlRequest::Modify(modify)
            }
            other => other.clone(),
        }
    }
}

impl From<AddRequest> for SpmlRequest {
    fn from(r: AddRequest) -> Self {
        SpmlRequest::Add(r)
    }
}

impl From<ModifyRequest> for SpmlRequest {
    fn from(r: ModifyRequest) -> Self {
        SpmlRequest::Modify(r)
    }
}

impl From<DeleteRequest> for SpmlRequest {
    fn from(r: DeleteRequest) -> Self {
        SpmlRequest::Delete(r)
    }
}

impl From<SearchRequest> for SpmlRequest {
    fn from(r: SearchRequest) -> Self {
        SpmlRequest::Search(r)
    }
}

impl From<SchemaRequest> for SpmlRequest {
    fn from(r: SchemaRequest) -> Self {
        SpmlRequest::Schema(r)
    }
}

/// One row of a search response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResultEntry {
    pub identifier: Option<String>,
    pub attributes: Vec<SpmlAttribute>,
}

impl SearchResultEntry {
    pub fn attribute(&self, name: &str) -> Option<&SpmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// All values of an attribute, empty when absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.attribute(name)
            .map(|a| a.values.as_slice())
            .unwrap_or_default()
    }

    /// First value of an attribute.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(SpmlAttribute::value)
    }
}

/// A parsed SPML response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpmlResponse {
    /// Element name (e.g. `addResponse`), or `Fault` for SOAP faults.
    pub kind: String,
    pub result: Option<String>,
    pub error_message: Option<String>,
    pub identifier: Option<String>,
    pub entries: Vec<SearchResultEntry>,
    /// Response body as received.
    pub xml: String,
}

impl SpmlResponse {
    pub fn is_fault(&self) -> bool {
        self.kind == "Fault"
    }

    pub fn is_success(&self) -> bool {
        !self.is_fault() && self.result.as_deref() == Some(RESULT_SUCCESS)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Message explaining a failure.
    pub fn failure_message(&self) -> String {
        match (&self.error_message, &self.result) {
            (Some(message), _) if !message.is_empty() => message.clone(),
            (_, Some(result)) => format!("{} result {result}", self.kind),
            (_, None) => format!("{} without result", self.kind),
        }
    }
}
