//! SPML 1.0 request serialization

use crate::filter::FilterTerm;

use super::message::{
    AddRequest, DeleteRequest, ModifyRequest, SchemaRequest, SearchRequest, SpmlRequest,
};

pub const SPML_NAMESPACE: &str = "urn:oasis:names:tc:SPML:1:0";
pub const DSML_NAMESPACE: &str = "urn:oasis:names:tc:DSML:2:0:core";
pub const GUID_TYPE: &str = "urn:oasis:names:tc:SPML:1:0#GUID";
const URN_TYPE: &str = "urn:oasis:names:tc:SPML:1:0#URN";
const GENERIC_STRING_TYPE: &str = "urn:oasis:names:tc:SPML:1:0#GenericString";

impl SpmlRequest {
    /// Serialize the request as an SPML element.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<spml:");
        xml.push_str(self.kind());
        xml.push_str(" xmlns:spml='");
        xml.push_str(SPML_NAMESPACE);
        xml.push_str("' xmlns:dsml='");
        xml.push_str(DSML_NAMESPACE);
        xml.push_str("'>\n");

        match self {
            SpmlRequest::Add(r) => write_add(&mut xml, r),
            SpmlRequest::Modify(r) => write_modify(&mut xml, r),
            SpmlRequest::Delete(r) => write_delete(&mut xml, r),
            SpmlRequest::Search(r) => write_search(&mut xml, r),
            SpmlRequest::Schema(r) => write_schema(&mut xml, r),
        }

        xml.push_str("</spml:");
        xml.push_str(self.kind());
        xml.push_str(">\n");
        xml
    }
}

fn write_identifier(xml: &mut String, element: &str, id: &str) {
    xml.push_str("  <spml:");
    xml.push_str(element);
    xml.push_str(" type='");
    xml.push_str(GUID_TYPE);
    xml.push_str("'>\n    <spml:id>");
    xml.push_str(&xml_escape(id));
    xml.push_str("</spml:id>\n  </spml:");
    xml.push_str(element);
    xml.push_str(">\n");
}

fn write_values(xml: &mut String, values: &[String]) {
    for value in values {
        xml.push_str("<dsml:value>");
        xml.push_str(&xml_escape(value));
        xml.push_str("</dsml:value>");
    }
}

fn write_attr(xml: &mut String, name: &str, values: &[String]) {
    xml.push_str("    <dsml:attr name='");
    xml.push_str(&xml_escape(name));
    xml.push_str("'>");
    write_values(xml, values);
    xml.push_str("</dsml:attr>\n");
}

fn write_add(xml: &mut String, request: &AddRequest) {
    xml.push_str("  <spml:attributes>\n");
    write_attr(xml, "objectclass", std::slice::from_ref(&request.object_class));
    for attr in &request.attributes {
        write_attr(xml, &attr.name, &attr.values);
    }
    xml.push_str("  </spml:attributes>\n");
}

fn write_modify(xml: &mut String, request: &ModifyRequest) {
    write_identifier(xml, "identifier", &request.identifier);
    xml.push_str("  <spml:modifications>\n");
    for m in &request.modifications {
        xml.push_str("    <dsml:modification name='");
        xml.push_str(&xml_escape(&m.name));
        xml.push_str("' operation='");
        xml.push_str(m.operation.as_str());
        xml.push_str("'>");
        write_values(xml, &m.values);
        xml.push_str("</dsml:modification>\n");
    }
    xml.push_str("  </spml:modifications>\n");
}

fn write_delete(xml: &mut String, request: &DeleteRequest) {
    write_identifier(xml, "identifier", &request.identifier);
}

fn write_search(xml: &mut String, request: &SearchRequest) {
    write_identifier(xml, "searchBase", &request.search_base);
    if let Some(filter) = &request.filter {
        xml.push_str("  <dsml:filter>");
        write_filter_term(xml, filter);
        xml.push_str("</dsml:filter>\n");
    }
    if !request.attributes.is_empty() {
        xml.push_str("  <spml:attributes>\n");
        for name in &request.attributes {
            xml.push_str("    <dsml:attribute name='");
            xml.push_str(&xml_escape(name));
            xml.push_str("'/>\n");
        }
        xml.push_str("  </spml:attributes>\n");
    }
}

fn write_schema(xml: &mut String, request: &SchemaRequest) {
    xml.push_str("  <spml:providerIdentifier providerIDType='");
    xml.push_str(URN_TYPE);
    xml.push_str("'>\n    <spml:providerID>");
    xml.push_str(&xml_escape(&request.provider_identifier));
    xml.push_str("</spml:providerID>\n  </spml:providerIdentifier>\n");
    xml.push_str("  <spml:schemaIdentifier schemaIDType='");
    xml.push_str(GENERIC_STRING_TYPE);
    xml.push_str("'>\n    <spml:schemaID>");
    xml.push_str(&xml_escape(&request.schema_identifier));
    xml.push_str("</spml:schemaID>\n  </spml:schemaIdentifier>\n");
}

fn write_filter_term(xml: &mut String, term: &FilterTerm) {
    match term {
        FilterTerm::Equal { name, values } => {
            xml.push_str("<dsml:equalityMatch name='");
            xml.push_str(&xml_escape(name));
            xml.push_str("'>");
            write_values(xml, values);
            xml.push_str("</dsml:equalityMatch>");
        }
        FilterTerm::Substrings {
            name,
            initial,
            any,
            ending,
        } => {
            xml.push_str("<dsml:substrings name='");
            xml.push_str(&xml_escape(name));
            xml.push_str("'>");
            if let Some(initial) = initial {
                xml.push_str("<dsml:initial>");
                xml.push_str(&xml_escape(initial));
                xml.push_str("</dsml:initial>");
            }
            for value in any {
                xml.push_str("<dsml:any>");
                xml.push_str(&xml_escape(value));
                xml.push_str("</dsml:any>");
            }
            if let Some(ending) = ending {
                xml.push_str("<dsml:final>");
                xml.push_str(&xml_escape(ending));
                xml.push_str("</dsml:final>");
            }
            xml.push_str("</dsml:substrings>");
        }
        FilterTerm::And(operands) => {
            xml.push_str("<dsml:and>");
            for operand in operands {
                write_filter_term(xml, operand);
            }
            xml.push_str("</dsml:and>");
        }
        FilterTerm::Or(operands) => {
            xml.push_str("<dsml:or>");
            for operand in operands {
                write_filter_term(xml, operand);
            }
            xml.push_str("</dsml:or>");
        }
    }
}

/// Escape special XML characters.
pub(crate) fn xml_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}
