//! SPML response parsing
//!
//! Elements are matched by local name, so the SOAP envelope and any
//! namespace prefixes are accepted as they come.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

use super::message::{SearchResultEntry, SpmlAttribute, SpmlResponse};

/// Error raised for a body that is not an SPML response.
#[derive(Debug, Error)]
pub enum SpmlParseError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("no SPML response element found")]
    MissingResponse,
}

fn attribute_value(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|attr| {
        if attr.key.local_name().into_inner() == name.as_bytes() {
            attr.unescape_value().ok().map(|v| v.to_string())
        } else {
            None
        }
    })
}

#[derive(Default)]
struct ResponseBuilder {
    response: Option<SpmlResponse>,
    entry: Option<SearchResultEntry>,
    attr: Option<SpmlAttribute>,
    text: String,
}

impl ResponseBuilder {
    fn start(&mut self, local: &str, e: &BytesStart<'_>) {
        self.text.clear();

        match local {
            "Fault" if self.response.is_none() => {
                self.response = Some(SpmlResponse {
                    kind: local.to_string(),
                    ..Default::default()
                });
            }
            _ if local.ends_with("Response") && self.response.is_none() => {
                self.response = Some(SpmlResponse {
                    kind: local.to_string(),
                    result: attribute_value(e, "result"),
                    error_message: attribute_value(e, "errorMessage"),
                    ..Default::default()
                });
            }
            "searchResultEntry" => self.entry = Some(SearchResultEntry::default()),
            "attr" if self.entry.is_some() => {
                let name = attribute_value(e, "name").unwrap_or_default();
                self.attr = Some(SpmlAttribute::new(name, Vec::new()));
            }
            _ => {}
        }
    }

    fn end(&mut self, local: &str) {
        let text = std::mem::take(&mut self.text);

        match local {
            "value" => {
                if let Some(attr) = self.attr.as_mut() {
                    attr.values.push(text);
                }
            }
            "attr" => {
                if let (Some(attr), Some(entry)) = (self.attr.take(), self.entry.as_mut()) {
                    entry.attributes.push(attr);
                }
            }
            "id" => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.identifier = Some(text);
                } else if let Some(response) = self.response.as_mut() {
                    response.identifier = Some(text);
                }
            }
            "errorMessage" | "faultstring" => {
                if let Some(response) = self.response.as_mut() {
                    response.error_message = Some(text);
                }
            }
            "searchResultEntry" => {
                if let (Some(entry), Some(response)) = (self.entry.take(), self.response.as_mut())
                {
                    response.entries.push(entry);
                }
            }
            _ => {}
        }
    }
}

/// Parse a response body (with or without SOAP envelope).
pub fn parse_response(xml: &str) -> Result<SpmlResponse, SpmlParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = ResponseBuilder::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                builder.start(&local, e);
            }
            Ok(Event::Empty(ref e)) => {
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                builder.start(&local, e);
                builder.end(&local);
            }
            Ok(Event::Text(ref e)) => {
                builder.text.push_str(&e.unescape()?);
            }
            Ok(Event::CData(e)) => {
                builder.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(ref e)) => {
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                builder.end(&local);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    let mut response = builder.response.ok_or(SpmlParseError::MissingResponse)?;
    response.xml = xml.to_string();
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spml::soap::wrap_envelope;

    #[test]
    fn test_parse_add_response() {
        let body = wrap_envelope(
            "<spml:addResponse xmlns:spml='urn:oasis:names:tc:SPML:1:0' result='urn:oasis:names:tc:SPML:1:0#success'>\
               <spml:identifier type='urn:oasis:names:tc:SPML:1:0#GUID'><spml:id>USER.PRIVATE_DATASOURCE.un:Test.User</spml:id></spml:identifier>\
             </spml:addResponse>",
        );

        let response = parse_response(&body).unwrap();
        assert_eq!(response.kind, "addResponse");
        assert!(response.is_success());
        assert_eq!(
            response.identifier.as_deref(),
            Some("USER.PRIVATE_DATASOURCE.un:Test.User")
        );
    }

    #[test]
    fn test_parse_search_response() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Body>
    <spml:searchResponse xmlns:spml="urn:oasis:names:tc:SPML:1:0" xmlns:dsml="urn:oasis:names:tc:DSML:2:0:core" result="urn:oasis:names:tc:SPML:1:0#success">
      <spml:searchResultEntry>
        <spml:identifier type="urn:oasis:names:tc:SPML:1:0#GUID"><spml:id>USER.1</spml:id></spml:identifier>
        <spml:attributes>
          <dsml:attr name="logonname"><dsml:value>Test.User</dsml:value></dsml:attr>
          <dsml:attr name="assignedroles"><dsml:value>R1</dsml:value><dsml:value>R2</dsml:value></dsml:attr>
          <dsml:attr name="description"><dsml:value>Tom &amp; Jerry</dsml:value></dsml:attr>
          <dsml:attr name="title"><dsml:value/></dsml:attr>
        </spml:attributes>
      </spml:searchResultEntry>
      <spml:searchResultEntry>
        <spml:identifier><spml:id>USER.2</spml:id></spml:identifier>
      </spml:searchResultEntry>
    </spml:searchResponse>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

        let response = parse_response(body).unwrap();
        assert!(response.is_success());
        assert!(response.identifier.is_none());
        assert_eq!(response.entries.len(), 2);

        let first = &response.entries[0];
        assert_eq!(first.identifier.as_deref(), Some("USER.1"));
        assert_eq!(first.value("logonname"), Some("Test.User"));
        assert_eq!(first.values("assignedroles"), ["R1", "R2"]);
        assert_eq!(first.value("description"), Some("Tom & Jerry"));
        assert_eq!(first.value("title"), Some(""));
        assert!(response.entries[1].attributes.is_empty());
    }

    #[test]
    fn test_parse_failure_response() {
        let body = "<spml:modifyResponse xmlns:spml='urn:oasis:names:tc:SPML:1:0' result='urn:oasis:names:tc:SPML:1:0#failure'>\
                    <spml:errorMessage>Principal USER.x doesn't exist</spml:errorMessage>\
                    </spml:modifyResponse>";

        let response = parse_response(body).unwrap();
        assert!(response.is_failure());
        assert_eq!(response.failure_message(), "Principal USER.x doesn't exist");
    }

    #[test]
    fn test_parse_soap_fault() {
        let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Server</faultcode>
      <faultstring>Modification is not allowed</faultstring>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#;

        let response = parse_response(body).unwrap();
        assert!(response.is_fault());
        assert!(response.is_failure());
        assert_eq!(response.failure_message(), "Modification is not allowed");
    }

    #[test]
    fn test_parse_without_response_element() {
        let err = parse_response("<html><body>Gateway</body></html>").unwrap_err();
        assert!(matches!(err, SpmlParseError::MissingResponse));
    }

    #[test]
    fn test_parse_unknown_entity() {
        let body = "<spml:modifyResponse xmlns:spml='urn:oasis:names:tc:SPML:1:0' result='urn:oasis:names:tc:SPML:1:0#failure'>\
                    <spml:errorMessage>Bad &bogus; entity</spml:errorMessage>\
                    </spml:modifyResponse>";
        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, SpmlParseError::Xml(_)));
    }

    #[test]
    fn test_parse_malformed_xml() {
        let err = parse_response("<spml:addResponse result='x'></spml:deleteResponse>").unwrap_err();
        assert!(matches!(err, SpmlParseError::Xml(_)));
    }
}
