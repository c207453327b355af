//! SOAP 1.1 envelope

pub const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Value of the `Content-Type` header.
pub const CONTENT_TYPE: &str = "text/xml; charset=UTF-8";

/// Value of the `SOAPAction` header.
pub const SOAP_ACTION: &str = "POST";

/// Wrap a request element in a SOAP envelope.
pub fn wrap_envelope(request: &str) -> String {
    let mut xml = String::with_capacity(request.len() + 256);
    xml.push_str("<?xml version='1.0' encoding='UTF-8'?> \n");
    xml.push_str("<SOAP-ENV:Envelope xmlns:SOAP-ENV=\"");
    xml.push_str(SOAP_ENVELOPE_NAMESPACE);
    xml.push_str("\"> \n");
    xml.push_str("<SOAP-ENV:Header/> \n");
    xml.push_str("<SOAP-ENV:Body> \n");
    xml.push_str(request);
    xml.push_str("</SOAP-ENV:Body> \n");
    xml.push_str("</SOAP-ENV:Envelope> \n");
    xml
}
