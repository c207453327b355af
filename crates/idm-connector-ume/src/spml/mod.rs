//! SPML 1.0 over SOAP
//!
//! Request and response model, XML serialization, response parsing and the
//! SOAP envelope used by the UME SPML service.

pub mod message;
pub mod parser;
pub mod soap;
pub mod xml;

pub use message::{
    AddRequest, DeleteRequest, Modification, ModificationOp, ModifyRequest, SchemaRequest,
    SearchRequest, SearchResultEntry, SpmlAttribute, SpmlRequest, SpmlResponse, HIDDEN_PASSWORD,
};
pub use parser::{parse_response, SpmlParseError};
pub use soap::wrap_envelope;
