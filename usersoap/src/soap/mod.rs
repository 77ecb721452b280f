//! # Module SOAP - codec d'enveloppe
//!
//! Format minimal : `Envelope` → `Body` → un unique élément (requête,
//! réponse ou `Fault`). Aucun `Header` n'est interprété.
//!
//! - [`sniff_operation`] : première passe, nom local de l'enfant du `Body`
//! - [`decode_typed`] : seconde passe stricte vers un type serde
//! - [`encode_envelope`] : sérialisation indentée avec déclaration XML
//!
//! ```rust
//! use usersoap::soap::{Fault, FaultCode, encode_envelope, sniff_operation};
//!
//! let xml = encode_envelope(&Fault::new(FaultCode::Client, "SOAP Body is empty")).unwrap();
//! assert_eq!(sniff_operation(xml.as_bytes()).unwrap(), "Fault");
//! ```

mod builder;
mod envelope;
mod fault;
mod parser;

pub use builder::{FALLBACK_FAULT, XML_HEADER, encode_envelope};
pub use envelope::{RequestEnvelope, TypedBody, Xmlns};
pub use fault::{Fault, FaultCode};
pub use parser::{decode_typed, sniff_operation};

/// Namespace de l'enveloppe
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace des messages du service
pub const USER_SERVICE_NS: &str = "urn:user-service";
