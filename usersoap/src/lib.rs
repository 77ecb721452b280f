//! # usersoap - Moteur de dispatch d'enveloppes SOAP
//!
//! Cette crate implémente le cœur du service UserSOAP : à partir des octets
//! bruts d'une enveloppe, elle identifie l'opération demandée, décode la
//! requête typée correspondante, exécute l'opération contre le
//! [`Repository`](userstore::Repository) et sérialise la réponse (ou un
//! fault) dans une nouvelle enveloppe.
//!
//! ## Architecture
//!
//! - [`soap`] : codec d'enveloppe (lecture en deux passes, construction)
//! - [`operations`] : messages typés et handlers des quatre opérations
//! - [`registry`] : table nom d'opération → handler typé
//! - [`dispatcher`] : orchestration codec → registre → handler → codec
//! - `client` : clients UDP et HTTP (feature `client`)
//!
//! ## Lecture en deux passes
//!
//! Le nom de l'opération n'est connu qu'en lisant l'élément enfant du
//! `Body`. Une première passe ([`soap::sniff_operation`]) n'extrait que ce
//! nom ; le registre fournit ensuite le type de requête, et une seconde passe
//! stricte ([`soap::decode_typed`]) relit la même enveloppe dans ce type.
//!
//! ## Exemple
//!
//! ```rust
//! use std::sync::Arc;
//! use usersoap::{Dispatcher, OperationRegistry, Outcome};
//! use userstore::UserStore;
//!
//! let store = Arc::new(UserStore::open_in_memory().unwrap());
//! let dispatcher = Dispatcher::new(Arc::new(OperationRegistry::with_user_operations()), store);
//!
//! let request = r#"<?xml version="1.0"?>
//! <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
//!   <soap:Body>
//!     <CreateUser xmlns="urn:user-service">
//!       <name>Bob Smith</name>
//!       <email>bob@example.com</email>
//!     </CreateUser>
//!   </soap:Body>
//! </soap:Envelope>"#;
//!
//! let reply = dispatcher.handle(request.as_bytes());
//! assert!(matches!(reply.outcome, Outcome::Success { .. }));
//! assert!(reply.body.contains("<Name>Bob Smith</Name>"));
//! ```

pub mod dispatcher;
pub mod errors;
pub mod operations;
pub mod registry;
pub mod soap;

#[cfg(feature = "client")]
pub mod client;

pub use dispatcher::{Dispatch, Dispatcher, FaultPolicy, Outcome};
pub use errors::{ServiceError, SoapError};
pub use registry::{OperationFailure, OperationRegistry, RegisteredOperation};
pub use soap::{Fault, FaultCode, decode_typed, encode_envelope, sniff_operation};
