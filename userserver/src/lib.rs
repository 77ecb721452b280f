//! # userserver - Transports du service UserSOAP
//!
//! Expose le [`Dispatcher`](usersoap::Dispatcher) sur deux transports
//! indépendants qui produisent des réponses identiques octet pour octet :
//!
//! - [`http`] : route POST unique servie par Axum
//! - [`udp`] : un datagramme par enveloppe, une tâche par datagramme
//!
//! ainsi que le [`Server`] HTTP et l'initialisation du logging ([`logs`]).
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use userserver::{ServerBuilder, UdpServer, http::soap_router};
//! use usersoap::{Dispatcher, OperationRegistry};
//! use userstore::UserStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(UserStore::open_in_memory()?);
//!     let dispatcher = Arc::new(Dispatcher::new(
//!         Arc::new(OperationRegistry::with_user_operations()),
//!         store,
//!     ));
//!
//!     let mut udp = UdpServer::new("127.0.0.1", 8181, dispatcher.clone());
//!     udp.start().await?;
//!
//!     let mut server = ServerBuilder::new("UserSOAP", "0.0.0.0", 8180).build();
//!     server.add_router("/", soap_router("/soap/user", dispatcher)).await;
//!     server.start().await?;
//!     server.wait().await;
//!
//!     udp.stop().await;
//!     Ok(())
//! }
//! ```

pub mod http;
pub mod logs;
pub mod server;
pub mod udp;

pub use logs::{LogHandle, LoggingOptions, init_logging};
pub use server::{Server, ServerBuilder};
pub use udp::UdpServer;
