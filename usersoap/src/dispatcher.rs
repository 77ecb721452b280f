//! # Dispatcher
//!
//! Point d'entrée commun aux transports : octets bruts en entrée, enveloppe
//! de réponse (succès ou fault) en sortie. [`Dispatcher::handle`] ne retourne
//! jamais d'erreur ; chaque échec est converti en fault.
//!
//! | Étape                | Échec                                        | Code           |
//! |----------------------|----------------------------------------------|----------------|
//! | lecture du nom       | `Invalid SOAP message` / `SOAP Body is empty`| Client         |
//! | recherche            | `Unknown operation: <nom>`                   | MustUnderstand |
//! | décodage typé        | `Invalid <nom> Request Structure`            | Client         |
//! | handler              | message du handler                           | selon la politique |
//! | encodage             | fault statique                               | Server         |

use crate::errors::SoapError;
use crate::registry::{OperationFailure, OperationRegistry};
use crate::soap::{FALLBACK_FAULT, Fault, FaultCode, encode_envelope, sniff_operation};
use std::sync::Arc;
use tracing::{debug, error, warn};
use userstore::Repository;

/// Issue logique d'un appel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { operation: String },
    ClientFault,
    ServerFault,
    MustUnderstand,
}

impl Outcome {
    pub fn is_fault(&self) -> bool {
        !matches!(self, Outcome::Success { .. })
    }
}

impl From<FaultCode> for Outcome {
    fn from(code: FaultCode) -> Self {
        match code {
            FaultCode::Client => Outcome::ClientFault,
            FaultCode::Server => Outcome::ServerFault,
            FaultCode::MustUnderstand => Outcome::MustUnderstand,
        }
    }
}

/// Enveloppe produite par le dispatcher et son issue
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub body: String,
    pub outcome: Outcome,
}

impl Dispatch {
    /// Enveloppe de fault ; retombe sur [`FALLBACK_FAULT`] si l'encodage échoue
    pub fn fault(code: FaultCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match encode_envelope(&Fault::new(code, message.as_str())) {
            Ok(body) => Self {
                body,
                outcome: code.into(),
            },
            Err(e) => {
                error!("❌ Failed to encode fault '{}': {}", message, e);
                Self::fallback()
            }
        }
    }

    fn fallback() -> Self {
        Self {
            body: FALLBACK_FAULT.to_string(),
            outcome: Outcome::ServerFault,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body.into_bytes()
    }
}

/// Code de fault des erreurs métier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultPolicy {
    /// Rapporte les erreurs de validation et d'absence en `Server`
    pub legacy_server_faults: bool,
}

impl FaultPolicy {
    pub fn legacy() -> Self {
        Self {
            legacy_server_faults: true,
        }
    }
}

/// Orchestration codec → registre → handler → codec
///
/// Sans état propre : un même dispatcher est partagé (`Arc`) par tous les
/// transports et toutes les requêtes concurrentes.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<OperationRegistry>,
    repository: Arc<dyn Repository>,
    policy: FaultPolicy,
}

impl Dispatcher {
    pub fn new(registry: Arc<OperationRegistry>, repository: Arc<dyn Repository>) -> Self {
        Self {
            registry,
            repository,
            policy: FaultPolicy::default(),
        }
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Traite une enveloppe brute
    pub fn handle(&self, raw: &[u8]) -> Dispatch {
        let operation = match sniff_operation(raw) {
            Ok(name) => name,
            Err(SoapError::EmptyBody) => {
                debug!("SOAP request with an empty body");
                return Dispatch::fault(FaultCode::Client, "SOAP Body is empty");
            }
            Err(e) => {
                debug!("Rejecting SOAP request: {}", e);
                return Dispatch::fault(FaultCode::Client, "Invalid SOAP message");
            }
        };

        let Some(entry) = self.registry.lookup(&operation) else {
            warn!("⚠️ Unknown SOAP operation: {}", operation);
            return Dispatch::fault(
                FaultCode::MustUnderstand,
                format!("Unknown operation: {}", operation),
            );
        };

        debug!("📨 Dispatching {}", operation);

        match entry.invoke(raw, self.repository.as_ref()) {
            Ok(body) => Dispatch {
                body,
                outcome: Outcome::Success { operation },
            },
            Err(OperationFailure::Decode(e)) => {
                debug!("Invalid {} payload: {}", operation, e);
                Dispatch::fault(
                    FaultCode::Client,
                    format!("Invalid {} Request Structure", operation),
                )
            }
            Err(OperationFailure::Service(e)) => {
                let code = e.fault_code(self.policy.legacy_server_faults);
                debug!("{} failed ({}): {}", operation, code, e);
                Dispatch::fault(code, e.to_string())
            }
            Err(OperationFailure::Encode(e)) => {
                error!("❌ Failed to encode {} response: {}", operation, e);
                Dispatch::fallback()
            }
        }
    }
}
