//! Registre des opérations SOAP
//!
//! Associe un nom d'opération (le nom local de l'élément porté par le
//! `Body`) à un handler typé. À l'enregistrement, le type de requête et le
//! type de réponse du handler sont figés dans un [`OperationInvoker`] qui :
//!
//! ```text
//! octets bruts ──decode_typed::<Req>──▶ Req
//!                                        │ handler(Req, &dyn Repository)
//!                                        ▼
//!                 String ◀──encode_envelope── Resp
//! ```
//!
//! Le registre est construit au démarrage puis partagé derrière un `Arc` :
//! plus aucun enregistrement n'est possible une fois partagé.

use crate::errors::{ServiceError, SoapError};
use crate::operations::register_user_operations;
use crate::soap::{decode_typed, encode_envelope};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;
use userstore::Repository;

/// Échec d'une opération enregistrée, selon l'étape concernée
#[derive(Debug)]
pub enum OperationFailure {
    /// La charge utile ne correspond pas au type de requête
    Decode(SoapError),
    /// Le handler a refusé la requête
    Service(ServiceError),
    /// La réponse n'a pas pu être sérialisée
    Encode(SoapError),
}

/// Handler typé effacé : octets de l'enveloppe → enveloppe de réponse
pub type OperationInvoker =
    Box<dyn Fn(&[u8], &dyn Repository) -> Result<String, OperationFailure> + Send + Sync>;

/// Entrée du registre
pub struct RegisteredOperation {
    name: String,
    invoker: OperationInvoker,
}

impl RegisteredOperation {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Décode `raw`, exécute le handler et encode sa réponse
    pub fn invoke(&self, raw: &[u8], repository: &dyn Repository) -> Result<String, OperationFailure> {
        (self.invoker)(raw, repository)
    }
}

impl fmt::Debug for RegisteredOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredOperation")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: HashMap<String, RegisteredOperation>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registre contenant GetUserByID, CreateUser, UpdateUser et DeleteUser
    pub fn with_user_operations() -> Self {
        let mut registry = Self::new();
        register_user_operations(&mut registry);
        registry
    }

    /// Enregistre `handler` sous `name`
    ///
    /// Un second enregistrement du même nom remplace le premier.
    pub fn register<Req, Resp, F>(&mut self, name: &str, handler: F)
    where
        Req: DeserializeOwned + 'static,
        Resp: Serialize + 'static,
        F: Fn(Req, &dyn Repository) -> Result<Resp, ServiceError> + Send + Sync + 'static,
    {
        let invoker: OperationInvoker = Box::new(move |raw: &[u8], repository: &dyn Repository| {
            let request: Req = decode_typed(raw).map_err(OperationFailure::Decode)?;
            let response = handler(request, repository).map_err(OperationFailure::Service)?;
            encode_envelope(&response).map_err(OperationFailure::Encode)
        });

        let entry = RegisteredOperation {
            name: name.to_string(),
            invoker,
        };

        if self.operations.insert(name.to_string(), entry).is_some() {
            warn!("⚠️ Operation {} registered twice, keeping the last one", name);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&RegisteredOperation> {
        self.operations.get(name)
    }

    /// Noms enregistrés, triés
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
