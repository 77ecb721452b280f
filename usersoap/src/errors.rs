use crate::soap::FaultCode;
use thiserror::Error;

/// Erreurs du codec d'enveloppe
#[derive(Error, Debug)]
pub enum SoapError {
    /// Octets non conformes XML, ou racine autre que `Envelope`
    #[error("malformed SOAP envelope: {0}")]
    MalformedEnvelope(String),

    /// `Body` absent ou sans élément enfant
    #[error("SOAP Body is empty")]
    EmptyBody,

    /// La charge utile ne correspond pas au type attendu
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("envelope encoding failed: {0}")]
    Encode(String),
}

/// Erreurs métier retournées par les handlers
///
/// Le message est renvoyé tel quel dans le `faultstring`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Storage(String),
}

impl ServiceError {
    /// Code de fault associé à l'erreur
    ///
    /// Les erreurs de validation et d'absence sont imputables au client ;
    /// `legacy` les rapporte en `Server` pour les clients existants.
    pub fn fault_code(&self, legacy: bool) -> FaultCode {
        match self {
            ServiceError::Storage(_) => FaultCode::Server,
            ServiceError::Validation(_) | ServiceError::NotFound(_) if legacy => FaultCode::Server,
            ServiceError::Validation(_) | ServiceError::NotFound(_) => FaultCode::Client,
        }
    }
}
