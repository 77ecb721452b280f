//! Structures de l'enveloppe SOAP

use super::{SOAP_ENV_NS, USER_SERVICE_NS};
use serde::{Deserialize, Serialize, Serializer};

/// Enveloppe décodée avec une charge utile typée
///
/// Le nom de l'élément porté par le `Body` n'est pas vérifié ici : il a déjà
/// servi à choisir `T`.
#[derive(Debug, Deserialize)]
pub struct RequestEnvelope<T> {
    #[serde(rename = "Body")]
    pub body: TypedBody<T>,
}

/// Corps SOAP typé
#[derive(Debug, Deserialize)]
pub struct TypedBody<T> {
    #[serde(rename = "$value")]
    pub payload: T,
}

/// Enveloppe à sérialiser
#[derive(Serialize)]
#[serde(rename = "Envelope")]
pub(crate) struct OutgoingEnvelope<'a, T: Serialize> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,

    #[serde(rename = "Body")]
    body: OutgoingBody<'a, T>,
}

#[derive(Serialize)]
pub(crate) struct OutgoingBody<'a, T: Serialize> {
    #[serde(rename = "$value")]
    payload: &'a T,
}

impl<'a, T: Serialize> OutgoingEnvelope<'a, T> {
    pub(crate) fn new(payload: &'a T) -> Self {
        Self {
            xmlns: SOAP_ENV_NS,
            body: OutgoingBody { payload },
        }
    }
}

/// Attribut `xmlns="urn:user-service"` des messages du service
///
/// Toujours émis à la sérialisation, ignoré à la lecture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Xmlns;

impl Serialize for Xmlns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(USER_SERVICE_NS)
    }
}
