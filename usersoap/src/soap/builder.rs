//! Construction des enveloppes SOAP

use super::envelope::OutgoingEnvelope;
use crate::errors::SoapError;
use serde::Serialize;

/// Déclaration placée en tête de chaque enveloppe émise
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Fault de dernier recours, utilisé si la sérialisation elle-même échoue
pub const FALLBACK_FAULT: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Envelope xmlns=\"http://schemas.xmlsoap.org/soap/envelope/\"><Body><Fault><faultcode>Server</faultcode><faultstring>Internal Error</faultstring></Fault></Body></Envelope>";

/// Enveloppe `payload` (réponse, requête ou [`Fault`](super::Fault))
///
/// Le nom de l'élément est celui du type sérialisé (`#[serde(rename)]`).
/// La sortie est indentée de deux espaces.
pub fn encode_envelope<T: Serialize>(payload: &T) -> Result<String, SoapError> {
    let mut xml = String::from(XML_HEADER);

    let mut serializer = quick_xml::se::Serializer::new(&mut xml);
    serializer.indent(' ', 2);

    OutgoingEnvelope::new(payload)
        .serialize(serializer)
        .map_err(|e| SoapError::Encode(e.to_string()))?;

    Ok(xml)
}
