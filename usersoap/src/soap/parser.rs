//! Lecture des enveloppes SOAP en deux passes

use super::envelope::RequestEnvelope;
use crate::errors::SoapError;
use serde::de::DeserializeOwned;
use xmltree::Element;

/// Première passe : nom local de l'élément porté par le `Body`
///
/// Seul le nom est extrait ; le contenu de l'élément n'est pas validé. Le
/// préfixe de namespace est ignoré, mais le document doit être bien formé
/// (un préfixe non déclaré est rejeté).
///
/// # Erreurs
///
/// - [`SoapError::MalformedEnvelope`] si le XML est invalide ou si la racine
///   n'est pas un `Envelope`
/// - [`SoapError::EmptyBody`] si le `Body` est absent ou vide
pub fn sniff_operation(xml: &[u8]) -> Result<String, SoapError> {
    let root = Element::parse(xml).map_err(|e| SoapError::MalformedEnvelope(e.to_string()))?;

    if root.name != "Envelope" {
        return Err(SoapError::MalformedEnvelope(format!(
            "unexpected root element <{}>",
            root.name
        )));
    }

    let body = root
        .children
        .iter()
        .filter_map(|n| n.as_element())
        .find(|e| e.name == "Body")
        .ok_or(SoapError::EmptyBody)?;

    let payload = body
        .children
        .iter()
        .find_map(|n| n.as_element())
        .ok_or(SoapError::EmptyBody)?;

    Ok(payload.name.clone())
}

/// Seconde passe : relit toute l'enveloppe en attendant un `T` dans le `Body`
///
/// Les éléments scalaires absents prennent la valeur par défaut du type
/// cible ; un scalaire présent mais invalide (`<id>abc</id>`) est une erreur.
pub fn decode_typed<T: DeserializeOwned>(xml: &[u8]) -> Result<T, SoapError> {
    let text = std::str::from_utf8(xml).map_err(|e| SoapError::MalformedRequest(e.to_string()))?;
    let envelope: RequestEnvelope<T> =
        quick_xml::de::from_str(text).map_err(|e| SoapError::MalformedRequest(e.to_string()))?;
    Ok(envelope.body.payload)
}
