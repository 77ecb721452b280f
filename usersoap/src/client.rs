//! Clients SOAP pour les deux transports
//!
//! Les deux clients envoient une enveloppe déjà encodée et retournent la
//! réponse brute sous forme de [`SoapReply`], qu'il s'agisse d'un succès ou
//! d'un fault : un fault n'est pas une erreur de transport.
//!
//! ```rust,no_run
//! use usersoap::client::UdpSoapClient;
//! use usersoap::operations::{GetUserByIdRequest, GetUserByIdResponse};
//!
//! # async fn demo() -> Result<(), usersoap::client::ClientError> {
//! let client = UdpSoapClient::connect("127.0.0.1:8181").await?;
//! let reply = client.call(&GetUserByIdRequest::new(1)).await?;
//! let response: GetUserByIdResponse = reply.decode()?;
//! println!("{}", response.user.name);
//! # Ok(())
//! # }
//! ```

use crate::errors::SoapError;
use crate::soap::{Fault, decode_typed, encode_envelope, sniff_operation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{ToSocketAddrs, UdpSocket};
use tracing::debug;

/// Délai de réception par défaut
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Taille du tampon de réception UDP
pub const RECEIVE_BUFFER_SIZE: usize = 4096;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Soap(#[from] SoapError),

    #[error("SOAP fault {}: {}", .0.fault_code, .0.fault_string)]
    Fault(Fault),
}

/// Réponse brute d'un service SOAP
#[derive(Debug, Clone)]
pub struct SoapReply {
    pub raw: String,
    /// Nom de l'élément porté par le `Body` (`Fault` pour un fault)
    pub operation: String,
}

impl SoapReply {
    pub fn parse(raw: impl Into<String>) -> Result<Self, ClientError> {
        let raw = raw.into();
        let operation = sniff_operation(raw.as_bytes())?;
        Ok(Self { raw, operation })
    }

    pub fn is_fault(&self) -> bool {
        self.operation == "Fault"
    }

    pub fn fault(&self) -> Option<Fault> {
        if !self.is_fault() {
            return None;
        }
        decode_typed(self.raw.as_bytes()).ok()
    }

    /// Décode la réponse ; un fault devient [`ClientError::Fault`]
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        if let Some(fault) = self.fault() {
            return Err(ClientError::Fault(fault));
        }
        Ok(decode_typed(self.raw.as_bytes())?)
    }
}

/// Client du transport datagramme
pub struct UdpSoapClient {
    socket: UdpSocket,
    timeout: Duration,
}

impl UdpSoapClient {
    /// Associe un socket local éphémère au serveur `addr`
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, ClientError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(addr).await?;
        Ok(Self {
            socket,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Envoie `payload` tel quel et attend un datagramme de réponse
    pub async fn send_raw(&self, payload: &[u8]) -> Result<String, ClientError> {
        self.socket.send(payload).await?;
        debug!("📤 Sent {} bytes to {:?}", payload.len(), self.socket.peer_addr().ok());

        let mut buf = vec![0u8; RECEIVE_BUFFER_SIZE];
        let len = tokio::time::timeout(self.timeout, self.socket.recv(&mut buf))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))??;

        debug!("📥 Received {} bytes", len);
        Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
    }

    /// Encode `request` dans une enveloppe et retourne la réponse
    pub async fn call<T: Serialize>(&self, request: &T) -> Result<SoapReply, ClientError> {
        let xml = encode_envelope(request)?;
        SoapReply::parse(self.send_raw(xml.as_bytes()).await?)
    }
}

/// Client du transport HTTP
pub struct HttpSoapClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSoapClient {
    /// `endpoint` est l'URL complète, par exemple `http://127.0.0.1:8180/soap/user`
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// POST de `payload` ; le corps est lu quel que soit le statut HTTP
    pub async fn send_raw(&self, payload: impl Into<String>) -> Result<(u16, String), ClientError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "")
            .body(payload.into())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("📥 HTTP {} ({} bytes) from {}", status, body.len(), self.endpoint);
        Ok((status, body))
    }

    pub async fn call<T: Serialize>(&self, request: &T) -> Result<SoapReply, ClientError> {
        let xml = encode_envelope(request)?;
        let (_, body) = self.send_raw(xml).await?;
        SoapReply::parse(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::GetUserByIdResponse;
    use crate::soap::FaultCode;
    use userstore::User;

    #[test]
    fn test_reply_decodes_success() {
        let user = User {
            id: 1,
            name: "Alice Johnson".into(),
            email: "alice@example.com".into(),
        };
        let raw = encode_envelope(&GetUserByIdResponse::new(user.clone())).unwrap();

        let reply = SoapReply::parse(raw).unwrap();
        assert_eq!(reply.operation, "GetUserByIDResponse");
        assert!(!reply.is_fault());
        assert_eq!(reply.decode::<GetUserByIdResponse>().unwrap().user, user);
    }

    #[test]
    fn test_reply_surfaces_fault() {
        let raw = encode_envelope(&Fault::new(FaultCode::Client, "SOAP Body is empty")).unwrap();

        let reply = SoapReply::parse(raw).unwrap();
        assert!(reply.is_fault());
        assert_eq!(reply.fault().unwrap().fault_string, "SOAP Body is empty");
        assert!(matches!(
            reply.decode::<GetUserByIdResponse>(),
            Err(ClientError::Fault(f)) if f.code() == Some(FaultCode::Client)
        ));
    }

    #[tokio::test]
    async fn test_udp_timeout() {
        // Socket muet : reçoit mais ne répond jamais
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = UdpSoapClient::connect(silent.local_addr().unwrap())
            .await
            .unwrap()
            .with_timeout(Duration::from_millis(100));

        let err = client.send_raw(b"<Envelope/>").await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
    }
}
