//! Adaptateur datagramme
//!
//! Une boucle de réception unique ; chaque datagramme est traité dans sa
//! propre tâche et la boucle reprend `recv_from` aussitôt. La réponse est
//! renvoyée à l'adresse d'origine.
//!
//! Une enveloppe doit tenir dans un seul datagramme. Le tampon de réception
//! fait un octet de plus que la limite : un datagramme qui le remplit est
//! trop long et reçoit un fault Client au lieu d'être traité tronqué.
//! La limite est bornée par la charge utile maximale d'un datagramme UDP
//! sur IPv4.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use userconfig::Config;
use usersoap::{Dispatch, Dispatcher, FaultCode};

pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 4096;
pub const MAX_UDP_PAYLOAD: usize = 65_507;
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
struct DatagramLimits {
    max_size: usize,
    reply_timeout: Duration,
}

/// Serveur SOAP sur UDP
pub struct UdpServer {
    bind_address: String,
    port: u16,
    dispatcher: Arc<Dispatcher>,
    limits: DatagramLimits,
    local_addr: Option<SocketAddr>,
    shutdown: CancellationToken,
    join_handle: Option<JoinHandle<()>>,
}

impl UdpServer {
    pub fn new(bind_address: impl Into<String>, port: u16, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
            dispatcher,
            limits: DatagramLimits {
                max_size: DEFAULT_MAX_DATAGRAM_SIZE,
                reply_timeout: DEFAULT_REPLY_TIMEOUT,
            },
            local_addr: None,
            shutdown: CancellationToken::new(),
            join_handle: None,
        }
    }

    /// Adresse, port et limites lus dans la section `udp`
    pub fn from_config(config: &Config, dispatcher: Arc<Dispatcher>) -> Self {
        Self::new(config.get_udp_bind_address(), config.get_udp_port(), dispatcher)
            .with_max_datagram_size(config.get_max_datagram_size())
            .with_reply_timeout(Duration::from_secs(config.get_udp_reply_timeout_secs() as u64))
    }

    /// Fixe la taille maximale d'un datagramme, ramenée dans `1..=MAX_UDP_PAYLOAD`
    pub fn with_max_datagram_size(mut self, size: usize) -> Self {
        self.limits.max_size = size.clamp(1, MAX_UDP_PAYLOAD);
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.limits.reply_timeout = timeout;
        self
    }

    /// Lie le socket et lance la boucle de réception
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let socket = UdpSocket::bind((self.bind_address.as_str(), self.port))
            .await
            .with_context(|| {
                format!("Failed to start UDP server on {}:{}", self.bind_address, self.port)
            })?;
        let addr = socket.local_addr()?;
        self.local_addr = Some(addr);

        info!("✅ UDP SOAP server listening on {}", addr);

        self.join_handle = Some(tokio::spawn(receive_loop(
            Arc::new(socket),
            self.dispatcher.clone(),
            self.limits,
            self.shutdown.clone(),
        )));

        Ok(addr)
    }

    /// Arrête la boucle de réception
    ///
    /// Les datagrammes déjà reçus terminent leur traitement en tâche de fond.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
            info!("🛑 UDP SOAP server stopped");
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn max_datagram_size(&self) -> usize {
        self.limits.max_size
    }
}

async fn receive_loop(
    socket: Arc<UdpSocket>,
    dispatcher: Arc<Dispatcher>,
    limits: DatagramLimits,
    shutdown: CancellationToken,
) {
    let mut buf = vec![0u8; limits.max_size + 1];

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, peer)) => {
                    let payload = buf[..len].to_vec();
                    tokio::spawn(handle_datagram(
                        socket.clone(),
                        dispatcher.clone(),
                        payload,
                        peer,
                        limits,
                    ));
                }
                Err(e) => {
                    warn!("❌ Error reading from UDP socket: {}", e);
                }
            }
        }
    }
}

async fn handle_datagram(
    socket: Arc<UdpSocket>,
    dispatcher: Arc<Dispatcher>,
    payload: Vec<u8>,
    peer: SocketAddr,
    limits: DatagramLimits,
) {
    info!("📥 Received {} bytes from {}", payload.len(), peer);

    let reply = if payload.len() > limits.max_size {
        warn!("⚠️ Oversized datagram from {} rejected", peer);
        Dispatch::fault(
            FaultCode::Client,
            format!(
                "Message exceeds maximum datagram size of {} bytes",
                limits.max_size
            ),
        )
    } else {
        match tokio::task::spawn_blocking(move || dispatcher.handle(&payload)).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("❌ SOAP dispatch task failed for {}: {}", peer, e);
                return;
            }
        }
    };

    debug!("Datagram from {} dispatched: {:?}", peer, reply.outcome);

    let mut body = reply.into_bytes();
    if body.len() > limits.max_size {
        warn!(
            "⚠️ Response of {} bytes for {} exceeds the datagram limit",
            body.len(),
            peer
        );
        body = Dispatch::fault(
            FaultCode::Server,
            format!(
                "Response exceeds maximum datagram size of {} bytes",
                limits.max_size
            ),
        )
        .into_bytes();
    }

    match tokio::time::timeout(limits.reply_timeout, socket.send_to(&body, peer)).await {
        Ok(Ok(sent)) => info!("📤 Sent {} bytes to {}", sent, peer),
        Ok(Err(e)) => warn!("❌ Failed to send response to {}: {}", peer, e),
        Err(_) => warn!("⏱️ Timed out sending response to {}", peer),
    }
}
