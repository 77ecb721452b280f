//! # Module Server - serveur HTTP du service
//!
//! Fine surcouche à Axum : les routes sont accumulées dans un `Router`
//! partagé puis servies par [`Server::start`]. L'arrêt est gracieux, soit sur
//! Ctrl+C ([`Server::wait`]), soit à la demande ([`Server::stop`]).

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use userconfig::get_config;

/// Serveur HTTP
pub struct Server {
    name: String,
    bind_address: String,
    http_port: u16,
    router: Arc<RwLock<Router>>,
    local_addr: Option<SocketAddr>,
    shutdown: CancellationToken,
    join_handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Crée un serveur écoutant sur `bind_address:http_port`
    ///
    /// Le port 0 laisse le système choisir un port libre, lisible ensuite via
    /// [`Server::local_addr`].
    pub fn new(name: impl Into<String>, bind_address: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            bind_address: bind_address.into(),
            http_port,
            router: Arc::new(RwLock::new(Router::new())),
            local_addr: None,
            shutdown: CancellationToken::new(),
            join_handle: None,
        }
    }

    /// Ajoute un sous-router
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let mut r = self.router.write().await;

        *r = if path == "/" {
            std::mem::take(&mut *r).merge(sub_router)
        } else {
            let normalized = format!("/{}", path.trim_start_matches('/'));
            std::mem::take(&mut *r).nest(&normalized, sub_router)
        };
    }

    /// Démarre le serveur HTTP et retourne l'adresse effectivement liée
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind((self.bind_address.as_str(), self.http_port))
            .await
            .with_context(|| {
                format!(
                    "Failed to bind HTTP server on {}:{}",
                    self.bind_address, self.http_port
                )
            })?;
        let addr = listener.local_addr()?;
        self.local_addr = Some(addr);

        info!("🌐 Server {} running at http://{}", self.name, addr);

        let router = self.router.read().await.clone();
        let token = self.shutdown.clone();
        let name = self.name.clone();

        self.join_handle = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!("❌ Server {} stopped with error: {}", name, e);
            }
        }));

        Ok(addr)
    }

    /// Attend Ctrl+C (ou l'arrêt du serveur) puis arrête proprement
    pub async fn wait(&mut self) {
        let Some(mut handle) = self.join_handle.take() else {
            return;
        };

        tokio::select! {
            _ = &mut handle => {
                info!("Server {} terminated", self.name);
                return;
            }
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Ctrl+C reçu, arrêt gracieux"),
                    Err(e) => error!("❌ Failed to listen for Ctrl+C: {}", e),
                }
            }
        }

        self.shutdown.cancel();
        let _ = handle.await;
    }

    /// Arrête le serveur et attend la fin des requêtes en cours
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
            info!("🛑 Server {} stopped", self.name);
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    bind_address: String,
    http_port: u16,
}

impl ServerBuilder {
    pub fn new(name: impl Into<String>, bind_address: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            bind_address: bind_address.into(),
            http_port,
        }
    }

    /// Adresse et port lus dans la configuration globale
    pub fn new_configured() -> Self {
        let config = get_config();
        Self {
            name: "UserSOAP".to_string(),
            bind_address: config.get_bind_address(),
            http_port: config.get_http_port(),
        }
    }

    pub fn build(self) -> Server {
        Server::new(self.name, self.bind_address, self.http_port)
    }
}
