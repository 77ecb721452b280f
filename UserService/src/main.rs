use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use userconfig::get_config;
use userserver::http::soap_router;
use userserver::{LoggingOptions, ServerBuilder, UdpServer, init_logging};
use usersoap::{Dispatcher, FaultPolicy, OperationRegistry};
use userstore::{Repository, User, UserStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = get_config();
    let _log_handle = init_logging(LoggingOptions::from_config(&config));

    // ========== Stockage ==========
    let db_path = config.get_database_path()?;
    info!("🗄️ Opening database {}", db_path.display());
    let store = Arc::new(
        UserStore::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?,
    );

    if config.get_seed_enabled() {
        let mut seed = User::new(config.get_seed_name(), config.get_seed_email());
        store.save(&mut seed).context("Failed to seed initial user")?;
        info!("👤 Seeded user {} with ID {}", seed.name, seed.id);
    }

    // ========== Dispatch ==========
    let registry = Arc::new(OperationRegistry::with_user_operations());
    info!("📋 SOAP operations: {}", registry.names().join(", "));

    let policy = FaultPolicy {
        legacy_server_faults: config.get_legacy_fault_codes(),
    };
    let dispatcher = Arc::new(Dispatcher::new(registry, store).with_fault_policy(policy));

    // ========== Transports ==========
    let mut udp = UdpServer::from_config(&config, dispatcher.clone());
    udp.start().await?;

    let soap_path = config.get_soap_path();
    let mut server = ServerBuilder::new_configured().build();
    server
        .add_router("/", soap_router(&soap_path, dispatcher))
        .await;
    let addr = server.start().await?;
    info!("✅ SOAP endpoint ready at http://{}{}", addr, soap_path);

    server.wait().await;
    udp.stop().await;
    drop(server);
    drop(udp);

    if config.get_database_remove_on_exit() {
        remove_database(&db_path);
    }

    info!("👋 UserSOAP stopped");
    Ok(())
}

fn remove_database(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!("🧹 Removed database {}", path.display()),
        Err(e) => warn!("⚠️ Failed to remove database {}: {}", path.display(), e),
    }
}
