//! Initialisation du logging
//!
//! Un `Registry` tracing avec un filtre de niveau rechargeable, suivi d'une
//! couche console optionnelle. Le niveau peut être modifié à chaud via le
//! [`LogHandle`] retourné par [`init_logging`].

use std::sync::{Arc, RwLock};

use tracing::Level;
use tracing_subscriber::{
    Registry,
    filter::LevelFilter,
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
};
use userconfig::Config;

/// Options du logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub min_level: Level,
    pub enable_console: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            enable_console: true,
        }
    }
}

impl LoggingOptions {
    /// Lit `host.logger.min_level` et `host.logger.enable_console`
    pub fn from_config(config: &Config) -> Self {
        let min_level = string_to_level(&config.get_log_min_level()).unwrap_or_else(|| {
            eprintln!(
                "⚠️ Unknown log level {:?}, falling back to INFO",
                config.get_log_min_level()
            );
            Level::INFO
        });

        Self {
            min_level,
            enable_console: config.get_log_enable_console(),
        }
    }
}

/// Accès au filtre rechargeable
#[derive(Clone)]
pub struct LogHandle {
    level: Arc<RwLock<Level>>,
    reload_handle: reload::Handle<LevelFilter, Registry>,
}

impl LogHandle {
    pub fn max_level(&self) -> Level {
        self.level.read().map(|l| *l).unwrap_or(Level::TRACE)
    }

    /// Change le niveau de log ; `level` est l'un de ERROR, WARN, INFO, DEBUG, TRACE
    pub fn set_max_level(&self, level: &str) -> anyhow::Result<()> {
        let level = string_to_level(level)
            .ok_or_else(|| anyhow::anyhow!("Invalid log level: {}", level))?;

        self.reload_handle
            .reload(LevelFilter::from_level(level))
            .map_err(|e| anyhow::anyhow!("Failed to reload log level filter: {}", e))?;

        if let Ok(mut current) = self.level.write() {
            *current = level;
        }
        tracing::info!("Log level changed to: {}", level);
        Ok(())
    }
}

/// Installe le subscriber global
///
/// Sans effet (hormis un message) si un subscriber est déjà installé, ce qui
/// arrive dans les tests.
///
/// ```rust,no_run
/// use userserver::logs::{LoggingOptions, init_logging};
///
/// let handle = init_logging(LoggingOptions::default());
/// handle.set_max_level("DEBUG").unwrap();
/// ```
pub fn init_logging(options: LoggingOptions) -> LogHandle {
    let (filter, reload_handle) = reload::Layer::new(LevelFilter::from_level(options.min_level));

    let console = options.enable_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
    });

    if let Err(e) = Registry::default().with(filter).with(console).try_init() {
        eprintln!("⚠️ Logging already initialized: {}", e);
    }

    LogHandle {
        level: Arc::new(RwLock::new(options.min_level)),
        reload_handle,
    }
}

fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}
