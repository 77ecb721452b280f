//! # userconfig - Configuration du service UserSOAP
//!
//! La configuration est un arbre YAML construit en trois couches :
//!
//! 1. le fichier `usersoap.yaml` embarqué dans le binaire (valeurs par défaut)
//! 2. le fichier `config.yaml` du répertoire de configuration, s'il existe
//! 3. les variables d'environnement `USERSOAP_CONFIG__SECTION__KEY`
//!
//! Les clés sont insensibles à la casse. L'arbre fusionné est réécrit dans
//! `config.yaml` au chargement puis à chaque modification.
//!
//! ```no_run
//! use userconfig::get_config;
//!
//! let config = get_config();
//! let udp_port = config.get_udp_port();
//! let db_path = config.get_database_path()?;
//!
//! config.set_udp_port(udp_port + 1)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Les valeurs d'environnement sont lues comme des scalaires YAML :
//! `USERSOAP_CONFIG__UDP__PORT=9191` donne un nombre.

use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = include_str!("usersoap.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Cannot load the UserSOAP configuration"));
}

const ENV_CONFIG_DIR: &str = "USERSOAP_CONFIG";
const ENV_PREFIX: &str = "USERSOAP_CONFIG__";
const CONFIG_DIR_NAME: &str = ".usersoap";
const CONFIG_FILE_NAME: &str = "config.yaml";

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 8180;
const DEFAULT_SOAP_PATH: &str = "/soap/user";
const DEFAULT_UDP_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_UDP_PORT: u16 = 8181;
const DEFAULT_MAX_DATAGRAM_SIZE: usize = 4096;
const DEFAULT_UDP_REPLY_TIMEOUT_SECS: usize = 5;
const DEFAULT_DATABASE_PATH: &str = "user.db";
const DEFAULT_REMOVE_DB_ON_EXIT: bool = true;
const DEFAULT_LEGACY_FAULT_CODES: bool = false;
const DEFAULT_SEED_ENABLED: bool = true;
const DEFAULT_SEED_NAME: &str = "Alice Johnson";
const DEFAULT_SEED_EMAIL: &str = "alice@example.com";
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Accesseurs d'un entier positif, la valeur par défaut couvrant l'absence
/// comme une valeur illisible
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> usize {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n.as_u64().map(|v| v as usize).unwrap_or($default),
                Ok(Value::String(s)) => s.trim().parse::<usize>().unwrap_or($default),
                _ => $default,
            }
        }

        pub fn $setter(&self, value: usize) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value as u64)))
        }
    };
}

macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(flag)) => flag,
                Ok(Value::String(s)) => s.trim().parse::<bool>().unwrap_or($default),
                _ => $default,
            }
        }

        pub fn $setter(&self, flag: bool) -> Result<()> {
            self.set_value($path, Value::Bool(flag))
        }
    };
}

macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(Value::String(s)) if !s.trim().is_empty() => s,
                _ => $default.to_string(),
            }
        }

        pub fn $setter(&self, value: String) -> Result<()> {
            self.set_value($path, Value::String(value))
        }
    };
}

/// Configuration chargée et son fichier de persistance
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    file: PathBuf,
    tree: RwLock<Value>,
}

impl Config {
    /// Répertoire retenu : argument, puis `$USERSOAP_CONFIG`, puis
    /// `./.usersoap`, puis `~/.usersoap` ; à défaut `./.usersoap` est créé.
    fn resolve_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(from_env) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %from_env, "Config directory taken from environment");
            return from_env;
        }

        let candidates = [
            Some(PathBuf::from(CONFIG_DIR_NAME)),
            home_dir().map(|home| home.join(CONFIG_DIR_NAME)),
        ];

        candidates
            .into_iter()
            .flatten()
            .find(|dir| dir.is_dir())
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_else(|| CONFIG_DIR_NAME.to_string())
    }

    /// Crée le répertoire au besoin et vérifie qu'on peut y écrire
    fn prepare_config_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create config directory {}", dir.display()))?;

        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }

        let probe = dir.join(".usersoap_probe");
        fs::write(&probe, b"")
            .with_context(|| format!("Config directory {} is not writable", dir.display()))?;
        fs::remove_file(&probe)?;

        Ok(())
    }

    /// Charge la configuration de `directory` (vide : recherche automatique)
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::resolve_config_dir(directory);
        Self::prepare_config_dir(Path::new(&config_dir))?;
        info!(config_dir = %config_dir, "📁 Using config directory");

        let file = Path::new(&config_dir).join(CONFIG_FILE_NAME);

        let mut tree = lowercase_keys(serde_yaml::from_str(DEFAULT_CONFIG)?);

        // Les clés sont normalisées avant la fusion pour que `UDP` et `udp` se rejoignent
        match fs::read(&file) {
            Ok(bytes) => {
                let external: Value = serde_yaml::from_slice(&bytes)
                    .with_context(|| format!("Invalid YAML in {}", file.display()))?;
                merge_yaml(&mut tree, &lowercase_keys(external));
                info!(config_file = %file.display(), "Loaded config file");
            }
            Err(_) => {
                info!(config_file = %file.display(), "No config file, using embedded defaults");
            }
        }

        for (name, raw) in env::vars() {
            let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let path: Vec<&str> = suffix.split("__").collect();
            let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw.clone()));
            if let Err(e) = assign(&mut tree, &path, value) {
                warn!("Ignoring environment override {}: {}", name, e);
            }
        }

        let config = Config {
            config_dir,
            file,
            tree: RwLock::new(tree),
        };

        config.save()?;
        Ok(config)
    }

    /// Répertoire de configuration effectivement utilisé
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Réécrit `config.yaml`
    pub fn save(&self) -> Result<()> {
        let yaml = {
            let tree = self.tree.read().map_err(|_| anyhow!("Configuration lock poisoned"))?;
            serde_yaml::to_string(&*tree)?
        };
        fs::write(&self.file, yaml)
            .with_context(|| format!("Cannot write {}", self.file.display()))?;
        Ok(())
    }

    /// Modifie la valeur à `path` (par exemple `&["udp", "port"]`) puis sauvegarde
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut tree = self.tree.write().map_err(|_| anyhow!("Configuration lock poisoned"))?;
            assign(&mut tree, path, value)?;
        }
        self.save()
    }

    /// Valeur à `path` ; erreur si le chemin n'existe pas
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let tree = self.tree.read().map_err(|_| anyhow!("Configuration lock poisoned"))?;
        lookup(&tree, path).cloned()
    }

    /// Port lu à `path` ; une valeur absente ou hors plage donne `default`
    fn get_port(&self, path: &[&str], default: u16) -> u16 {
        let port = match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            Ok(Value::String(s)) => s.trim().parse::<u16>().ok(),
            Ok(_) => None,
            Err(_) => return default,
        };

        port.unwrap_or_else(|| {
            warn!("Invalid port at {}, using default {}", path.join("."), default);
            default
        })
    }

    /// Port HTTP (8180 par défaut)
    pub fn get_http_port(&self) -> u16 {
        self.get_port(&["host", "http_port"], DEFAULT_HTTP_PORT)
    }

    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    /// Port UDP (8181 par défaut)
    pub fn get_udp_port(&self) -> u16 {
        self.get_port(&["udp", "port"], DEFAULT_UDP_PORT)
    }

    pub fn set_udp_port(&self, port: u16) -> Result<()> {
        self.set_value(&["udp", "port"], Value::Number(Number::from(port)))
    }

    impl_string_config!(
        get_bind_address,
        set_bind_address,
        &["host", "bind_address"],
        DEFAULT_BIND_ADDRESS
    );

    impl_string_config!(
        get_udp_bind_address,
        set_udp_bind_address,
        &["udp", "bind_address"],
        DEFAULT_UDP_BIND_ADDRESS
    );

    /// Chemin de la route SOAP HTTP, toujours préfixé par `/`
    pub fn get_soap_path(&self) -> String {
        let raw = match self.get_value(&["host", "soap_path"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s,
            _ => DEFAULT_SOAP_PATH.to_string(),
        };
        format!("/{}", raw.trim().trim_start_matches('/'))
    }

    pub fn set_soap_path(&self, path: String) -> Result<()> {
        self.set_value(&["host", "soap_path"], Value::String(path))
    }

    impl_usize_config!(
        get_max_datagram_size,
        set_max_datagram_size,
        &["udp", "max_datagram_size"],
        DEFAULT_MAX_DATAGRAM_SIZE
    );

    impl_usize_config!(
        get_udp_reply_timeout_secs,
        set_udp_reply_timeout_secs,
        &["udp", "reply_timeout_secs"],
        DEFAULT_UDP_REPLY_TIMEOUT_SECS
    );

    /// Chemin du fichier de base de données
    ///
    /// Un chemin relatif est résolu par rapport au répertoire de configuration.
    /// Le répertoire parent est créé s'il n'existe pas.
    pub fn get_database_path(&self) -> Result<PathBuf> {
        let raw = match self.get_value(&["database", "path"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_DATABASE_PATH.to_string(),
        };

        let path = Path::new(&raw);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.config_dir).join(path)
        };

        if let Some(parent) = absolute.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                info!(directory=%parent.display(), "Created database directory");
            }
        }

        Ok(absolute)
    }

    pub fn set_database_path(&self, path: String) -> Result<()> {
        self.set_value(&["database", "path"], Value::String(path))
    }

    impl_bool_config!(
        get_database_remove_on_exit,
        set_database_remove_on_exit,
        &["database", "remove_on_exit"],
        DEFAULT_REMOVE_DB_ON_EXIT
    );

    impl_bool_config!(
        get_legacy_fault_codes,
        set_legacy_fault_codes,
        &["soap", "legacy_fault_codes"],
        DEFAULT_LEGACY_FAULT_CODES
    );

    impl_bool_config!(
        get_seed_enabled,
        set_seed_enabled,
        &["seed", "enabled"],
        DEFAULT_SEED_ENABLED
    );

    impl_string_config!(get_seed_name, set_seed_name, &["seed", "name"], DEFAULT_SEED_NAME);

    impl_string_config!(
        get_seed_email,
        set_seed_email,
        &["seed", "email"],
        DEFAULT_SEED_EMAIL
    );

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    impl_string_config!(
        get_log_min_level,
        set_log_min_level,
        &["host", "logger", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );
}

/// Configuration globale, chargée au premier accès
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn lookup<'a>(tree: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().enumerate().try_fold(tree, |node, (depth, key)| {
        let Value::Mapping(map) = node else {
            bail!("{} is not a section", path[..depth].join("."));
        };
        map.get(key.to_lowercase().as_str())
            .ok_or_else(|| anyhow!("{} is not set", path[..=depth].join(".")))
    })
}

fn assign(tree: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *tree = value;
        return Ok(());
    };

    let mut node = tree;
    for key in parents {
        let Value::Mapping(map) = node else {
            bail!("cannot descend into {}: not a section", key);
        };
        node = map
            .entry(Value::String(key.to_lowercase()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }

    match node {
        Value::Mapping(map) => {
            map.insert(Value::String(last.to_lowercase()), value);
            Ok(())
        }
        _ => bail!("cannot set {}: parent is not a section", path.join(".")),
    }
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lowercase_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Fusionne `overlay` dans `base`
///
/// Les sections sont fusionnées clé par clé ; toute autre valeur de
/// `overlay` remplace celle de `base`.
fn merge_yaml(base: &mut Value, overlay: &Value) {
    if let (Value::Mapping(base_map), Value::Mapping(overlay_map)) = (&mut *base, overlay) {
        for (key, value) in overlay_map {
            if let Some(existing) = base_map.get_mut(key) {
                merge_yaml(existing, value);
            } else {
                base_map.insert(key.clone(), value.clone());
            }
        }
        return;
    }
    *base = overlay.clone();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_in(dir: &tempfile::TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_from_embedded_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);

        assert_eq!(config.get_http_port(), 8180);
        assert_eq!(config.get_udp_port(), 8181);
        assert_eq!(config.get_soap_path(), "/soap/user");
        assert_eq!(config.get_max_datagram_size(), 4096);
        assert_eq!(config.get_udp_reply_timeout_secs(), 5);
        assert!(!config.get_legacy_fault_codes());
        assert!(config.get_seed_enabled());
        assert_eq!(config.get_seed_name(), "Alice Johnson");
        assert_eq!(config.get_seed_email(), "alice@example.com");
        assert!(dir.path().join("config.yaml").exists());
    }

    #[test]
    fn test_external_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "UDP:\n  Port: 9999\nsoap:\n  legacy_fault_codes: true\n",
        )
        .unwrap();

        let config = load_in(&dir);
        assert_eq!(config.get_udp_port(), 9999);
        assert!(config.get_legacy_fault_codes());
        // Les autres valeurs restent celles par défaut
        assert_eq!(config.get_http_port(), 8180);
        assert_eq!(config.get_udp_bind_address(), "127.0.0.1");
    }

    #[test]
    fn test_set_value_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);
        config.set_http_port(9000).unwrap();
        config.set_soap_path("api/users".to_string()).unwrap();

        let reloaded = load_in(&dir);
        assert_eq!(reloaded.get_http_port(), 9000);
        assert_eq!(reloaded.get_soap_path(), "/api/users");
    }

    #[test]
    fn test_database_path_is_relative_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);
        config.set_database_path("data/users.db".to_string()).unwrap();

        let path = config.get_database_path().unwrap();
        assert_eq!(path, dir.path().join("data/users.db"));
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn test_invalid_port_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);
        config
            .set_value(&["udp", "port"], Value::String("not-a-port".into()))
            .unwrap();
        assert_eq!(config.get_udp_port(), 8181);
    }

    #[test]
    fn test_merge_yaml_replaces_scalars() {
        let mut default: Value = serde_yaml::from_str("a: 1\nb:\n  c: 2\n  d: 3\n").unwrap();
        let external: Value = serde_yaml::from_str("b:\n  c: 20\ne: 5\n").unwrap();
        merge_yaml(&mut default, &external);

        let expected: Value = serde_yaml::from_str("a: 1\nb:\n  c: 20\n  d: 3\ne: 5\n").unwrap();
        assert_eq!(default, expected);
    }
}
