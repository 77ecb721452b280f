//! Magasin clé-valeur à buckets sur SQLite
//!
//! Ce module reproduit un modèle « bucket + séquence » : chaque bucket est un
//! espace de clés indépendant doté d'un compteur monotone servant à attribuer
//! des identifiants. Toutes les opérations passent par une transaction
//! ([`KvStore::view`] en lecture, [`KvStore::update`] en écriture), exécutée
//! sous le verrou de l'unique connexion : une écriture est atomique et une
//! lecture concurrente observe l'état complet d'avant ou d'après.

use crate::errors::StoreError;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS buckets (
        name TEXT PRIMARY KEY,
        sequence INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS entries (
        bucket TEXT NOT NULL REFERENCES buckets(name) ON DELETE CASCADE,
        key TEXT NOT NULL,
        value BLOB NOT NULL,
        PRIMARY KEY (bucket, key)
    );
";

/// Base clé-valeur partagée par tout le processus
#[derive(Debug)]
pub struct KvStore {
    conn: Mutex<Connection>,
}

/// Vue transactionnelle passée aux closures de [`KvStore::view`] et [`KvStore::update`]
pub struct Tx<'a> {
    conn: &'a Connection,
}

impl KvStore {
    /// Ouvre (ou crée) la base au chemin donné
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// use userstore::db::KvStore;
    /// use std::path::Path;
    ///
    /// let store = KvStore::open(Path::new("user.db")).unwrap();
    /// ```
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        // Équivalent du délai d'ouverture : on n'attend pas indéfiniment un autre processus
        conn.busy_timeout(Duration::from_secs(1))?;
        Self::init(conn)
    }

    /// Base volatile, utile pour les tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        debug!("Key-value store initialized");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Exécute `f` dans une transaction de lecture
    pub fn view<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Tx<'_>) -> Result<T, StoreError>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.transaction()?;
        let result = f(&Tx::new(&tx))?;
        tx.commit()?;
        Ok(result)
    }

    /// Exécute `f` dans une transaction d'écriture
    ///
    /// La transaction est validée si `f` réussit, annulée sinon.
    pub fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Tx<'_>) -> Result<T, StoreError>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = f(&Tx::new(&tx))?;
        tx.commit()?;
        Ok(result)
    }

    /// Crée un bucket s'il n'existe pas encore
    pub fn create_bucket_if_not_exists(&self, bucket: &str) -> Result<(), StoreError> {
        self.update(|tx| tx.create_bucket_if_not_exists(bucket))
    }
}

impl<'a> Tx<'a> {
    fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create_bucket_if_not_exists(&self, bucket: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO buckets (name, sequence) VALUES (?1, 0)",
            [bucket],
        )?;
        Ok(())
    }

    pub fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM buckets WHERE name = ?1", [bucket], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn ensure_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        if self.bucket_exists(bucket)? {
            Ok(())
        } else {
            Err(StoreError::BucketNotFound(bucket.to_string()))
        }
    }

    /// Lit la valeur associée à `key`, `None` si la clé est absente
    pub fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.ensure_bucket(bucket)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM entries WHERE bucket = ?1 AND key = ?2",
                params![bucket, key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Écrit (ou remplace) la valeur associée à `key`
    pub fn put(&self, bucket: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.ensure_bucket(bucket)?;
        self.conn.execute(
            "INSERT INTO entries (bucket, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(bucket, key) DO UPDATE SET value = excluded.value",
            params![bucket, key, value],
        )?;
        Ok(())
    }

    /// Supprime `key` ; retourne `false` si la clé n'existait pas
    pub fn delete(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        self.ensure_bucket(bucket)?;
        let removed = self.conn.execute(
            "DELETE FROM entries WHERE bucket = ?1 AND key = ?2",
            params![bucket, key],
        )?;
        Ok(removed > 0)
    }

    /// Incrémente et retourne le compteur de séquence du bucket
    ///
    /// Le premier appel sur un bucket neuf retourne 1.
    pub fn next_sequence(&self, bucket: &str) -> Result<u64, StoreError> {
        let updated = self.conn.execute(
            "UPDATE buckets SET sequence = sequence + 1 WHERE name = ?1",
            [bucket],
        )?;
        if updated == 0 {
            return Err(StoreError::BucketNotFound(bucket.to_string()));
        }
        let sequence: i64 = self.conn.query_row(
            "SELECT sequence FROM buckets WHERE name = ?1",
            [bucket],
            |row| row.get(0),
        )?;
        Ok(sequence as u64)
    }

    /// Nombre de clés du bucket
    pub fn len(&self, bucket: &str) -> Result<usize, StoreError> {
        self.ensure_bucket(bucket)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE bucket = ?1",
            [bucket],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
