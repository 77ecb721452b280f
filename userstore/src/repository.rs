//! Accès aux utilisateurs persistés

use crate::db::KvStore;
use crate::errors::StoreError;
use crate::user::User;
use std::path::Path;
use tracing::debug;

/// Bucket contenant les enregistrements utilisateur
pub const USER_BUCKET: &str = "Users";

/// Capacité de stockage consommée par les opérations
///
/// Le handle est ouvert une seule fois au démarrage puis partagé entre toutes
/// les requêtes concurrentes : les implémentations doivent garantir qu'un
/// `save` ou un `delete` est atomique, et que deux `save` concurrents de
/// nouveaux utilisateurs reçoivent des identifiants distincts.
pub trait Repository: Send + Sync {
    /// Retourne une copie de l'utilisateur `id`, ou [`StoreError::NotFound`]
    fn get(&self, id: i64) -> Result<User, StoreError>;

    /// Persiste `user`, en lui attribuant un identifiant si `user.id == 0`
    fn save(&self, user: &mut User) -> Result<(), StoreError>;

    /// Supprime l'utilisateur `id` ; retourne `false` s'il n'existait pas
    fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// [`Repository`] adossé au [`KvStore`]
#[derive(Debug)]
pub struct UserStore {
    db: KvStore,
}

impl UserStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::with_store(KvStore::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_store(KvStore::open_in_memory()?)
    }

    pub fn with_store(db: KvStore) -> Result<Self, StoreError> {
        db.create_bucket_if_not_exists(USER_BUCKET)?;
        Ok(Self { db })
    }

    /// Nombre d'utilisateurs enregistrés
    pub fn count(&self) -> Result<usize, StoreError> {
        self.db.view(|tx| tx.len(USER_BUCKET))
    }
}

impl Repository for UserStore {
    fn get(&self, id: i64) -> Result<User, StoreError> {
        let raw = self.db.view(|tx| tx.get(USER_BUCKET, &id.to_string()))?;
        match raw {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn save(&self, user: &mut User) -> Result<(), StoreError> {
        let assigned = self.db.update(|tx| {
            tx.create_bucket_if_not_exists(USER_BUCKET)?;

            let mut record = user.clone();
            if record.id == 0 {
                record.id = tx.next_sequence(USER_BUCKET)? as i64;
            }

            let buf = serde_json::to_vec(&record)?;
            tx.put(USER_BUCKET, &record.id.to_string(), &buf)?;
            Ok(record.id)
        })?;

        // L'identifiant n'est reporté qu'une fois la transaction validée
        user.id = assigned;
        debug!(id = assigned, "User saved");
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self.db.update(|tx| tx.delete(USER_BUCKET, &id.to_string()))?;
        debug!(id, removed, "User delete");
        Ok(removed)
    }
}
