use thiserror::Error;

/// Erreurs de la couche de stockage
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("bucket {0} not found")]
    BucketNotFound(String),

    #[error("user with ID {0} not found")]
    NotFound(i64),

    #[error("storage lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
