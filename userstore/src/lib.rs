//! # userstore - Stockage des utilisateurs
//!
//! Cette crate fournit le stockage persistant des enregistrements [`User`]
//! du service UserSOAP.
//!
//! ## Architecture
//!
//! - [`db`] : magasin clé-valeur organisé en *buckets*, chacun doté d'un
//!   compteur de séquence monotone, posé sur SQLite
//! - [`repository`] : le trait [`Repository`] consommé par les opérations
//!   SOAP, et son implémentation [`UserStore`]
//!
//! Chaque utilisateur est stocké dans le bucket `Users`, sous la clé
//! décimale de son identifiant, sous forme de blob JSON.
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use userstore::{Repository, User, UserStore};
//! use std::path::Path;
//!
//! let store = UserStore::open(Path::new("user.db")).unwrap();
//! let mut user = User::new("Alice Johnson", "alice@example.com");
//! store.save(&mut user).unwrap();
//! assert!(user.id > 0);
//! ```

pub mod db;
pub mod errors;
pub mod repository;
mod user;

pub use db::{KvStore, Tx};
pub use errors::StoreError;
pub use repository::{Repository, USER_BUCKET, UserStore};
pub use user::User;
