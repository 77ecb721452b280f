use serde::{Deserialize, Serialize};

/// Utilisateur du service
///
/// `id == 0` signifie « pas encore enregistré » : l'identifiant est attribué
/// par le [`Repository`](crate::Repository) à la première sauvegarde et ne
/// change plus ensuite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl User {
    /// Crée un utilisateur non encore persisté
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
        }
    }
}
