//! Messages typés des opérations utilisateur
//!
//! Chaque structure porte le nom de son élément XML (`#[serde(rename)]`) et
//! l'attribut `xmlns="urn:user-service"`, émis à l'écriture et ignoré à la
//! lecture. Les champs scalaires absents d'une requête valent 0 ou `""`.
//!
//! Dans les réponses, l'utilisateur est émis sous la forme
//! `<User><ID/><Name/><Email/></User>`, attendue par les clients existants.

use crate::soap::Xmlns;
use serde::{Deserialize, Serialize};
use userstore::User;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "GetUserByID")]
pub struct GetUserByIdRequest {
    #[serde(rename = "@xmlns", skip_deserializing)]
    xmlns: Xmlns,

    #[serde(default)]
    pub id: i64,
}

impl GetUserByIdRequest {
    pub fn new(id: i64) -> Self {
        Self { xmlns: Xmlns, id }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "GetUserByIDResponse")]
pub struct GetUserByIdResponse {
    #[serde(rename = "@xmlns", skip_deserializing)]
    xmlns: Xmlns,

    #[serde(rename = "User", with = "user_element")]
    pub user: User,
}

impl GetUserByIdResponse {
    pub fn new(user: User) -> Self {
        Self { xmlns: Xmlns, user }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "CreateUser")]
pub struct CreateUserRequest {
    #[serde(rename = "@xmlns", skip_deserializing)]
    xmlns: Xmlns,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,
}

impl CreateUserRequest {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            xmlns: Xmlns,
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "CreateUserResponse")]
pub struct CreateUserResponse {
    #[serde(rename = "@xmlns", skip_deserializing)]
    xmlns: Xmlns,

    #[serde(rename = "User", with = "user_element")]
    pub user: User,
}

impl CreateUserResponse {
    pub fn new(user: User) -> Self {
        Self { xmlns: Xmlns, user }
    }
}

/// Mise à jour partielle : un champ vide laisse la valeur stockée intacte
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "UpdateUser")]
pub struct UpdateUserRequest {
    #[serde(rename = "@xmlns", skip_deserializing)]
    xmlns: Xmlns,

    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,
}

impl UpdateUserRequest {
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            xmlns: Xmlns,
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "UpdateUserResponse")]
pub struct UpdateUserResponse {
    #[serde(rename = "@xmlns", skip_deserializing)]
    xmlns: Xmlns,

    #[serde(rename = "User", with = "user_element")]
    pub user: User,
}

impl UpdateUserResponse {
    pub fn new(user: User) -> Self {
        Self { xmlns: Xmlns, user }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "DeleteUser")]
pub struct DeleteUserRequest {
    #[serde(rename = "@xmlns", skip_deserializing)]
    xmlns: Xmlns,

    #[serde(default)]
    pub id: i64,
}

impl DeleteUserRequest {
    pub fn new(id: i64) -> Self {
        Self { xmlns: Xmlns, id }
    }
}

/// Résultat d'une suppression
///
/// `success == false` n'est pas un fault : l'identifiant était absent ou le
/// stockage a refusé la suppression, et `message` l'explique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "DeleteUserResponse")]
pub struct DeleteUserResponse {
    #[serde(rename = "@xmlns", skip_deserializing)]
    xmlns: Xmlns,

    pub success: bool,

    #[serde(default)]
    pub message: String,
}

impl DeleteUserResponse {
    pub fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            xmlns: Xmlns,
            success,
            message: message.into(),
        }
    }
}

/// Élément `<User>` des réponses
///
/// Distinct de [`User`], dont les clés en minuscules restent celles du blob
/// JSON stocké.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserElement {
    #[serde(rename = "ID", default)]
    pub id: i64,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Email", default)]
    pub email: String,
}

impl From<&User> for UserElement {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<UserElement> for User {
    fn from(element: UserElement) -> Self {
        Self {
            id: element.id,
            name: element.name,
            email: element.email,
        }
    }
}

mod user_element {
    use super::UserElement;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use userstore::User;

    pub fn serialize<S: Serializer>(user: &User, serializer: S) -> Result<S::Ok, S::Error> {
        UserElement::from(user).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<User, D::Error> {
        UserElement::deserialize(deserializer).map(User::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soap::{decode_typed, encode_envelope};

    #[test]
    fn test_user_element_uses_capitalized_names() {
        let alice = User {
            id: 1,
            name: "Alice Johnson".into(),
            email: "alice@example.com".into(),
        };
        let xml = encode_envelope(&GetUserByIdResponse::new(alice.clone())).unwrap();

        assert!(xml.contains("<ID>1</ID>"));
        assert!(xml.contains("<Name>Alice Johnson</Name>"));
        assert!(xml.contains("<Email>alice@example.com</Email>"));
        assert!(!xml.contains("<name>"));

        let decoded: GetUserByIdResponse = decode_typed(xml.as_bytes()).unwrap();
        assert_eq!(decoded.user, alice);
    }
}
