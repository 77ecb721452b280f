//! # Opérations du service utilisateur
//!
//! Quatre opérations CRUD, chacune décrite par un couple requête/réponse
//! ([`messages`]) et un handler pur ([`handlers`]) de la forme
//! `(Requête, &dyn Repository) -> Result<Réponse, ServiceError>`.

pub mod handlers;
pub mod messages;

pub use handlers::{create_user, delete_user, get_user_by_id, update_user};
pub use messages::{
    CreateUserRequest, CreateUserResponse, DeleteUserRequest, DeleteUserResponse,
    GetUserByIdRequest, GetUserByIdResponse, UpdateUserRequest, UpdateUserResponse,
    UserElement,
};

use crate::registry::OperationRegistry;

pub const GET_USER_BY_ID: &str = "GetUserByID";
pub const CREATE_USER: &str = "CreateUser";
pub const UPDATE_USER: &str = "UpdateUser";
pub const DELETE_USER: &str = "DeleteUser";

/// Enregistre les quatre opérations dans `registry`
pub fn register_user_operations(registry: &mut OperationRegistry) {
    registry.register(GET_USER_BY_ID, get_user_by_id);
    registry.register(CREATE_USER, create_user);
    registry.register(UPDATE_USER, update_user);
    registry.register(DELETE_USER, delete_user);
}
