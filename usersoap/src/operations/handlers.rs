//! Handlers des opérations utilisateur
//!
//! Fonctions pures de la requête typée et du [`Repository`] partagé. Les
//! messages d'erreur sont renvoyés tels quels au client dans le `faultstring`.

use super::messages::*;
use crate::errors::ServiceError;
use tracing::debug;
use userstore::{Repository, StoreError, User};

fn store_failure(context: &str, err: StoreError) -> ServiceError {
    let message = format!("{context}: {err}");
    if err.is_not_found() {
        ServiceError::NotFound(message)
    } else {
        ServiceError::Storage(message)
    }
}

fn check_id(id: i64) -> Result<(), ServiceError> {
    if id <= 0 {
        return Err(ServiceError::Validation(format!("invalid user ID: {id}")));
    }
    Ok(())
}

pub fn get_user_by_id(
    request: GetUserByIdRequest,
    repository: &dyn Repository,
) -> Result<GetUserByIdResponse, ServiceError> {
    let user = repository
        .get(request.id)
        .map_err(|e| store_failure("user retrieval failed", e))?;

    Ok(GetUserByIdResponse::new(user))
}

pub fn create_user(
    request: CreateUserRequest,
    repository: &dyn Repository,
) -> Result<CreateUserResponse, ServiceError> {
    if request.name.is_empty() || request.email.is_empty() {
        return Err(ServiceError::Validation(
            "name and email are required".to_string(),
        ));
    }

    let mut user = User::new(request.name, request.email);
    repository
        .save(&mut user)
        .map_err(|e| store_failure("user creation failed", e))?;

    debug!(id = user.id, "👤 User created");
    Ok(CreateUserResponse::new(user))
}

pub fn update_user(
    request: UpdateUserRequest,
    repository: &dyn Repository,
) -> Result<UpdateUserResponse, ServiceError> {
    check_id(request.id)?;

    let mut user = repository
        .get(request.id)
        .map_err(|e| store_failure("user update failed", e))?;

    if !request.name.is_empty() {
        user.name = request.name;
    }
    if !request.email.is_empty() {
        user.email = request.email;
    }

    repository
        .save(&mut user)
        .map_err(|e| store_failure("user update failed", e))?;

    Ok(UpdateUserResponse::new(user))
}

/// Supprime un utilisateur
///
/// Seul un identifiant invalide est une erreur ; l'absence de l'utilisateur
/// ou un échec du stockage donnent une réponse `success = false`.
pub fn delete_user(
    request: DeleteUserRequest,
    repository: &dyn Repository,
) -> Result<DeleteUserResponse, ServiceError> {
    check_id(request.id)?;

    let response = match repository.delete(request.id) {
        Ok(true) => DeleteUserResponse::new(
            true,
            format!("User with ID {} deleted successfully", request.id),
        ),
        Ok(false) => {
            DeleteUserResponse::new(false, format!("User with ID {} not found", request.id))
        }
        Err(e) => DeleteUserResponse::new(false, e.to_string()),
    };

    Ok(response)
}
