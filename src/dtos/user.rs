//! User DTOs

use crate::core::auth::SessionUser;
use crate::entities::{Event, User};
use serde::{Deserialize, Serialize};

/// Public view of a stored user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserDTO {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.user_id,
            name: value.name,
            email: value.email,
            image: value.image,
        }
    }
}

impl From<&User> for UserDTO {
    fn from(value: &User) -> Self {
        Self::from(value.clone())
    }
}

/// DTO to insert a user (the id comes from the identity provider)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateUserDTO {
    pub user_id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

/// Response of the sign-in callback
#[derive(Serialize, Deserialize, Debug)]
pub struct SignInDTO {
    pub user: UserDTO,
    /// Session token whose subject is the stored user id
    pub token: String,
}

#[derive(Serialize, Debug)]
pub struct DebugUserDTO {
    pub session_user: SessionUser,
    pub users_with_same_email: Vec<UserDTO>,
    pub events_created_by_those_users: Vec<Event>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FixUserDTO {
    pub success: bool,
    pub message: String,
    pub old_id: String,
    pub new_id: String,
}
