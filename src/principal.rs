//! The acting user, passed explicitly into every policy and lifecycle call.

use crate::constants::ROLE_USER;
use crate::orm::users;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub username: String,
    pub role: String,
}

impl Principal {
    pub fn new(id: i32, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            role: ROLE_USER.to_owned(),
        }
    }

    /// Every registered role implies `ROLE_USER`.
    pub fn has_role(&self, role: &str) -> bool {
        role == ROLE_USER || self.role == role
    }
}

impl From<&users::Model> for Principal {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
        }
    }
}
