use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "Admin" => Role::Admin,
            "User" => Role::User,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role_str = match self {
            Role::Admin => "Admin",
            Role::User => "User",
        };
        write!(f, "{role_str}")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub picture: Option<String>,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_defaults_to_user() {
        assert_eq!(Role::from("Admin".to_string()), Role::Admin);
        assert_eq!(Role::from("moderator".to_string()), Role::User);
    }
}
