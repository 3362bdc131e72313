use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    /// Argon2 PHC string. A user without one cannot log in.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

/// The shape returned by the user listing: no email, no credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}
