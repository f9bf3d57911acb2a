use serde::{Deserialize, Serialize};

// Request bodies

#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest<'a> {
    pub image: &'a str,
}

#[derive(Serialize, Debug, Clone)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub image: &'a str,
}

// Response bodies

#[derive(Deserialize, Debug, Clone)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserPayload {
    pub name: String,
    pub confidence: f32,
}

/// Shape shared by register responses and every non-2xx error body.
#[derive(Deserialize, Debug, Clone)]
pub struct MessageResponse {
    #[serde(default)]
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UsersResponse {
    pub users: Vec<UserRecord>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}
