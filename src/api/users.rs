use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::auth::{self, AuthUser};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidArgument(
            "email and password are required".into(),
        ));
    }

    let user = state
        .db
        .get_user_by_email(req.email.trim())?
        .ok_or_else(|| ApiError::Unauthenticated("invalid credentials".into()))?;

    // A user with no stored credential can never log in.
    let verified = user
        .password_hash
        .as_deref()
        .is_some_and(|hash| auth::verify_password(&req.password, hash));
    if !verified {
        return Err(ApiError::Unauthenticated("invalid credentials".into()));
    }

    let token = state.signer.issue(user.id).map_err(|err| {
        tracing::error!("issue token: {err}");
        ApiError::Internal("failed to issue token".into())
    })?;

    Ok(Json(json!({
        "token": token,
        "user": {
            "id": user.id,
            "first_name": user.first_name,
            "last_name": user.last_name.unwrap_or_default(),
            "role": user.role.unwrap_or_default(),
        }
    })))
}

pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let users = state.db.list_users()?;
    Ok(Json(json!({ "users": users })))
}
