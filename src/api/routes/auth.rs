use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;
use crate::api::auth::{AdminUser, CurrentUser};
use crate::api::errors::{required, ApiJson};
use crate::api::models::{ModifyUserRequest, SigninRequest, SignupRequest};
use crate::api::AppState;
use crate::auth::{hash_password, verify_password, Role};
use crate::db::{NewUser, User, UserUpdate};
use crate::errors::VulnscanError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/create_admin", post(create_admin))
        .route("/signin", post(signin))
        .route("/get_user", get(get_user))
        .route("/get_users", get(get_users))
        .route("/modify_user/:id", put(modify_user))
        .route("/delete_user/:id", delete(delete_user))
}

fn register(state: &AppState, req: &SignupRequest, role: Role) -> Result<i64, VulnscanError> {
    let username = required(&req.username, "username")?;
    let email = required(&req.email, "email")?;
    let password = required(&req.password, "password")?;
    let password_hash = hash_password(password)?;

    let id = state.db.create_user(&NewUser {
        username,
        email,
        password_hash: &password_hash,
        role,
        comment: req.comment.as_deref(),
    })?;
    info!(user_id = id, username = %username, role = %role, "User registered");
    Ok(id)
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    let id = register(&state, &req, Role::User)?;
    Ok((StatusCode::CREATED, Json(json!({"message": "User created successfully", "user_id": id}))))
}

pub async fn create_admin(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    let id = register(&state, &req, Role::Admin)?;
    Ok((StatusCode::CREATED, Json(json!({"message": "Admin created successfully", "user_id": id}))))
}

pub async fn signin(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SigninRequest>,
) -> Result<Json<Value>, VulnscanError> {
    let email = required(&req.email, "email")?.to_lowercase();
    let password = required(&req.password, "password")?;

    let invalid = || VulnscanError::Authentication("Invalid email or password".into());
    let (user, hash) = state.db.find_user_by_email(&email)?.ok_or_else(invalid)?;
    if !verify_password(password, &hash) {
        return Err(invalid());
    }

    let access_token = state.tokens.issue(user.id, &user.username, user.role)?;
    info!(user_id = user.id, "User signed in");
    Ok(Json(json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": state.tokens.ttl_seconds(),
        "user": user,
    })))
}

pub async fn get_user(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

pub async fn get_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<User>>, VulnscanError> {
    Ok(Json(state.db.list_users()?))
}

fn non_blank(value: Option<&String>, field: &str) -> Result<Option<String>, VulnscanError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(VulnscanError::Validation(format!("{} must not be empty", field))),
        Some(v) => Ok(Some(v.trim().to_string())),
        None => Ok(None),
    }
}

/// Admins may edit anyone; other users only themselves and never their role.
pub async fn modify_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<ModifyUserRequest>,
) -> Result<Json<Value>, VulnscanError> {
    let is_admin = current.is_admin();
    if !is_admin && current.user.id != id {
        return Err(VulnscanError::Permission("Admin access required".into()));
    }

    let role = match req.role.as_deref() {
        Some(raw) => {
            let role: Role = raw.parse()?;
            if !is_admin {
                return Err(VulnscanError::Permission("Only admins can change roles".into()));
            }
            Some(role)
        }
        None => None,
    };

    let password_hash = match non_blank(req.password.as_ref(), "password")? {
        Some(pw) => Some(hash_password(&pw)?),
        None => None,
    };
    let update = UserUpdate {
        username: non_blank(req.username.as_ref(), "username")?,
        email: non_blank(req.email.as_ref(), "email")?,
        password_hash,
        role,
        comment: req.comment,
    };

    let user = state
        .db
        .update_user(id, &update)?
        .ok_or_else(|| VulnscanError::NotFound("User not found".into()))?;
    info!(user_id = id, by = current.user.id, "User updated");
    Ok(Json(json!({"message": "User updated successfully", "user": user})))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, VulnscanError> {
    if !state.db.delete_user(id)? {
        return Err(VulnscanError::NotFound("User not found".into()));
    }
    info!(user_id = id, by = admin.user.id, "User deleted");
    Ok(Json(json!({"message": "User deleted successfully"})))
}
