use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{
    db::{self, models::Role},
    error::{AppError, Result},
    extract::ApiJson,
    middleware::auth::AuthUser,
    routes::non_empty,
    services::credentials::{create_token, hash_password, verify_password},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Splits a display name into the donor profile's first and last name.
fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

async fn register(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let (Some(name), Some(email), Some(password), Some(role)) = (
        non_empty(&body.name),
        non_empty(&body.email),
        body.password.as_deref().filter(|p| !p.is_empty()),
        non_empty(&body.role),
    ) else {
        return Err(AppError::Validation(
            "Missing required fields (name, email, password, role)".to_string(),
        ));
    };

    let role: Role = role.parse().map_err(|_| {
        AppError::Validation("Invalid role. Allowed: donor, npo, admin".to_string())
    })?;
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    // The first admin bootstraps itself; later ones need an admin's token
    if role == Role::Admin && !caller.as_ref().is_some_and(AuthUser::is_admin) {
        let admins =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'admin'")
                .fetch_one(&state.db.pool)
                .await?;
        if admins > 0 {
            return Err(AppError::Forbidden(
                "Only an admin can register another admin".to_string(),
            ));
        }
    }

    // Check if user already exists
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(&state.db.pool)
        .await?;

    if existing > 0 {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(password)?;
    let now = db::timestamp();

    // User and profile stub are created together
    let mut tx = state.db.pool.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(&now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    match role {
        Role::Donor => {
            let (first_name, last_name) = split_name(name);
            sqlx::query(
                "INSERT INTO donor_store_profiles (donor_store_id, first_name, last_name, email, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        Role::Npo => {
            sqlx::query(
                "INSERT INTO npo_profiles (npo_id, npo_name, email, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(name)
            .bind(email)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        Role::Admin => {}
    }

    tx.commit().await?;

    tracing::info!(user_id, role = %role, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registered",
            user_id,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (
        non_empty(&body.email),
        body.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation("Missing credentials".to_string()));
    };

    let user = sqlx::query_as::<_, db::models::User>(
        "SELECT user_id, name, email, password_hash, role, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(&state.db.pool)
    .await?;

    let Some(user) = user else {
        tracing::warn!("Login attempt for unknown email");
        return Err(AppError::Unauthorized);
    };

    if !verify_password(password, &user.password_hash)? {
        tracing::warn!(user_id = user.user_id, "Login attempt with wrong password");
        return Err(AppError::Unauthorized);
    }

    let role: Role = user
        .role
        .parse()
        .map_err(|_| AppError::Internal(format!("Unknown role stored: {}", user.role)))?;

    let token = create_token(
        user.user_id,
        &user.email,
        &user.name,
        role,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    Ok(Json(LoginResponse {
        message: "OK",
        user: UserSummary {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            role: user.role,
        },
        token,
    }))
}
