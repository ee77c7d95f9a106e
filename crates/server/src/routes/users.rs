use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    db::{
        self,
        models::{DonorProfile, NpoProfile, Role, User},
    },
    error::{AppError, Result},
    extract::{ApiJson, ApiPath},
    middleware::auth::{AdminUser, AuthUser},
    routes::non_empty,
    services::audit::record_admin_action,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Donor(DonorProfile),
    Npo(NpoProfile),
    Empty {},
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

async fn fetch_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        "SELECT user_id, name, email, password_hash, role, created_at FROM users WHERE user_id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

async fn load_user_detail(pool: &SqlitePool, id: i64) -> Result<UserDetail> {
    let user = fetch_user(pool, id).await?;

    let profile = match user.role.parse::<Role>() {
        Ok(Role::Donor) => sqlx::query_as::<_, DonorProfile>(
            "SELECT * FROM donor_store_profiles WHERE donor_store_id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Profile::Donor),
        Ok(Role::Npo) => {
            sqlx::query_as::<_, NpoProfile>("SELECT * FROM npo_profiles WHERE npo_id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?
                .map(Profile::Npo)
        }
        _ => None,
    };

    Ok(UserDetail {
        user_id: user.user_id,
        name: user.name,
        email: user.email,
        role: user.role,
        created_at: user.created_at,
        profile: profile.unwrap_or(Profile::Empty {}),
    })
}

async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<User>>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT user_id, name, email, password_hash, role, created_at FROM users ORDER BY user_id ASC",
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserDetail>> {
    Ok(Json(load_user_detail(&state.db.pool, id).await?))
}

async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserDetail>> {
    caller.ensure_can_manage(id)?;
    let user = fetch_user(&state.db.pool, id).await?;

    let name = non_empty(&body.name);
    let email = non_empty(&body.email);

    if let Some(email) = email {
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }
        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = ? AND user_id != ?",
        )
        .bind(email)
        .bind(id)
        .fetch_one(&state.db.pool)
        .await?;
        if taken > 0 {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
    }

    let now = db::timestamp();
    let mut tx = state.db.pool.begin().await?;

    sqlx::query(
        "UPDATE users SET name = COALESCE(?, name), email = COALESCE(?, email) WHERE user_id = ?",
    )
    .bind(name)
    .bind(email)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    match user.role.parse::<Role>() {
        Ok(Role::Donor) => {
            let (first_name, last_name) = match name {
                Some(name) => {
                    let mut parts = name.split_whitespace();
                    let first = parts.next().map(str::to_string);
                    let last = Some(parts.collect::<Vec<_>>().join(" "));
                    (first, last)
                }
                None => (None, None),
            };
            sqlx::query(
                r#"
                UPDATE donor_store_profiles SET
                    first_name = COALESCE(?, first_name),
                    last_name = COALESCE(?, last_name),
                    email = COALESCE(?, email),
                    phone_number = COALESCE(?, phone_number),
                    address = COALESCE(?, address),
                    city = COALESCE(?, city),
                    state = COALESCE(?, state),
                    zip_code = COALESCE(?, zip_code),
                    country = COALESCE(?, country),
                    updated_at = ?
                WHERE donor_store_id = ?
                "#,
            )
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(&body.phone_number)
            .bind(&body.address)
            .bind(&body.city)
            .bind(&body.state)
            .bind(&body.zip_code)
            .bind(&body.country)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        Ok(Role::Npo) => {
            sqlx::query(
                r#"
                UPDATE npo_profiles SET
                    npo_name = COALESCE(?, npo_name),
                    email = COALESCE(?, email),
                    phone_number = COALESCE(?, phone_number),
                    address = COALESCE(?, address),
                    city = COALESCE(?, city),
                    state = COALESCE(?, state),
                    zip_code = COALESCE(?, zip_code),
                    country = COALESCE(?, country),
                    updated_at = ?
                WHERE npo_id = ?
                "#,
            )
            .bind(name)
            .bind(email)
            .bind(&body.phone_number)
            .bind(&body.address)
            .bind(&body.city)
            .bind(&body.state)
            .bind(&body.zip_code)
            .bind(&body.country)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        _ => {}
    }

    if caller.is_admin() {
        record_admin_action(&mut *tx, caller.id, "UPDATE", "users", id, None).await?;
    }

    tx.commit().await?;

    tracing::info!(user_id = id, by = caller.id, "Updated user");

    Ok(Json(load_user_detail(&state.db.pool, id).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>> {
    caller.ensure_can_manage(id)?;
    let user = fetch_user(&state.db.pool, id).await?;

    let history_conflict = || {
        AppError::Conflict(
            "User has donation, pickup or feedback history and cannot be deleted".to_string(),
        )
    };

    let mut tx = state.db.pool.begin().await?;

    // Donation, pickup and feedback history must not be orphaned
    let history = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM donation_records WHERE donor_store_id = ?1)
          + (SELECT COUNT(*) FROM pickup_scheduling WHERE donor_store_id = ?1)
          + (SELECT COUNT(*) FROM feedback_reviews WHERE donor_store_id = ?1 OR npo_id = ?1)
        "#,
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if history > 0 {
        return Err(history_conflict());
    }

    if caller.is_admin() {
        let note = format!("Deleted {} account {}", user.role, user.email);
        record_admin_action(&mut *tx, caller.id, "DELETE", "users", id, Some(&note)).await?;
    }

    // Profiles cascade; history added since the check trips the restrict keys
    sqlx::query("DELETE FROM users WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Validation(_) => history_conflict(),
            other => other,
        })?;

    tx.commit().await?;

    tracing::info!(user_id = id, by = caller.id, "Deleted user");

    Ok(Json(json!({ "message": "User deleted", "user_id": id })))
}
