use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    db::models::{Role, User},
    error::AppError,
    services::credentials::decode_token,
    AppState,
};

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may act on any account; everyone else only on their own.
    pub fn ensure_can_manage(&self, user_id: i64) -> Result<(), AppError> {
        if self.is_admin() || self.id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only an admin or the account owner can do this".to_string(),
            ))
        }
    }
}

// Extractor for the caller identified by the `Authorization: Bearer` token
#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let claims = decode_token(bearer.token(), &state.config.jwt_secret)?;

        // The account must still exist; its current role wins over the token's
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, password_hash, role, created_at FROM users WHERE user_id = ?",
        )
        .bind(claims.sub)
        .fetch_optional(&state.db.pool)
        .await?
        .ok_or_else(|| {
            tracing::warn!(user_id = claims.sub, "Token presented for a deleted account");
            AppError::Unauthorized
        })?;

        let role: Role = user
            .role
            .parse()
            .map_err(|_| AppError::Internal(format!("Unknown role stored: {}", user.role)))?;

        Ok(AuthUser {
            id: user.user_id,
            email: user.email,
            name: user.name,
            role,
        })
    }
}

/// An authenticated caller holding the admin role.
#[derive(Clone, Debug)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}
