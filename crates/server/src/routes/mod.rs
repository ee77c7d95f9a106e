pub mod admin;
pub mod auth;
pub mod centers;
pub mod distribution;
pub mod donations;
pub mod feedback;
pub mod inventory;
pub mod metrics;
pub mod notifications;
pub mod pickups;
pub mod users;

use axum::Router;

use crate::{
    error::{AppError, Result},
    AppState,
};

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/users", users::router())
        .nest("/donations", donations::router())
        .nest("/pickups", pickups::router())
        .nest("/inventory", inventory::router())
        .nest("/centers", centers::router())
        .nest("/feedback", feedback::router())
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
        .merge(distribution::router())
        .merge(metrics::router())
}

/// Treats a missing field and a blank string the same way.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Upper bound for any stored quantity, so aggregate sums stay within `i64`.
pub const MAX_QUANTITY: i64 = i32::MAX as i64;

pub fn check_quantity(field: &str, quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(AppError::Validation(format!("{field} must not be negative")));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::Validation(format!(
            "{field} must not exceed {MAX_QUANTITY}"
        )));
    }
    Ok(())
}
