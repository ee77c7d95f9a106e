use axum::{extract::State, routing::get, Json, Router};

use crate::{
    db::models::AdminLog, error::Result, middleware::auth::AdminUser, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/logs", get(list_logs))
}

async fn list_logs(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<AdminLog>>> {
    let logs = sqlx::query_as::<_, AdminLog>(
        "SELECT log_id, admin_id, action_type, target_table, target_id, timestamp, notes FROM admin_logs ORDER BY timestamp DESC, log_id DESC",
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(logs))
}
