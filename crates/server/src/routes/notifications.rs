use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{self, models::Notification},
    error::{AppError, Result},
    extract::{ApiJson, ApiQuery},
    routes::non_empty,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_notifications).post(create_notification))
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub sender_role: Option<String>,
    pub recipient_role: Option<String>,
    pub message: Option<String>,
    pub related_item_id: Option<i64>,
    pub notification_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationFilter {
    pub recipient_role: Option<String>,
}

async fn create_notification(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let message = non_empty(&body.message)
        .ok_or_else(|| AppError::Validation("message required".to_string()))?;

    let notification_id = sqlx::query(
        "INSERT INTO notifications (sender_role, recipient_role, message, related_item_id, notification_type, sent_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&body.sender_role)
    .bind(&body.recipient_role)
    .bind(message)
    .bind(body.related_item_id)
    .bind(&body.notification_type)
    .bind(db::timestamp())
    .execute(&state.db.pool)
    .await?
    .last_insert_rowid();

    tracing::info!(notification_id, "Notification created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Notification created",
            "notification_id": notification_id,
        })),
    ))
}

async fn list_notifications(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<NotificationFilter>,
) -> Result<Json<Vec<Notification>>> {
    let rows = sqlx::query_as::<_, Notification>(
        r#"
        SELECT notification_id, sender_role, recipient_role, message, related_item_id, notification_type, sent_at
        FROM notifications
        WHERE ?1 IS NULL OR recipient_role = ?1
        ORDER BY sent_at DESC, notification_id DESC
        "#,
    )
    .bind(non_empty(&filter.recipient_role))
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(rows))
}
