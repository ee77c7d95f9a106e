use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    db::models::{Pickup, PickupStatus},
    error::{AppError, Result},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::non_empty,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pickups).post(schedule_pickup))
        .route("/:id", get(list_pickups_for_donor).delete(delete_pickup))
        .route("/:id/status", put(update_status))
}

#[derive(Debug, Deserialize)]
pub struct SchedulePickupRequest {
    pub donor_store_id: Option<i64>,
    pub donor_id: Option<i64>,
    pub scheduled_date: Option<String>,
    pub pickup_address: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PickupFilter {
    pub donor_store_id: Option<i64>,
}

const STORED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses the date formats clients send for a pickup: a bare date, a local
/// date-time (with `T` or a space, seconds and fraction optional), or an
/// RFC 3339 timestamp, which is converted to UTC.
pub fn parse_scheduled_date(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

async fn schedule_pickup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SchedulePickupRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let raw_date = non_empty(&body.scheduled_date)
        .ok_or_else(|| AppError::Validation("scheduled_date required".to_string()))?;
    let scheduled = parse_scheduled_date(raw_date).ok_or_else(|| {
        AppError::Validation(
            "scheduled_date must be ISO format (YYYY-MM-DD or full ISO datetime)".to_string(),
        )
    })?;

    let donor_store_id = body.donor_store_id.or(body.donor_id);

    let pickup_id = sqlx::query(
        "INSERT INTO pickup_scheduling (donor_store_id, scheduled_date, pickup_address, contact_person, contact_phone, status) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(donor_store_id)
    .bind(scheduled.format(STORED_FORMAT).to_string())
    .bind(&body.pickup_address)
    .bind(&body.contact_person)
    .bind(&body.contact_phone)
    .bind(PickupStatus::Scheduled.as_str())
    .execute(&state.db.pool)
    .await?
    .last_insert_rowid();

    tracing::info!(pickup_id, ?donor_store_id, "Pickup scheduled");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Pickup scheduled", "pickup_id": pickup_id })),
    ))
}

async fn fetch_pickups(state: &AppState, donor_store_id: Option<i64>) -> Result<Vec<Pickup>> {
    let pickups = sqlx::query_as::<_, Pickup>(
        r#"
        SELECT pickup_id, donor_store_id, scheduled_date, pickup_address, contact_person, contact_phone, status
        FROM pickup_scheduling
        WHERE ?1 IS NULL OR donor_store_id = ?1
        ORDER BY scheduled_date DESC, pickup_id DESC
        "#,
    )
    .bind(donor_store_id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(pickups)
}

async fn list_pickups(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PickupFilter>,
) -> Result<Json<Vec<Pickup>>> {
    Ok(Json(fetch_pickups(&state, filter.donor_store_id).await?))
}

async fn list_pickups_for_donor(
    State(state): State<AppState>,
    ApiPath(donor_id): ApiPath<i64>,
) -> Result<Json<Vec<Pickup>>> {
    Ok(Json(fetch_pickups(&state, Some(donor_id)).await?))
}

/// Moves a pickup from `from` to `to` only if it is still in `from`.
async fn compare_and_set_status(
    pool: &SqlitePool,
    id: i64,
    from: PickupStatus,
    to: PickupStatus,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE pickup_scheduling SET status = ? WHERE pickup_id = ? AND status = ?",
    )
    .bind(to.as_str())
    .bind(id)
    .bind(from.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Pickup status was changed by another request".to_string(),
        ));
    }
    Ok(())
}

async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Value>> {
    let requested = non_empty(&body.status)
        .ok_or_else(|| AppError::Validation("status required".to_string()))?;
    let next: PickupStatus = requested.parse().map_err(|_| {
        AppError::Validation("status must be one of Scheduled, Completed, Cancelled".to_string())
    })?;

    let current = sqlx::query_scalar::<_, String>(
        "SELECT status FROM pickup_scheduling WHERE pickup_id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Pickup not found".to_string()))?;

    let current_status: PickupStatus = current
        .parse()
        .map_err(|_| AppError::Internal(format!("Unknown pickup status stored: {current}")))?;

    if !current_status.can_transition_to(next) {
        tracing::warn!(pickup_id = id, from = %current_status, to = %next, "Rejected pickup transition");
        return Err(AppError::Conflict(format!(
            "Cannot change pickup status from {current_status} to {next}"
        )));
    }

    compare_and_set_status(&state.db.pool, id, current_status, next).await?;

    tracing::info!(pickup_id = id, from = %current_status, to = %next, "Pickup status updated");

    Ok(Json(json!({
        "message": "Updated",
        "pickup_id": id,
        "status": next.as_str(),
    })))
}

async fn delete_pickup(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>> {
    let result = sqlx::query("DELETE FROM pickup_scheduling WHERE pickup_id = ?")
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Pickup not found".to_string()));
    }

    tracing::info!(pickup_id = id, "Pickup deleted");

    Ok(Json(json!({ "message": "Pickup deleted", "pickup_id": id })))
}
