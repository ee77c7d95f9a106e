use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    db::{
        self,
        models::{DeliveryConfirmation, DistributedItem},
    },
    error::{AppError, Result},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::{check_quantity, non_empty},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/distributed_items",
            get(list_distributed_items).post(create_distributed_item),
        )
        .route("/deliveries/:npo_id", get(list_deliveries))
        .route(
            "/delivery_confirmations",
            get(list_confirmations).post(create_confirmation),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateDistributedItemRequest {
    pub center_id: Option<i64>,
    pub item_name: Option<String>,
    pub item_quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateConfirmationRequest {
    pub distribution_id: Option<i64>,
    pub received_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationFilter {
    pub distribution_id: Option<i64>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Delivery {
    pub delivery_id: i64,
    pub center_id: Option<i64>,
    pub center_name: Option<String>,
    pub item_name: String,
    pub quantity: i64,
    pub distribution_date: String,
    pub confirmed: bool,
}

async fn create_distributed_item(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateDistributedItemRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let (Some(center_id), Some(item_name)) = (body.center_id, non_empty(&body.item_name)) else {
        return Err(AppError::Validation(
            "center_id and item_name required".to_string(),
        ));
    };
    let item_quantity = body.item_quantity.unwrap_or(0);
    check_quantity("item_quantity", item_quantity)?;

    let distribution_id = sqlx::query(
        "INSERT INTO distributed_items (center_id, item_name, item_quantity, distribution_date) VALUES (?, ?, ?, ?)",
    )
    .bind(center_id)
    .bind(item_name)
    .bind(item_quantity)
    .bind(db::timestamp())
    .execute(&state.db.pool)
    .await?
    .last_insert_rowid();

    tracing::info!(distribution_id, center_id, "Distributed item created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Distributed item created",
            "distribution_id": distribution_id,
        })),
    ))
}

async fn list_distributed_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<DistributedItem>>> {
    let rows = sqlx::query_as::<_, DistributedItem>(
        "SELECT distribution_id, center_id, item_name, item_quantity, distribution_date FROM distributed_items ORDER BY distribution_date DESC, distribution_id DESC",
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(rows))
}

/// Deliveries shown on an NPO dashboard.
///
/// Distributed items carry no link to an NPO, so every distributed item is
/// returned regardless of `npo_id`.
async fn list_deliveries(
    State(state): State<AppState>,
    ApiPath(npo_id): ApiPath<i64>,
) -> Result<Json<Vec<Delivery>>> {
    tracing::debug!(npo_id, "Listing deliveries (not scoped to NPO)");

    let rows = sqlx::query_as::<_, Delivery>(
        r#"
        SELECT
            d.distribution_id AS delivery_id,
            d.center_id,
            c.center_name,
            d.item_name,
            d.item_quantity AS quantity,
            d.distribution_date,
            EXISTS (
                SELECT 1 FROM delivery_confirmations dc WHERE dc.distribution_id = d.distribution_id
            ) AS confirmed
        FROM distributed_items d
        LEFT JOIN distribution_centers c ON c.center_id = d.center_id
        ORDER BY d.distribution_date DESC, d.distribution_id DESC
        "#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(rows))
}

async fn create_confirmation(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateConfirmationRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let distribution_id = body
        .distribution_id
        .ok_or_else(|| AppError::Validation("distribution_id required".to_string()))?;

    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM distributed_items WHERE distribution_id = ?",
    )
    .bind(distribution_id)
    .fetch_one(&state.db.pool)
    .await?;

    if exists == 0 {
        return Err(AppError::NotFound("Distributed item not found".to_string()));
    }

    let confirmation_id = sqlx::query(
        "INSERT INTO delivery_confirmations (distribution_id, received_by, received_date, notes) VALUES (?, ?, ?, ?)",
    )
    .bind(distribution_id)
    .bind(&body.received_by)
    .bind(db::timestamp())
    .bind(&body.notes)
    .execute(&state.db.pool)
    .await?
    .last_insert_rowid();

    tracing::info!(confirmation_id, distribution_id, "Delivery confirmed");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Delivery confirmed",
            "confirmation_id": confirmation_id,
        })),
    ))
}

async fn list_confirmations(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ConfirmationFilter>,
) -> Result<Json<Vec<DeliveryConfirmation>>> {
    let rows = sqlx::query_as::<_, DeliveryConfirmation>(
        r#"
        SELECT confirmation_id, distribution_id, received_by, received_date, notes
        FROM delivery_confirmations
        WHERE ?1 IS NULL OR distribution_id = ?1
        ORDER BY received_date DESC, confirmation_id DESC
        "#,
    )
    .bind(filter.distribution_id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(rows))
}
