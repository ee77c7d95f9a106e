use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{self, models::InventoryItem},
    error::{AppError, Result},
    extract::{ApiJson, ApiPath},
    routes::{check_quantity, non_empty},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory).post(create_inventory))
        .route(
            "/:id",
            get(get_inventory).put(update_inventory).delete(delete_inventory),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateInventoryRequest {
    pub center_id: Option<i64>,
    pub item_name: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInventoryRequest {
    pub center_id: Option<i64>,
    pub item_name: Option<String>,
    pub quantity: Option<i64>,
}

const INVENTORY_SELECT: &str = r#"
    SELECT i.inventory_id, i.center_id, c.center_name, i.item_name, i.quantity, i.last_updated
    FROM inventory i
    LEFT JOIN distribution_centers c ON c.center_id = i.center_id
"#;

async fn list_inventory(State(state): State<AppState>) -> Result<Json<Vec<InventoryItem>>> {
    let rows = sqlx::query_as::<_, InventoryItem>(&format!(
        "{INVENTORY_SELECT} ORDER BY i.inventory_id ASC"
    ))
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(rows))
}

async fn get_inventory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<InventoryItem>> {
    let row = sqlx::query_as::<_, InventoryItem>(&format!(
        "{INVENTORY_SELECT} WHERE i.inventory_id = ?"
    ))
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Inventory item not found".to_string()))?;

    Ok(Json(row))
}

async fn create_inventory(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateInventoryRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let (Some(center_id), Some(item_name)) = (body.center_id, non_empty(&body.item_name)) else {
        return Err(AppError::Validation(
            "center_id and item_name required".to_string(),
        ));
    };
    let quantity = body.quantity.unwrap_or(0);
    check_quantity("quantity", quantity)?;

    let inventory_id = sqlx::query(
        "INSERT INTO inventory (center_id, item_name, quantity, last_updated) VALUES (?, ?, ?, ?)",
    )
    .bind(center_id)
    .bind(item_name)
    .bind(quantity)
    .bind(db::timestamp())
    .execute(&state.db.pool)
    .await?
    .last_insert_rowid();

    tracing::info!(inventory_id, center_id, "Inventory created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Inventory created", "inventory_id": inventory_id })),
    ))
}

async fn update_inventory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateInventoryRequest>,
) -> Result<Json<InventoryItem>> {
    if let Some(quantity) = body.quantity {
        check_quantity("quantity", quantity)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE inventory SET
            center_id = COALESCE(?, center_id),
            item_name = COALESCE(?, item_name),
            quantity = COALESCE(?, quantity),
            last_updated = ?
        WHERE inventory_id = ?
        "#,
    )
    .bind(body.center_id)
    .bind(non_empty(&body.item_name))
    .bind(body.quantity)
    .bind(db::timestamp())
    .bind(id)
    .execute(&state.db.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Inventory item not found".to_string()));
    }

    tracing::info!(inventory_id = id, "Inventory updated");

    get_inventory(State(state), ApiPath(id)).await
}

async fn delete_inventory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>> {
    let result = sqlx::query("DELETE FROM inventory WHERE inventory_id = ?")
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Inventory item not found".to_string()));
    }

    tracing::info!(inventory_id = id, "Inventory deleted");

    Ok(Json(json!({ "message": "Inventory deleted", "inventory_id": id })))
}
