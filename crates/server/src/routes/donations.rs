use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqliteConnection;

use crate::{
    db::{
        self,
        models::{DonationItem, DonationRecord},
    },
    error::{AppError, Result},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::{check_quantity, non_empty},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_donations).post(create_donation))
        .route("/:id", put(update_donation).delete(delete_donation))
        .route("/:id/items", post(add_donation_item))
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub item_quantity: Option<i64>,
    pub item_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDonationRequest {
    pub donor_store_id: Option<i64>,
    pub donation_amount: Option<f64>,
    pub donation_type: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDonationRequest {
    pub donor_store_id: Option<i64>,
    pub donation_amount: Option<f64>,
    pub donation_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DonationFilter {
    pub donor_store_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreatedItem {
    pub item_id: i64,
    pub item_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateDonationResponse {
    pub message: &'static str,
    pub donation_id: i64,
    pub items_created: Vec<CreatedItem>,
}

#[derive(Debug, Serialize)]
pub struct DonationResponse {
    #[serde(flatten)]
    pub record: DonationRecord,
    pub items: Vec<DonationItem>,
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::Validation(
            "donation_amount must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

async fn insert_item(
    conn: &mut SqliteConnection,
    donation_id: i64,
    item: &ItemRequest,
) -> Result<CreatedItem> {
    let item_name = non_empty(&item.item_name)
        .ok_or_else(|| AppError::Validation("item_name required".to_string()))?;
    let quantity = item.item_quantity.unwrap_or(0);
    let value = item.item_value.unwrap_or(0.0);
    check_quantity("item_quantity", quantity)?;
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(
            "item_value must not be negative".to_string(),
        ));
    }

    let item_id = sqlx::query(
        "INSERT INTO donation_item_details (donation_id, item_name, item_description, item_quantity, item_value) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(donation_id)
    .bind(item_name)
    .bind(&item.item_description)
    .bind(quantity)
    .bind(value)
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(CreatedItem {
        item_id,
        item_name: item_name.to_string(),
    })
}

async fn create_donation(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateDonationRequest>,
) -> Result<(StatusCode, Json<CreateDonationResponse>)> {
    let amount = body.donation_amount.unwrap_or(0.0);
    validate_amount(amount)?;
    let donation_type = non_empty(&body.donation_type).unwrap_or("item");

    // Record and items commit or fail as one unit
    let mut tx = state.db.pool.begin().await?;

    let donation_id = sqlx::query(
        "INSERT INTO donation_records (donor_store_id, donation_date, donation_amount, donation_type, notes) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(body.donor_store_id)
    .bind(db::timestamp())
    .bind(amount)
    .bind(donation_type)
    .bind(&body.notes)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let mut items_created = Vec::with_capacity(body.items.len());
    for item in &body.items {
        items_created.push(insert_item(&mut tx, donation_id, item).await?);
    }

    tx.commit().await?;

    tracing::info!(
        donation_id,
        items = items_created.len(),
        "Donation created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateDonationResponse {
            message: "Donation created",
            donation_id,
            items_created,
        }),
    ))
}

async fn list_donations(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<DonationFilter>,
) -> Result<Json<Vec<DonationResponse>>> {
    let records = sqlx::query_as::<_, DonationRecord>(
        r#"
        SELECT donation_id, donor_store_id, donation_date, donation_amount, donation_type, notes
        FROM donation_records
        WHERE ?1 IS NULL OR donor_store_id = ?1
        ORDER BY donation_date DESC, donation_id DESC
        "#,
    )
    .bind(filter.donor_store_id)
    .fetch_all(&state.db.pool)
    .await?;

    let items = sqlx::query_as::<_, DonationItem>(
        r#"
        SELECT i.item_id, i.donation_id, i.item_name, i.item_description, i.item_quantity, i.item_value
        FROM donation_item_details i
        JOIN donation_records r ON r.donation_id = i.donation_id
        WHERE ?1 IS NULL OR r.donor_store_id = ?1
        ORDER BY i.item_id ASC
        "#,
    )
    .bind(filter.donor_store_id)
    .fetch_all(&state.db.pool)
    .await?;

    let mut items_by_donation: HashMap<i64, Vec<DonationItem>> = HashMap::new();
    for item in items {
        items_by_donation
            .entry(item.donation_id)
            .or_default()
            .push(item);
    }

    let donations = records
        .into_iter()
        .map(|record| DonationResponse {
            items: items_by_donation
                .remove(&record.donation_id)
                .unwrap_or_default(),
            record,
        })
        .collect();

    Ok(Json(donations))
}

async fn fetch_donation(conn: &mut SqliteConnection, id: i64) -> Result<DonationRecord> {
    sqlx::query_as::<_, DonationRecord>(
        "SELECT donation_id, donor_store_id, donation_date, donation_amount, donation_type, notes FROM donation_records WHERE donation_id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Donation not found".to_string()))
}

async fn update_donation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateDonationRequest>,
) -> Result<Json<DonationResponse>> {
    if let Some(amount) = body.donation_amount {
        validate_amount(amount)?;
    }

    let mut conn = state.db.pool.acquire().await?;

    let result = sqlx::query(
        r#"
        UPDATE donation_records SET
            donor_store_id = COALESCE(?, donor_store_id),
            donation_amount = COALESCE(?, donation_amount),
            donation_type = COALESCE(?, donation_type),
            notes = COALESCE(?, notes)
        WHERE donation_id = ?
        "#,
    )
    .bind(body.donor_store_id)
    .bind(body.donation_amount)
    .bind(non_empty(&body.donation_type))
    .bind(&body.notes)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Donation not found".to_string()));
    }

    let record = fetch_donation(&mut conn, id).await?;
    let items = sqlx::query_as::<_, DonationItem>(
        "SELECT item_id, donation_id, item_name, item_description, item_quantity, item_value FROM donation_item_details WHERE donation_id = ? ORDER BY item_id ASC",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    tracing::info!(donation_id = id, "Donation updated");

    Ok(Json(DonationResponse { record, items }))
}

async fn delete_donation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>> {
    // Items cascade with the record
    let result = sqlx::query("DELETE FROM donation_records WHERE donation_id = ?")
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Donation not found".to_string()));
    }

    tracing::info!(donation_id = id, "Donation deleted");

    Ok(Json(json!({ "message": "Donation deleted", "donation_id": id })))
}

async fn add_donation_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ItemRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let mut conn = state.db.pool.acquire().await?;
    fetch_donation(&mut conn, id).await?;

    let created = insert_item(&mut conn, id, &body).await?;

    tracing::info!(donation_id = id, item_id = created.item_id, "Donation item added");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Item added", "item_id": created.item_id })),
    ))
}
