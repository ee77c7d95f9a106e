use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{self, models::DistributionCenter},
    error::{AppError, Result},
    extract::{ApiJson, ApiPath},
    routes::non_empty,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_centers).post(create_center))
        .route(
            "/:id",
            get(get_center).put(update_center).delete(delete_center),
        )
}

#[derive(Debug, Deserialize)]
pub struct CenterRequest {
    pub center_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
}

const CENTER_COLUMNS: &str = "center_id, center_name, address, city, state, zip_code, country, contact_person, contact_phone, created_at";

async fn create_center(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CenterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let center_name = non_empty(&body.center_name)
        .ok_or_else(|| AppError::Validation("center_name required".to_string()))?;

    let center_id = sqlx::query(
        "INSERT INTO distribution_centers (center_name, address, city, state, zip_code, country, contact_person, contact_phone, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(center_name)
    .bind(&body.address)
    .bind(&body.city)
    .bind(&body.state)
    .bind(&body.zip_code)
    .bind(&body.country)
    .bind(&body.contact_person)
    .bind(&body.contact_phone)
    .bind(db::timestamp())
    .execute(&state.db.pool)
    .await?
    .last_insert_rowid();

    tracing::info!(center_id, "Distribution center created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Center created", "center_id": center_id })),
    ))
}

async fn list_centers(State(state): State<AppState>) -> Result<Json<Vec<DistributionCenter>>> {
    let centers = sqlx::query_as::<_, DistributionCenter>(&format!(
        "SELECT {CENTER_COLUMNS} FROM distribution_centers ORDER BY created_at DESC, center_id DESC"
    ))
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(centers))
}

async fn get_center(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DistributionCenter>> {
    let center = sqlx::query_as::<_, DistributionCenter>(&format!(
        "SELECT {CENTER_COLUMNS} FROM distribution_centers WHERE center_id = ?"
    ))
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Center not found".to_string()))?;

    Ok(Json(center))
}

async fn update_center(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<CenterRequest>,
) -> Result<Json<DistributionCenter>> {
    let result = sqlx::query(
        r#"
        UPDATE distribution_centers SET
            center_name = COALESCE(?, center_name),
            address = COALESCE(?, address),
            city = COALESCE(?, city),
            state = COALESCE(?, state),
            zip_code = COALESCE(?, zip_code),
            country = COALESCE(?, country),
            contact_person = COALESCE(?, contact_person),
            contact_phone = COALESCE(?, contact_phone)
        WHERE center_id = ?
        "#,
    )
    .bind(non_empty(&body.center_name))
    .bind(&body.address)
    .bind(&body.city)
    .bind(&body.state)
    .bind(&body.zip_code)
    .bind(&body.country)
    .bind(&body.contact_person)
    .bind(&body.contact_phone)
    .bind(id)
    .execute(&state.db.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Center not found".to_string()));
    }

    tracing::info!(center_id = id, "Distribution center updated");

    get_center(State(state), ApiPath(id)).await
}

async fn delete_center(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>> {
    // Inventory, distributed items and their confirmations cascade
    let result = sqlx::query("DELETE FROM distribution_centers WHERE center_id = ?")
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Center not found".to_string()));
    }

    tracing::info!(center_id = id, "Distribution center deleted");

    Ok(Json(json!({ "message": "Center deleted", "center_id": id })))
}
