use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{error::Result, extract::ApiPath, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metrics/npo/:id", get(npo_metrics))
        .route("/donor/:id/metrics", get(donor_metrics))
        .route("/kpis", get(kpis))
}

#[derive(Debug, Serialize)]
pub struct NpoMetrics {
    pub npo_id: i64,
    pub total_donations: i64,
    pub total_pickups: i64,
    pub average_feedback_rating: Option<f64>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecentDonation {
    pub donation_id: i64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub donation_type: Option<String>,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct DonorMetrics {
    pub total_donations: i64,
    pub total_items: i64,
    pub total_value: f64,
    pub recent_donations: Vec<RecentDonation>,
}

#[derive(Debug, Serialize)]
pub struct Kpis {
    pub total_donations: i64,
    pub total_monetary: f64,
    pub total_items_in_kind: i64,
    pub pickups_scheduled: i64,
    pub inventory_total_units: i64,
}

/// Dashboard figures for an NPO.
///
/// Donated items and pickups are counted across the whole system: neither
/// donations nor pickups are linked to a receiving NPO. Only the rating is
/// specific to `id`.
async fn npo_metrics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<NpoMetrics>> {
    let pool = &state.db.pool;

    // "request" donations are NPO asks, not goods received
    let total_donations = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(i.item_quantity), 0)
        FROM donation_item_details i
        JOIN donation_records r ON r.donation_id = i.donation_id
        WHERE COALESCE(r.donation_type, '') != 'request'
        "#,
    )
    .fetch_one(pool)
    .await?;

    let total_pickups = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pickup_scheduling")
        .fetch_one(pool)
        .await?;

    let average_feedback_rating = sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(rating) FROM feedback_reviews WHERE npo_id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(Json(NpoMetrics {
        npo_id: id,
        total_donations,
        total_pickups,
        average_feedback_rating,
    }))
}

async fn donor_metrics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DonorMetrics>> {
    let pool = &state.db.pool;

    let total_donations =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM donation_records WHERE donor_store_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;

    let (total_items, total_value) = sqlx::query_as::<_, (i64, f64)>(
        r#"
        SELECT COALESCE(SUM(i.item_quantity), 0), TOTAL(i.item_value * i.item_quantity)
        FROM donation_item_details i
        JOIN donation_records r ON r.donation_id = i.donation_id
        WHERE r.donor_store_id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    let recent_donations = sqlx::query_as::<_, RecentDonation>(
        r#"
        SELECT donation_id, donation_amount AS amount, donation_type, donation_date AS date
        FROM donation_records
        WHERE donor_store_id = ?
        ORDER BY donation_date DESC, donation_id DESC
        LIMIT 5
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Json(DonorMetrics {
        total_donations,
        total_items,
        total_value,
        recent_donations,
    }))
}

async fn kpis(State(state): State<AppState>) -> Result<Json<Kpis>> {
    let pool = &state.db.pool;

    let (total_donations, total_monetary) = sqlx::query_as::<_, (i64, f64)>(
        "SELECT COUNT(*), TOTAL(donation_amount) FROM donation_records",
    )
    .fetch_one(pool)
    .await?;

    let total_items_in_kind = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(item_quantity), 0) FROM donation_item_details",
    )
    .fetch_one(pool)
    .await?;

    let pickups_scheduled = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pickup_scheduling WHERE status = 'Scheduled'",
    )
    .fetch_one(pool)
    .await?;

    let inventory_total_units =
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(quantity), 0) FROM inventory")
            .fetch_one(pool)
            .await?;

    Ok(Json(Kpis {
        total_donations,
        total_monetary,
        total_items_in_kind,
        pickups_scheduled,
        inventory_total_units,
    }))
}
