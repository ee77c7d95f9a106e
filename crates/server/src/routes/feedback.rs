use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{self, models::FeedbackReview},
    error::{AppError, Result},
    extract::{ApiJson, ApiPath, ApiQuery},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_feedback).post(create_feedback))
        .route(
            "/:id",
            get(get_feedback).put(update_feedback).delete(delete_feedback),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub donor_store_id: Option<i64>,
    pub npo_id: Option<i64>,
    pub rating: Option<Value>,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFeedbackRequest {
    pub rating: Option<Value>,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackFilter {
    pub donor_store_id: Option<i64>,
    pub npo_id: Option<i64>,
}

const FEEDBACK_COLUMNS: &str = "review_id, donor_store_id, npo_id, rating, comments, review_date";

/// Accepts an integer rating given as a JSON number or numeric string and
/// checks it lies in 1..=5.
pub fn parse_rating(value: &Value) -> Result<i64> {
    let rating = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AppError::Validation("rating must be integer 1-5".to_string()))?;

    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(rating)
}

async fn create_feedback(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let (Some(npo_id), Some(rating)) = (body.npo_id, body.rating.as_ref()) else {
        return Err(AppError::Validation(
            "npo_id and rating required".to_string(),
        ));
    };
    let rating = parse_rating(rating)?;

    let review_id = sqlx::query(
        "INSERT INTO feedback_reviews (donor_store_id, npo_id, rating, comments, review_date) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(body.donor_store_id)
    .bind(npo_id)
    .bind(rating)
    .bind(body.comments.as_deref().unwrap_or(""))
    .bind(db::timestamp())
    .execute(&state.db.pool)
    .await?
    .last_insert_rowid();

    tracing::info!(review_id, npo_id, rating, "Feedback submitted");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Feedback submitted", "review_id": review_id })),
    ))
}

async fn list_feedback(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<FeedbackFilter>,
) -> Result<Json<Vec<FeedbackReview>>> {
    let rows = sqlx::query_as::<_, FeedbackReview>(&format!(
        r#"
        SELECT {FEEDBACK_COLUMNS}
        FROM feedback_reviews
        WHERE (?1 IS NULL OR donor_store_id = ?1)
          AND (?2 IS NULL OR npo_id = ?2)
        ORDER BY review_date DESC, review_id DESC
        "#
    ))
    .bind(filter.donor_store_id)
    .bind(filter.npo_id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(rows))
}

async fn get_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<FeedbackReview>> {
    let row = sqlx::query_as::<_, FeedbackReview>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback_reviews WHERE review_id = ?"
    ))
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Feedback not found".to_string()))?;

    Ok(Json(row))
}

async fn update_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateFeedbackRequest>,
) -> Result<Json<FeedbackReview>> {
    let rating = body.rating.as_ref().map(parse_rating).transpose()?;

    let result = sqlx::query(
        "UPDATE feedback_reviews SET rating = COALESCE(?, rating), comments = COALESCE(?, comments) WHERE review_id = ?",
    )
    .bind(rating)
    .bind(&body.comments)
    .bind(id)
    .execute(&state.db.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Feedback not found".to_string()));
    }

    tracing::info!(review_id = id, "Feedback updated");

    get_feedback(State(state), ApiPath(id)).await
}

async fn delete_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>> {
    let result = sqlx::query("DELETE FROM feedback_reviews WHERE review_id = ?")
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Feedback not found".to_string()));
    }

    tracing::info!(review_id = id, "Feedback deleted");

    Ok(Json(json!({ "message": "Feedback deleted", "review_id": id })))
}
