use sqlx::SqliteConnection;

use crate::{db, error::Result};

/// Records an admin action. Runs on the caller's connection so the log row
/// commits or rolls back together with the change it describes.
pub async fn record_admin_action(
    conn: &mut SqliteConnection,
    admin_id: i64,
    action_type: &str,
    target_table: &str,
    target_id: i64,
    notes: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO admin_logs (admin_id, action_type, target_table, target_id, timestamp, notes) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(admin_id)
    .bind(action_type)
    .bind(target_table)
    .bind(target_id)
    .bind(db::timestamp())
    .bind(notes)
    .execute(conn)
    .await?;

    tracing::info!(admin_id, action_type, target_table, target_id, "Admin action recorded");
    Ok(())
}
