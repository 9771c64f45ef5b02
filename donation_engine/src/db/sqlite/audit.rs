use sqlx::SqliteConnection;

use crate::{
    db_types::{ActivityEntry, NewActivityEntry},
    traits::LedgerError,
};

pub async fn insert_activity(entry: NewActivityEntry, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
            INSERT INTO activity_log (actor_id, action, entity_type, entity_id, metadata, ip, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7);
        "#,
    )
    .bind(entry.actor_id)
    .bind(entry.action)
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.metadata.to_string())
    .bind(entry.ip)
    .bind(entry.user_agent)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_activity_for_entity(
    entity_type: &str,
    entity_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<ActivityEntry>, LedgerError> {
    let entries = sqlx::query_as(
        "SELECT * FROM activity_log WHERE entity_type = $1 AND entity_id = $2 ORDER BY created_at ASC",
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_all(conn)
    .await?;
    Ok(entries)
}
