use chrono::NaiveDateTime;
use sqlx::PgConnection;

use crate::store::NewLedgerRecord;

pub async fn insert(
    conn: &mut PgConnection,
    record: &NewLedgerRecord,
    now: NaiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO order_events (order_number, event_id, event_type, payload, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&record.order_number)
    .bind(&record.event_id)
    .bind(&record.event_type)
    .bind(&record.payload)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}
