use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool};

use shared::models::Order;

use crate::store::NewOrder;

pub async fn insert(
    conn: &mut PgConnection,
    order: &NewOrder,
    now: NaiveDateTime,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (
            order_number, username, customer_name, customer_email, customer_phone,
            delivery_address_line1, delivery_address_line2, delivery_address_city,
            delivery_address_state, delivery_address_zip_code, delivery_address_country,
            status, comments, total_price, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
        RETURNING *
        "#,
    )
    .bind(&order.order_number)
    .bind(&order.username)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.delivery_address_line1)
    .bind(&order.delivery_address_line2)
    .bind(&order.delivery_address_city)
    .bind(&order.delivery_address_state)
    .bind(&order.delivery_address_zip_code)
    .bind(&order.delivery_address_country)
    .bind(&order.status)
    .bind(&order.comments)
    .bind(order.total_price)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY id DESC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await
}

pub async fn update_status(
    pool: &PgPool,
    id: i64,
    status: &str,
    now: NaiveDateTime,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(now)
    .fetch_optional(pool)
    .await
}
