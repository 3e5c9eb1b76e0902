//! Raw query layer. Insert functions take `&mut PgConnection` so the
//! create path can share one transaction across both tables.

pub mod order_events;
pub mod orders;
