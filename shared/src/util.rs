//! Small shared utilities

use chrono::NaiveDateTime;

/// Current UTC wall-clock time, naive (column type for created/updated)
pub fn now_naive() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Generate a new order number: `QR-` plus the first 8 hex chars of a UUIDv4.
///
/// Assigned exactly once per order, before the first durable write.
pub fn order_number() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("QR-{}", &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn order_number_shape() {
        let n = order_number();
        assert!(n.starts_with("QR-"));
        assert_eq!(n.len(), 11);
        assert!(n[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn order_numbers_do_not_collide_cheaply() {
        let set: HashSet<String> = (0..1000).map(|_| order_number()).collect();
        assert_eq!(set.len(), 1000);
    }
}
