//! Order number generation
//!
//! Format: `MKT-YYYYMMDD-NNNN` (UTC date + 4-digit suffix). The suffix is
//! random, so the number alone does not guarantee uniqueness; the UNIQUE
//! index on `orders.order_number` does, and the builder retries on conflict.

use chrono::{DateTime, Utc};
use rand::Rng;

pub const ORDER_NUMBER_PREFIX: &str = "MKT";

/// Attempts the builder makes before giving up on a free number.
pub const MAX_NUMBER_ATTEMPTS: usize = 5;

/// Generate a candidate order number for the given instant.
pub fn generate(now_millis: i64) -> String {
    let date = DateTime::<Utc>::from_timestamp_millis(now_millis)
        .unwrap_or_else(Utc::now)
        .format("%Y%m%d");
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{ORDER_NUMBER_PREFIX}-{date}-{suffix:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_has_prefix_date_and_padded_suffix() {
        // 2026-08-01 12:00:00 UTC
        let number = generate(1_785_585_600_000);
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], ORDER_NUMBER_PREFIX);
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4, "suffix must be zero-padded to 4 digits");
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn number_uses_utc_date_of_the_instant() {
        // 2024-01-01 00:00:00 UTC exactly
        let number = generate(1_704_067_200_000);
        assert!(number.starts_with("MKT-20240101-"));
    }
}
