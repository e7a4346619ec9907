/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms, collision-free at store scale)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Generate a globally unique, sortable order number.
///
/// Format: `ORD` + UTC timestamp (`%Y%m%d%H%M%S%3f`) + 4 hex chars of random
/// suffix. The timestamp makes numbers sortable by creation time; the suffix
/// avoids collisions between orders created in the same millisecond without a
/// coordination service.
pub fn order_number() -> String {
    use rand::Rng;
    let ts = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    let suffix: u16 = rand::thread_rng().gen_range(0..=u16::MAX);
    format!("ORD{}{:04X}", ts, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn order_numbers_are_unique_and_prefixed() {
        let numbers: HashSet<String> = (0..256).map(|_| order_number()).collect();
        assert_eq!(numbers.len(), 256);
        for n in &numbers {
            assert!(n.starts_with("ORD"));
            assert_eq!(n.len(), "ORD".len() + 17 + 4);
        }
    }

    #[test]
    fn snowflake_ids_fit_js_safe_integer() {
        for _ in 0..64 {
            let id = snowflake_id();
            assert!(id > 0);
            assert!(id <= 0x1F_FFFF_FFFF_FFFF); // 2^53 - 1
        }
    }
}
