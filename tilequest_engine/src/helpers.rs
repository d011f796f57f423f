//! Helpers Module
//!
//! Small functions shared by several components that don't clearly belong in one of them.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;

/// A generator seeded from the operating system. Used as the serde default for skipped rng fields.
pub fn os_rng() -> StdRng {
    StdRng::from_os_rng()
}

/// A reproducible generator when `seed` is given, otherwise [`os_rng`].
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(os_rng, StdRng::seed_from_u64)
}

/// Read an unsigned integer field out of raw data, for use in cleaners.
pub fn raw_u64(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}

/// Read a signed integer field out of raw data, for use in cleaners.
pub fn raw_i64(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(Value::as_i64)
}

/// Length of an array field in raw data; zero when absent or not an array.
pub fn raw_len(value: &Value, key: &str) -> usize {
    value.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use serde_json::json;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = seeded_rng(Some(7));
        let mut b = seeded_rng(Some(7));
        let left: Vec<u32> = (0..4).map(|_| a.random()).collect();
        let right: Vec<u32> = (0..4).map(|_| b.random()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn raw_readers_tolerate_missing_fields() {
        let data = json!({"x": -1, "n": 3, "list": [1, 2]});
        assert_eq!(raw_i64(&data, "x"), Some(-1));
        assert_eq!(raw_u64(&data, "x"), None);
        assert_eq!(raw_u64(&data, "n"), Some(3));
        assert_eq!(raw_len(&data, "list"), 2);
        assert_eq!(raw_len(&data, "n"), 0);
        assert_eq!(raw_u64(&json!(null), "n"), None);
    }
}
