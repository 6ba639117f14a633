//! SQLite helper utilities for type conversion
//!
//! SQLite has no array or timestamp types. Lists are stored as JSON text and
//! timestamps as RFC 3339 text.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

// ============================================================================
// Array/Vec Helpers (stored as JSON strings in SQLite)
// ============================================================================

/// Serialize a Vec to a JSON string for SQLite storage
#[inline]
pub fn vec_to_json<T: Serialize>(v: &[T]) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| "[]".to_string())
}

/// Deserialize a JSON string from SQLite to a Vec
#[inline]
pub fn json_to_vec<T: DeserializeOwned>(s: &str) -> Vec<T> {
    serde_json::from_str(s).unwrap_or_default()
}

// ============================================================================
// Timestamp Helpers (stored as ISO8601 TEXT in SQLite)
// ============================================================================

/// Get current UTC timestamp as ISO8601 string for SQLite
#[inline]
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_json_roundtrip() {
        let v = vec!["/w500/poster.jpg".to_string(), "/w500/alt.jpg".to_string()];
        let json = vec_to_json(&v);
        let parsed: Vec<String> = json_to_vec(&json);
        assert_eq!(v, parsed);
    }

    #[test]
    fn test_json_to_vec_tolerates_garbage() {
        let parsed: Vec<String> = json_to_vec("not json");
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_now_iso8601_parses() {
        let now = now_iso8601();
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }
}
