// Helper functions for safe logging and serialization

use serde::{Serialize, Serializer};

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```ignore
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 && !parts[0].is_empty() {
            let first = parts[0].chars().next().unwrap_or('*');
            format!("{}***@{}", first, parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Lowercases and trims an email so lookups and uniqueness are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Current time as RFC 3339 text, the format used for explicit timestamp columns
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Serializes a JSON document stored as TEXT back into structured JSON for API responses
pub fn serialize_json_text<S>(raw: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match raw {
        Some(text) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => value.serialize(serializer),
            Err(_) => text.serialize(serializer),
        },
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_email_log_masks_local_part() {
        assert_eq!(safe_email_log("user@example.com"), "u***@example.com");
        assert_eq!(safe_email_log("abc"), "***@***.***");
        assert_eq!(safe_email_log("no-at-sign"), "***@***.***");
        assert_eq!(safe_email_log("@example.com"), "***@***.***");
    }

    #[derive(Serialize)]
    struct Wrapper {
        #[serde(serialize_with = "serialize_json_text")]
        raw: Option<String>,
    }

    #[test]
    fn test_serialize_json_text() {
        let parsed = Wrapper {
            raw: Some(r#"{"status":"VALID"}"#.to_string()),
        };
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            serde_json::json!({ "raw": { "status": "VALID" } })
        );

        let plain = Wrapper {
            raw: Some("not json".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&plain).unwrap(),
            serde_json::json!({ "raw": "not json" })
        );

        let empty = Wrapper { raw: None };
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            serde_json::json!({ "raw": null })
        );
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }
}
