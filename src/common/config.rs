// src/common/config.rs
//! Runtime configuration read from the environment (and `.env` via dotenv)

use std::collections::HashSet;
use std::env;
use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "replace_with_strong_secret";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub admin_emails: HashSet<String>,
    pub ipn_secret: Option<String>,
    pub cors_origins: Vec<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://homease.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, falling back to the development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24 * 7);

        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(bcrypt::DEFAULT_COST);

        let admin_emails = parse_admin_emails(&env::var("ADMIN_EMAILS").unwrap_or_default());

        let ipn_secret = env::var("IPN_SECRET").ok().filter(|s| !s.trim().is_empty());

        let cors_origins = parse_list(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
        );

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        Self {
            database_url,
            jwt_secret,
            jwt_ttl_hours,
            bcrypt_cost,
            admin_emails,
            ipn_secret,
            cors_origins,
            port,
        }
    }
}

/// Parse admin emails from a comma-separated list, lowercased
pub fn parse_admin_emails(raw: &str) -> HashSet<String> {
    parse_list(raw)
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_emails() {
        let emails = parse_admin_emails(" Admin@Homease.test, ,ops@homease.test ");
        assert_eq!(emails.len(), 2);
        assert!(emails.contains("admin@homease.test"));
        assert!(emails.contains("ops@homease.test"));
    }

    #[test]
    fn test_parse_admin_emails_empty() {
        assert!(parse_admin_emails("").is_empty());
    }

    #[test]
    fn test_parse_list_keeps_order() {
        assert_eq!(
            parse_list("http://a.test, http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
