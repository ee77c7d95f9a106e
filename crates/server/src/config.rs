use std::env;

/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Missing or unparsable numbers
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:./data/donation_management.db?mode=rwc".to_string()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(5),
            jwt_secret: lookup("JWT_SECRET")
                .unwrap_or_else(|| "development-secret-change-in-production".to_string()),
            token_ttl_hours: lookup("TOKEN_TTL_HOURS")
                .and_then(|h| h.parse::<i64>().ok())
                .filter(|h| *h > 0)
                .map(|h| h.min(MAX_TOKEN_TTL_HOURS))
                .unwrap_or(24 * 7),
        }
    }
}
