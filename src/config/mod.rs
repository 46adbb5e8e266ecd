use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/eventide";
const DEV_SESSION_SECRET: &str = "eventide-dev-session-secret-change-me";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// bcrypt only accepts work factors in this range.
pub const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;
/// One hour up to one year.
pub const SESSION_TTL_RANGE: RangeInclusive<i64> = 1..=24 * 365;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub production: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: 5,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            session_secret: DEV_SESSION_SECRET.to_string(),
            session_ttl_hours: 24,
            bcrypt_cost: 12,
            production: false,
            cors_allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("SESSION_SECRET not set, using the development secret");
                defaults.session_secret
            }
        };

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                env::var("DATABASE_MAX_CONNECTIONS").ok(),
                defaults.database_max_connections,
            ),
            bind_addr: parse_or(
                "BIND_ADDR",
                env::var("BIND_ADDR").ok(),
                defaults.bind_addr,
            ),
            session_secret,
            session_ttl_hours: parse_in_range(
                "SESSION_TTL_HOURS",
                env::var("SESSION_TTL_HOURS").ok(),
                defaults.session_ttl_hours,
                SESSION_TTL_RANGE,
            ),
            bcrypt_cost: parse_in_range(
                "BCRYPT_COST",
                env::var("BCRYPT_COST").ok(),
                defaults.bcrypt_cost,
                BCRYPT_COST_RANGE,
            ),
            production: is_production(env::var("RUST_ENV").ok().as_deref()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or(defaults.cors_allowed_origins),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Config: invalid {} '{}': {}, using default", key, value, e);
            default
        }),
    }
}

fn parse_in_range<T>(key: &str, raw: Option<String>, default: T, range: RangeInclusive<T>) -> T
where
    T: FromStr + PartialOrd + Display + Copy,
    T::Err: Display,
{
    let value = parse_or(key, raw, default);
    if range.contains(&value) {
        return value;
    }
    tracing::warn!(
        "Config: {} {} outside {}..={}, using default",
        key,
        value,
        range.start(),
        range.end()
    );
    default
}

fn is_production(rust_env: Option<&str>) -> bool {
    rust_env.is_some_and(|v| v.eq_ignore_ascii_case("production"))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or("BCRYPT_COST", Some("10".into()), 12u32), 10);
        assert_eq!(parse_or("BCRYPT_COST", Some("lots".into()), 12u32), 12);
        assert_eq!(parse_or::<u32>("BCRYPT_COST", None, 12), 12);
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        assert_eq!(
            parse_in_range("BCRYPT_COST", Some("3".into()), 12u32, BCRYPT_COST_RANGE),
            12
        );
        assert_eq!(
            parse_in_range("BCRYPT_COST", Some("32".into()), 12u32, BCRYPT_COST_RANGE),
            12
        );
        assert_eq!(
            parse_in_range("BCRYPT_COST", Some("10".into()), 12u32, BCRYPT_COST_RANGE),
            10
        );
        assert_eq!(
            parse_in_range(
                "SESSION_TTL_HOURS",
                Some("1000000000000".into()),
                24i64,
                SESSION_TTL_RANGE
            ),
            24
        );
        assert_eq!(
            parse_in_range("SESSION_TTL_HOURS", Some("0".into()), 24i64, SESSION_TTL_RANGE),
            24
        );
    }

    #[test]
    fn test_production_detection() {
        assert!(is_production(Some("PRODUCTION")));
        assert!(!is_production(Some("development")));
        assert!(!is_production(None));
    }

    #[test]
    fn test_split_origins_skips_blanks() {
        assert_eq!(
            split_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.cors_allowed_origins.len(), 2);
    }
}
