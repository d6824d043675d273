use std::env;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub admin: AdminConfig,
    pub features: FeatureFlags,
    pub rate_limit: RateLimitConfig,
    pub scheduler: SchedulerConfig,
    pub events: EventWindowConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Secret the admin QR codes are signed with. Read from `ADMIN_QR_SECRET`.
    pub qr_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    /// Accept any admin QR code. Read from `QR_BYPASS`; meant for rehearsals
    /// and local development only.
    pub qr_bypass: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for sign-up / check-in / admin login
    pub auth_per_second: u32,
    /// Burst size for those endpoints
    pub auth_burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Fraction of the requested headcount below which a shift is reported as under-filled.
    pub under_fill_ratio: f64,
    /// How many times a roster append is retried after losing a version race.
    pub max_write_retries: u32,
    /// Apply scheduler runs in a single transaction unless the request says otherwise.
    pub atomic_batches: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventWindowConfig {
    /// Events become visible this many days before they start.
    pub active_window_days: i64,
    /// Volunteers cannot request schedule changes once the event is this close.
    pub schedule_lock_days: i64,
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => match v.to_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/crewhq.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            session: SessionConfig {
                secret: env::var("SESSION_SECRET")
                    .map_err(|_| ConfigError::MissingEnv("SESSION_SECRET".to_string()))?,
                expiration_hours: env::var("SESSION_EXPIRATION_HOURS")
                    .unwrap_or_else(|_| "72".to_string())
                    .parse()
                    .unwrap_or(72),
            },
            admin: AdminConfig {
                qr_secret: env::var("ADMIN_QR_SECRET").ok().filter(|s| !s.is_empty()),
            },
            features: FeatureFlags {
                qr_bypass: env_flag("QR_BYPASS", false),
            },
            rate_limit: RateLimitConfig {
                auth_per_second: env::var("RATE_LIMIT_AUTH_PER_SECOND")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                auth_burst: env::var("RATE_LIMIT_AUTH_BURST")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            scheduler: SchedulerConfig {
                under_fill_ratio: env::var("SCHEDULER_UNDER_FILL_RATIO")
                    .unwrap_or_else(|_| "0.5".to_string())
                    .parse()
                    .unwrap_or(0.5),
                max_write_retries: env::var("SCHEDULER_MAX_WRITE_RETRIES")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
                atomic_batches: env_flag("SCHEDULER_ATOMIC_BATCHES", false),
            },
            events: EventWindowConfig {
                active_window_days: env::var("EVENT_ACTIVE_WINDOW_DAYS")
                    .unwrap_or_else(|_| "45".to_string())
                    .parse()
                    .unwrap_or(45),
                schedule_lock_days: env::var("SCHEDULE_LOCK_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .unwrap_or(7),
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                frontend_url: "http://localhost:8081".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://data/crewhq.db".to_string(),
                max_connections: 5,
            },
            session: SessionConfig {
                secret: String::new(),
                expiration_hours: 72,
            },
            admin: AdminConfig { qr_secret: None },
            features: FeatureFlags { qr_bypass: false },
            rate_limit: RateLimitConfig {
                auth_per_second: 3,
                auth_burst: 10,
            },
            scheduler: SchedulerConfig {
                under_fill_ratio: 0.5,
                max_write_retries: 5,
                atomic_batches: false,
            },
            events: EventWindowConfig {
                active_window_days: 45,
                schedule_lock_days: 7,
            },
        }
    }
}
