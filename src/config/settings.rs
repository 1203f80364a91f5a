//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port, cookie flags)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL, `admins` table)
    pub database: DatabaseSettings,

    /// Hosted identity provider
    pub identity: IdentitySettings,

    /// Local session lifetime and storage
    pub session: SessionSettings,

    /// Fixed-window limiter budgets
    pub rate_limit: RateLimitSettings,

    /// Protected and master-only path prefixes
    pub routes: RouteSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// The single identity granted the master admin tier
    #[serde(default)]
    pub master_admin_email: Option<String>,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,

    /// Mark auth cookies `Secure` (disable only for plain-HTTP development)
    pub secure_cookies: bool,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,
}

/// Identity provider (GoTrue-compatible REST API).
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    /// Base URL of the hosted project, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Public API key sent as the `apikey` header
    pub anon_key: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Absolute session lifetime in milliseconds
    pub lifetime_ms: u64,

    /// Sliding inactivity timeout in milliseconds
    pub activity_timeout_ms: u64,

    /// Directory used by the file-backed session storage
    pub storage_dir: String,
}

/// Budget for one fixed-window limiter.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct LimiterSettings {
    /// Attempts allowed per window
    pub max_attempts: u32,

    /// Window duration in milliseconds
    pub window_ms: u64,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Login attempts, keyed by email
    pub login: LimiterSettings,

    /// Search queries
    pub search: LimiterSettings,

    /// Generic API calls
    pub api: LimiterSettings,
}

/// Route gating configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteSettings {
    /// Path prefixes that require an authenticated, active admin
    pub protected: Vec<String>,

    /// Path prefixes reserved for the master admin
    pub master_only: Vec<String>,

    /// Login entry point
    pub login_path: String,

    /// Dashboard for admins lacking the master tier
    pub dashboard_path: String,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Upper bound for any configured duration (one year), far inside chrono's range.
pub const MAX_DURATION_MS: u64 = 365 * 24 * 60 * 60 * 1000;

pub const DEFAULT_PROTECTED_ROUTES: &[&str] = &[
    "/dashboard",
    "/master-dashboard",
    "/admin-management",
    "/activity-logs",
    "/backup-export",
    "/bulk-import",
    "/game-analytics",
    "/quick-add",
    "/team-setup",
    "/api",
];

pub const DEFAULT_MASTER_ONLY_ROUTES: &[&str] = &[
    "/master-dashboard",
    "/admin-management",
    "/activity-logs",
    "/backup-export",
    "/bulk-import",
    "/game-analytics",
    "/quick-add",
];

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the identity provider is not configured.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.secure_cookies", true)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("identity.request_timeout_secs", 10)?
            .set_default("session.lifetime_ms", 3_600_000_i64)? // 1 hour
            .set_default("session.activity_timeout_ms", 1_800_000_i64)? // 30 minutes
            .set_default("session.storage_dir", ".quiz-session")?
            .set_default("rate_limit.login.max_attempts", 5)?
            .set_default("rate_limit.login.window_ms", 900_000_i64)?
            .set_default("rate_limit.search.max_attempts", 30)?
            .set_default("rate_limit.search.window_ms", 60_000_i64)?
            .set_default("rate_limit.api.max_attempts", 100)?
            .set_default("rate_limit.api.window_ms", 60_000_i64)?
            .set_default("routes.protected", DEFAULT_PROTECTED_ROUTES.to_vec())?
            .set_default("routes.master_only", DEFAULT_MASTER_ONLY_ROUTES.to_vec())?
            .set_default("routes.login_path", "/login")?
            .set_default("routes.dashboard_path", "/dashboard")?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("identity.url", std::env::var("IDENTITY_URL").ok())?
            .set_override_option("identity.anon_key", std::env::var("IDENTITY_ANON_KEY").ok())?
            .set_override_option("master_admin_email", std::env::var("MASTER_ADMIN_EMAIL").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Reject configurations the edge cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.url.trim().is_empty() || self.identity.anon_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "identity.url and identity.anon_key must be set".into(),
            ));
        }
        check_duration("session.lifetime_ms", self.session.lifetime_ms)?;
        check_duration("session.activity_timeout_ms", self.session.activity_timeout_ms)?;
        check_duration("rate_limit.login.window_ms", self.rate_limit.login.window_ms)?;
        check_duration("rate_limit.search.window_ms", self.rate_limit.search.window_ms)?;
        check_duration("rate_limit.api.window_ms", self.rate_limit.api.window_ms)?;
        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn check_duration(name: &str, millis: u64) -> Result<(), ConfigError> {
    if millis == 0 || millis > MAX_DURATION_MS {
        return Err(ConfigError::Message(format!(
            "{name} must be between 1 and {MAX_DURATION_MS} milliseconds"
        )));
    }
    Ok(())
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            window_ms: 60_000,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            login: LimiterSettings {
                max_attempts: 5,
                window_ms: 15 * 60 * 1000,
            },
            search: LimiterSettings {
                max_attempts: 30,
                window_ms: 60 * 1000,
            },
            api: LimiterSettings::default(),
        }
    }
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            protected: DEFAULT_PROTECTED_ROUTES.iter().map(|s| s.to_string()).collect(),
            master_only: DEFAULT_MASTER_ONLY_ROUTES.iter().map(|s| s.to_string()).collect(),
            login_path: "/login".into(),
            dashboard_path: "/dashboard".into(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            lifetime_ms: 3_600_000,
            activity_timeout_ms: 1_800_000,
            storage_dir: ".quiz-session".into(),
        }
    }
}
