//! Configuration for the OAuth server.

use chrono::Duration;

/// Protocol and security defaults.
pub mod defaults {
    /// Development signing secret. Production deployments must override it.
    pub const JWT_SECRET: &str = "your-secret-key-change-in-production";

    /// Access and session token lifetime in hours.
    pub const TOKEN_LIFETIME_HOURS: i64 = 24;

    /// Authorization code lifetime in minutes.
    pub const AUTH_CODE_LIFETIME_MINUTES: i64 = 10;

    /// Cost factor for password hashing.
    pub const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Lowest cost bcrypt accepts.
    pub const MIN_BCRYPT_COST: u32 = 4;

    /// Highest cost bcrypt accepts.
    pub const MAX_BCRYPT_COST: u32 = 31;

    /// Browser origin allowed to call the API with credentials.
    pub const CORS_ORIGIN: &str = "http://localhost:3000";

    /// Minimum accepted password length at registration.
    pub const MIN_PASSWORD_LENGTH: usize = 6;
}

/// The client registered at startup when no other registration exists.
pub mod seed_client {
    pub const CLIENT_ID: &str = "test_client_123";
    pub const CLIENT_SECRET: &str = "test_secret_456";
    pub const NAME: &str = "OAuth Test Client";
    pub const REDIRECT_URI: &str = "http://localhost:3000/oauth/test-client/callback";
}

/// Server configuration.
#[derive(Clone)]
pub struct Config {
    /// HMAC secret shared by session and OAuth access tokens.
    pub jwt_secret: String,

    /// Lifetime of OAuth access tokens.
    pub access_token_lifetime: Duration,

    /// Lifetime of session tokens issued at login.
    pub session_lifetime: Duration,

    /// Lifetime of authorization codes.
    pub auth_code_lifetime: Duration,

    /// bcrypt cost used when hashing new passwords.
    pub bcrypt_cost: u32,

    /// Origin allowed by the CORS layer.
    pub cors_origin: String,
}

impl Config {
    /// Create a configuration with the given secret and token lifetime.
    ///
    /// Session tokens share the access token lifetime.
    #[must_use]
    pub fn new(jwt_secret: impl Into<String>, token_lifetime_hours: i64) -> Self {
        let lifetime = Duration::hours(token_lifetime_hours);
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_lifetime: lifetime,
            session_lifetime: lifetime,
            auth_code_lifetime: Duration::minutes(defaults::AUTH_CODE_LIFETIME_MINUTES),
            bcrypt_cost: defaults::BCRYPT_COST,
            cors_origin: defaults::CORS_ORIGIN.to_string(),
        }
    }

    /// Create a test configuration: fixed secret, cheapest password hashing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            bcrypt_cost: defaults::MIN_BCRYPT_COST,
            ..Self::new("test-signing-secret", defaults::TOKEN_LIFETIME_HOURS)
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `JWT_SECRET`, `JWT_EXPIRE_HOURS`, `BCRYPT_COST` and `CORS_ORIGIN`.
    /// Unset variables fall back to [`defaults`].
    ///
    /// # Errors
    ///
    /// Returns error if a numeric variable does not parse or is out of range.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = non_empty_var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set, using the development secret");
            defaults::JWT_SECRET.to_string()
        });

        let hours = match non_empty_var("JWT_EXPIRE_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| anyhow::anyhow!("JWT_EXPIRE_HOURS must be an integer: {e}"))?,
            None => defaults::TOKEN_LIFETIME_HOURS,
        };
        anyhow::ensure!(hours > 0, "JWT_EXPIRE_HOURS must be positive, got {hours}");

        let mut config = Self::new(jwt_secret, hours);

        if let Some(raw) = non_empty_var("BCRYPT_COST") {
            let cost = raw
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("BCRYPT_COST must be an integer: {e}"))?;
            anyhow::ensure!(
                (defaults::MIN_BCRYPT_COST..=defaults::MAX_BCRYPT_COST).contains(&cost),
                "BCRYPT_COST must be between {} and {}",
                defaults::MIN_BCRYPT_COST,
                defaults::MAX_BCRYPT_COST
            );
            config.bcrypt_cost = cost;
        }

        if let Some(origin) = non_empty_var("CORS_ORIGIN") {
            config.cors_origin = origin;
        }

        Ok(config)
    }

    /// Whether the development secret is still in use.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == defaults::JWT_SECRET
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(defaults::JWT_SECRET, defaults::TOKEN_LIFETIME_HOURS)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("session_lifetime", &self.session_lifetime)
            .field("auth_code_lifetime", &self.auth_code_lifetime)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("cors_origin", &self.cors_origin)
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
