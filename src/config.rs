use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

/// Upper bound for either token lifetime: 100 years.
pub const MAX_TTL_MINUTES: i64 = 100 * 365 * 24 * 60;

impl JwtConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.access_ttl_minutes > 0 && self.refresh_ttl_minutes > 0,
            "token lifetimes must be positive"
        );
        anyhow::ensure!(
            self.refresh_ttl_minutes <= MAX_TTL_MINUTES,
            "token lifetimes must not exceed {MAX_TTL_MINUTES} minutes"
        );
        anyhow::ensure!(
            self.access_ttl_minutes <= self.refresh_ttl_minutes,
            "access token lifetime must not exceed refresh token lifetime"
        );
        Ok(())
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            access_ttl_minutes: env_or("JWT_ACCESS_TTL_MINUTES", 60 * 24),
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        jwt.validate()?;

        Ok(Self {
            database_url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 8080),
            jwt,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
