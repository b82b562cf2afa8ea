/// Configuration management for the API server
///
/// Loads a `.env` file when present, then reads environment variables.
///
/// # Environment Variables
///
/// | Variable | Default |
/// |---|---|
/// | `DATABASE_URL` | required |
/// | `DATABASE_MAX_CONNECTIONS` | 10 |
/// | `API_HOST` / `API_PORT` | 0.0.0.0 / 8080 |
/// | `APP_ENV` | development |
/// | `CORS_ORIGINS` | `http://localhost:5173` (comma-separated, `*` allows any) |
/// | `JWT_SECRET` | required, at least 32 characters |
/// | `UPLOAD_DIR` | ./uploads |
/// | `MAX_UPLOAD_BYTES` | 5242880 (5 MiB) |
/// | `PAYMENT_DEFAULT_AMOUNT` | 25000 |
/// | `PAYMENT_DEFAULT_METHOD` | orange_money |
/// | `REDIS_URL` | unset (rate limiting disabled) |
/// | `RATE_LIMIT_REQUESTS` / `RATE_LIMIT_WINDOW_SECS` | 100 / 900 |
/// | `ADMIN_EMAIL` / `ADMIN_PASSWORD` | unset (no admin seeding) |
///
/// # Example
///
/// ```no_run
/// use incorpo_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Minimum JWT secret length in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => anyhow::bail!("Unknown APP_ENV '{}'", other),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub uploads: UploadConfig,
    pub payments: PaymentConfig,
    pub rate_limit: RateLimitConfig,

    /// Default admin account created at startup in development
    pub seed_admin: Option<SeedAdmin>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any origin
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Root directory, also served under `/uploads`
    pub dir: PathBuf,

    /// Largest accepted request body, in bytes
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Used when a proof submission omits `amount`
    pub default_amount: i64,

    /// Used when a proof submission omits `method`
    pub default_method: String,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Rate limiting is disabled when unset
    pub redis_url: Option<String>,
    pub max_requests: u32,
    pub window_secs: u64,

    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP`; only safe
    /// behind a reverse proxy that overwrites them
    pub trust_proxy_headers: bool,
}

#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Fails when a required variable is missing or a value does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("APP_ENV") {
            Some(value) => value.parse()?,
            None => Environment::Development,
        };

        let host = get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(get("API_PORT"), 8080u16, "API_PORT")?;
        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_or(get("DATABASE_MAX_CONNECTIONS"), 10u32, "DATABASE_MAX_CONNECTIONS")?;

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }

        let upload_dir = PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string()));
        let max_upload_bytes = parse_or(get("MAX_UPLOAD_BYTES"), 5 * 1024 * 1024usize, "MAX_UPLOAD_BYTES")?;

        let default_amount = parse_or(get("PAYMENT_DEFAULT_AMOUNT"), 25_000i64, "PAYMENT_DEFAULT_AMOUNT")?;
        if default_amount <= 0 {
            anyhow::bail!("PAYMENT_DEFAULT_AMOUNT must be positive");
        }
        let default_method = get("PAYMENT_DEFAULT_METHOD").unwrap_or_else(|| "orange_money".to_string());

        let max_requests = parse_or(get("RATE_LIMIT_REQUESTS"), 100u32, "RATE_LIMIT_REQUESTS")?;
        let window_secs = parse_or(get("RATE_LIMIT_WINDOW_SECS"), 900u64, "RATE_LIMIT_WINDOW_SECS")?;
        if max_requests == 0 || window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_REQUESTS and RATE_LIMIT_WINDOW_SECS must be positive");
        }
        let trust_proxy_headers = parse_or(get("RATE_LIMIT_TRUST_PROXY"), false, "RATE_LIMIT_TRUST_PROXY")?;

        let seed_admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            _ => None,
        };

        Ok(Self {
            environment,
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            uploads: UploadConfig {
                dir: upload_dir,
                max_bytes: max_upload_bytes,
            },
            payments: PaymentConfig {
                default_amount,
                default_method,
            },
            rate_limit: RateLimitConfig {
                redis_url: get("REDIS_URL"),
                max_requests,
                window_secs,
                trust_proxy_headers,
            },
            seed_admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_or<T>(value: Option<String>, default: T, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}
