use std::env;

/// AppConfig
///
/// Holds the application's configuration state. Immutable once loaded and pulled
/// into handlers and middleware through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and demo seeding.
    pub env: Env,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Secret used to validate signed bearer tokens.
    pub jwt_secret: String,
    // Optional master token accepted on behalf of any user (requires `_uid`).
    pub master_token: Option<String>,
    // Populate the in-memory forum with a demo admin, user, topic and posts at startup.
    pub seed_demo_data: bool,
}

/// Env
///
/// Runtime context: `Local` for development conveniences, `Production` for fail-fast,
/// JSON-logging deployments.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4567";
const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

impl Default for AppConfig {
    /// Non-panicking configuration for tests and state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            master_token: None,
            seed_demo_data: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables.
    ///
    /// # Panics
    /// Panics in production when `JWT_SECRET` is not set, so the service never starts
    /// with a guessable signing secret.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let master_token = env::var("MASTER_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let seed_demo_data = match env::var("SEED_DEMO_DATA") {
            Ok(value) => matches!(value.as_str(), "1" | "true" | "yes"),
            Err(_) => env == Env::Local,
        };

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            env,
            jwt_secret,
            master_token,
            seed_demo_data,
        }
    }
}
