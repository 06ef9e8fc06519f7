use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

/// Optional TOML file merged over the built-in defaults.
pub const CONFIG_FILE: &str = "komik.toml";

/// Process-wide configuration: defaults -> `komik.toml` -> `KOMIK_*` env.
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| panic!("invalid configuration: {e}"))
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3001".to_string(),
            database_url: "sqlite:komik.sqlite".to_string(),
            loglevel: "info".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 20 * 1024 * 1024,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret. Empty means a random secret is generated per process.
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// A fixed request budget per window, per client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub window_secs: u64,
}

impl Window {
    pub const fn new(limit: u32, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub short: Window,
    pub medium: Window,
    pub long: Window,
    /// Stricter budget for credential endpoints.
    pub auth: Window,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            short: Window::new(10, 1),
            medium: Window::new(100, 60),
            long: Window::new(1000, 600),
            auth: Window::new(10, 60),
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("KOMIK_").split("__"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
