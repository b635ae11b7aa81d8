use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::marketplace::PendingVisibility;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub gateway: GatewayConfig,
    pub moderation: ModerationConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let gateway = GatewayConfig {
            supabase_url: non_empty_var("APP_SUPABASE_URL"),
            supabase_key: non_empty_var("APP_SUPABASE_ANON_KEY"),
            storage_bucket: env::var("APP_STORAGE_BUCKET")
                .unwrap_or_else(|_| DEFAULT_STORAGE_BUCKET.to_string()),
        };

        let pending_visibility = match env::var("APP_PENDING_VISIBILITY") {
            Ok(raw) => PendingVisibility::parse(&raw)
                .ok_or(ConfigError::InvalidPendingVisibility { value: raw })?,
            Err(_) => PendingVisibility::default(),
        };

        let moderation = ModerationConfig {
            admin_token: non_empty_var("APP_ADMIN_TOKEN"),
            pending_visibility,
        };

        let session = SessionConfig {
            path: env::var("APP_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE)),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            gateway,
            moderation,
            session,
        })
    }
}

const DEFAULT_STORAGE_BUCKET: &str = "images";
const DEFAULT_SESSION_FILE: &str = ".bazaar-session.json";

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Hosted row/object store settings. Without a usable URL the service falls
/// back to the in-memory gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub storage_bucket: String,
}

impl GatewayConfig {
    /// Only `https://` endpoints count as configured.
    pub fn hosted(&self) -> Option<(&str, &str)> {
        let url = self.supabase_url.as_deref()?;
        if !url.starts_with("https://") {
            return None;
        }
        Some((url, self.supabase_key.as_deref().unwrap_or_default()))
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &self.supabase_key.as_ref().map(|_| "<redacted>"))
            .field("storage_bucket", &self.storage_bucket)
            .finish()
    }
}

#[derive(Clone)]
pub struct ModerationConfig {
    pub admin_token: Option<String>,
    pub pending_visibility: PendingVisibility,
}

impl fmt::Debug for ModerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModerationConfig")
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field("pending_visibility", &self.pending_visibility)
            .finish()
    }
}

/// Where the command line keeps its session context between runs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub path: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPendingVisibility { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPendingVisibility { value } => write!(
                f,
                "APP_PENDING_VISIBILITY must be 'owner' or 'hidden' (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidPendingVisibility { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_SUPABASE_URL",
            "APP_SUPABASE_ANON_KEY",
            "APP_STORAGE_BUCKET",
            "APP_ADMIN_TOKEN",
            "APP_PENDING_VISIBILITY",
            "APP_SESSION_FILE",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.gateway.storage_bucket, "images");
        assert!(config.gateway.hosted().is_none());
        assert!(config.moderation.admin_token.is_none());
        assert_eq!(
            config.moderation.pending_visibility,
            PendingVisibility::OwnerOnly
        );
        assert_eq!(config.session.path, PathBuf::from(".bazaar-session.json"));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn plain_http_gateway_is_treated_as_unconfigured() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SUPABASE_URL", "http://insecure.example");
        env::set_var("APP_SUPABASE_ANON_KEY", "anon");
        let config = AppConfig::load().expect("config loads");
        assert!(config.gateway.hosted().is_none());

        env::set_var("APP_SUPABASE_URL", "https://project.supabase.co");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.gateway.hosted(),
            Some(("https://project.supabase.co", "anon"))
        );
        reset_env();
    }

    #[test]
    fn rejects_unknown_pending_visibility() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PENDING_VISIBILITY", "everyone");
        let err = AppConfig::load().expect_err("invalid mode rejected");
        assert!(matches!(err, ConfigError::InvalidPendingVisibility { .. }));
        reset_env();
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let moderation = ModerationConfig {
            admin_token: Some("super-secret".to_string()),
            pending_visibility: PendingVisibility::Hidden,
        };
        let rendered = format!("{moderation:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
