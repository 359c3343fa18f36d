use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub require_api_key: bool,
    pub api_key: Option<String>,
    pub internal_api_key: Option<String>,
    pub rate_limit_default: String,
    pub rate_limit_chat: String,
    pub rate_limit_strict: String,
    pub rate_limit_internal: String,
    pub rate_limit_global: String,
    pub max_body_size: usize,
    pub block_threshold: u32,
    pub block_duration_seconds: u64,
    pub max_message_length: usize,
    pub chat_models: Vec<String>,
    pub default_chat_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs(self.security.block_duration_seconds)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

/// A parsed rate-limit string of the form `"100 per hour"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSpec {
    pub max_requests: usize,
    pub window: Duration,
}

impl RateSpec {
    /// Parses `"<count> per <second|minute|hour>"` (the format the upstream
    /// deployment uses in its environment variables).
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let mut parts = s.split_whitespace();
        let count: usize = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty rate limit string"))?
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid rate limit count in {:?}: {}", s, e))?;
        if parts.next() != Some("per") {
            return Err(anyhow::anyhow!("expected '<count> per <unit>', got {:?}", s));
        }
        let window = match parts.next() {
            Some("second") | Some("seconds") => Duration::from_secs(1),
            Some("minute") | Some("minutes") => Duration::from_secs(60),
            Some("hour") | Some("hours") => Duration::from_secs(3600),
            other => return Err(anyhow::anyhow!("unknown rate limit unit {:?} in {:?}", other, s)),
        };
        if count == 0 {
            return Err(anyhow::anyhow!("rate limit count must be > 0 in {:?}", s));
        }
        Ok(Self { max_requests: count, window })
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: torwache.toml (in CWD)
        .add_source(::config::File::with_name("torwache").required(false));

    if let Ok(custom_path) = std::env::var("TORWACHE_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("TORWACHE").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub(crate) fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    // Warn for privileged ports on Unix-like systems
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Security
    let sec = &cfg.security;
    if sec.block_threshold == 0 {
        return Err(anyhow::anyhow!("security.block_threshold must be > 0"));
    }
    if sec.block_duration_seconds == 0 {
        return Err(anyhow::anyhow!("security.block_duration_seconds must be > 0"));
    }
    if sec.max_body_size == 0 {
        return Err(anyhow::anyhow!("security.max_body_size must be > 0"));
    }
    if sec.max_message_length == 0 {
        return Err(anyhow::anyhow!("security.max_message_length must be > 0"));
    }
    if sec.require_api_key && sec.api_key.as_deref().map_or(true, |k| k.is_empty()) {
        return Err(anyhow::anyhow!("security.api_key must be set when require_api_key = true"));
    }
    if !sec.chat_models.contains(&sec.default_chat_model) {
        return Err(anyhow::anyhow!(
            "security.default_chat_model {:?} is not in security.chat_models",
            sec.default_chat_model
        ));
    }
    for (name, raw) in [
        ("rate_limit_default", &sec.rate_limit_default),
        ("rate_limit_chat", &sec.rate_limit_chat),
        ("rate_limit_strict", &sec.rate_limit_strict),
        ("rate_limit_internal", &sec.rate_limit_internal),
        ("rate_limit_global", &sec.rate_limit_global),
    ] {
        RateSpec::parse(raw).map_err(|e| anyhow::anyhow!("security.{}: {}", name, e))?;
    }

    Ok(())
}
