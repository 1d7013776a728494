use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use tracing::warn;

use agora_gateway::media::DEFAULT_MAX_BLOB_BYTES;
use agora_gateway::room::RoomConfig;
use agora_gateway::services::ServicesConfig;

/// Placeholder session secrets that should never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me-to-a-random-string"];

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub static_dir: PathBuf,
    pub room: RoomConfig,
    pub services: ServicesConfig,
}

impl Config {
    /// Read configuration from the environment (after `.env` was loaded).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let host = or("AGORA_HOST", "0.0.0.0");
        let port: u16 = parse(&var, "AGORA_PORT", 3000)?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let session_secret = or("AGORA_SESSION_SECRET", "dev-secret-change-me");
        if PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            warn!("AGORA_SESSION_SECRET is unset or a placeholder; sessions are forgeable");
        }
        let ttl_hours: u64 = parse(&var, "AGORA_SESSION_TTL_HOURS", 168)?;

        let defaults = ServicesConfig::default();
        let services = ServicesConfig {
            timeout: Duration::from_secs(parse(&var, "AGORA_SERVICE_TIMEOUT_SECS", 20)?),
            ai_base_url: or("AGORA_AI_BASE_URL", &defaults.ai_base_url),
            ai_api_key: var("AGORA_AI_API_KEY"),
            ai_model: or("AGORA_AI_MODEL", &defaults.ai_model),
            image_model: or("AGORA_IMAGE_MODEL", &defaults.image_model),
            search_base_url: or("AGORA_SEARCH_BASE_URL", &defaults.search_base_url),
            search_api_key: var("AGORA_SEARCH_API_KEY"),
            download_base_url: var("AGORA_DOWNLOAD_BASE_URL"),
            lyrics_base_url: or("AGORA_LYRICS_BASE_URL", &defaults.lyrics_base_url),
        };

        Ok(Self {
            addr,
            db_path: or("AGORA_DB_PATH", "agora.db").into(),
            session_secret,
            session_ttl: Duration::from_secs(ttl_hours * 3600),
            static_dir: or("AGORA_STATIC_DIR", "./public").into(),
            room: RoomConfig {
                bot_name: or("AGORA_BOT_NAME", "AgoraBot"),
                max_blob_bytes: parse(&var, "AGORA_MAX_BLOB_BYTES", DEFAULT_MAX_BLOB_BYTES)?,
                heartbeat_interval: Duration::from_secs(parse(&var, "AGORA_HEARTBEAT_SECS", 15)?),
            },
            services,
        })
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value {:?}", key, raw)),
        None => Ok(default),
    }
}
