use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory served for every path the API does not claim
    pub static_dir: PathBuf,
    /// Where live games are saved periodically and restored from at startup
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval: Duration,
    /// Advance rounds server-side once a trigger fires
    pub auto_advance: bool,
    pub auto_advance_interval: Duration,
    /// Fixed seed for round sampling (reproducible games)
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            static_dir: PathBuf::from("static"),
            snapshot_path: None,
            snapshot_interval: Duration::from_secs(30),
            auto_advance: false,
            auto_advance_interval: Duration::from_secs(1),
            seed: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn flag_var(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(default)
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = match non_empty_var("BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid BIND_ADDR '{}': {}", raw, e);
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let seed = non_empty_var("GAME_SEED").and_then(|raw| match raw.parse() {
            Ok(seed) => Some(seed),
            Err(e) => {
                tracing::warn!("Ignoring invalid GAME_SEED '{}': {}", raw, e);
                None
            }
        });

        Self {
            bind_addr,
            static_dir: non_empty_var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            snapshot_path: non_empty_var("SNAPSHOT_PATH").map(PathBuf::from),
            snapshot_interval: non_empty_var("SNAPSHOT_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.snapshot_interval),
            auto_advance: flag_var("AUTO_ADVANCE", false),
            auto_advance_interval: defaults.auto_advance_interval,
            seed,
        }
    }
}
