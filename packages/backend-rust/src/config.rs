use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use lexis_algo::{PresentationOrder, SessionPolicy, SlotPolicy};

/// Upper bound on a requested session size.
pub const MAX_SESSION_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Directory for the daily rolling log file, when file logging is on.
    pub log_dir: Option<PathBuf>,
    pub session: SessionDefaults,
    pub seed_demo_data: bool,
}

/// Defaults applied when a session request leaves a parameter out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDefaults {
    pub size: usize,
    pub policy: SessionPolicy,
    pub rng_seed: Option<u64>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            size: 10,
            policy: SessionPolicy::default(),
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8081);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env_bool("ENABLE_FILE_LOGS").unwrap_or(false).then(|| {
            std::env::var("LOG_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./logs"))
        });

        Self {
            host,
            port,
            log_level,
            log_dir,
            session: SessionDefaults::from_env(),
            seed_demo_data: env_bool("SEED_DEMO_DATA").unwrap_or(false),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SessionDefaults {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let size = std::env::var("SESSION_SIZE")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|size| (1..=MAX_SESSION_SIZE).contains(size))
            .unwrap_or(defaults.size);

        let slots = parse_or_default::<SlotPolicy>("SESSION_POLICY", defaults.policy.slots);
        let order = parse_or_default::<PresentationOrder>("SESSION_ORDER", defaults.policy.order);

        let rng_seed = std::env::var("SESSION_RNG_SEED")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok());

        Self {
            size,
            policy: SessionPolicy::new(slots, order),
            rng_seed,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring invalid setting");
            default
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
