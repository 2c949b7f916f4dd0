use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout: Duration,
    pub health_check_timeout: Duration,
    pub foreign_keys: bool,
}

impl DbConfig {
    pub fn from_env() -> Self {
        let path = std::env::var("DATABASE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/lexis.db"));

        Self {
            path,
            max_connections: env_u32("SQLITE_MAX_CONNECTIONS", 5).max(1),
            busy_timeout: Duration::from_millis(env_u64("SQLITE_BUSY_TIMEOUT_MS", 5000)),
            health_check_timeout: Duration::from_millis(env_u64("DB_HEALTH_CHECK_TIMEOUT_MS", 3000)),
            foreign_keys: env_bool("SQLITE_FOREIGN_KEYS", true),
        }
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            health_check_timeout: Duration::from_secs(3),
            foreign_keys: true,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_path_defaults() {
        let config = DbConfig::at_path("/tmp/lexis-test.db");
        assert_eq!(config.path, PathBuf::from("/tmp/lexis-test.db"));
        assert!(config.foreign_keys);
        assert_eq!(config.max_connections, 5);
    }
}
