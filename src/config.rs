//! Config — environment-driven configuration, loaded once at startup.

#[derive(Debug, Clone)]
pub struct Config {
    pub socket_path: String,
    pub docker_host: String,
    pub allowed_mount_base: String,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub default_mem_limit: String,
    pub default_cpu_quota: i64,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables and validate it.
    pub fn load() -> Result<Self, String> {
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from environment variables, falling back to the
    /// same defaults as `original_source/src/config.py`'s `Settings`.
    pub fn from_env() -> Self {
        Self {
            socket_path: std::env::var("SOCKET_PATH")
                .unwrap_or_else(|_| "/var/run/transctrl/transctrl.sock".to_string()),
            docker_host: std::env::var("DOCKER_HOST").unwrap_or_default(),
            allowed_mount_base: std::env::var("ALLOWED_MOUNT_BASE")
                .unwrap_or_else(|_| "/mnt".to_string()),
            rate_limit_requests: std::env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            rate_limit_window_secs: std::env::var("RATE_LIMIT_WINDOW")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            default_mem_limit: std::env::var("DEFAULT_MEM_LIMIT")
                .unwrap_or_else(|_| "512m".to_string()),
            default_cpu_quota: std::env::var("DEFAULT_CPU_QUOTA")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50_000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.socket_path.is_empty() {
            return Err("SOCKET_PATH must not be empty".to_string());
        }
        if !self.allowed_mount_base.starts_with('/') {
            return Err("ALLOWED_MOUNT_BASE must be an absolute path".to_string());
        }
        if self.rate_limit_requests == 0 {
            return Err("RATE_LIMIT_REQUESTS must be > 0".to_string());
        }
        if self.rate_limit_window_secs == 0 {
            return Err("RATE_LIMIT_WINDOW must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "SOCKET_PATH",
            "DOCKER_HOST",
            "ALLOWED_MOUNT_BASE",
            "RATE_LIMIT_REQUESTS",
            "RATE_LIMIT_WINDOW",
            "DEFAULT_MEM_LIMIT",
            "DEFAULT_CPU_QUOTA",
            "LOG_LEVEL",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_match_original_settings() {
        clear_env();
        let config = Config::from_env();
        assert_eq!(config.socket_path, "/var/run/transctrl/transctrl.sock");
        assert_eq!(config.allowed_mount_base, "/mnt");
        assert_eq!(config.rate_limit_requests, 10);
        assert_eq!(config.rate_limit_window_secs, 60);
        assert_eq!(config.default_mem_limit, "512m");
        assert_eq!(config.default_cpu_quota, 50_000);
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        clear_env();
        std::env::set_var("RATE_LIMIT_REQUESTS", "3");
        std::env::set_var("ALLOWED_MOUNT_BASE", "/srv/transctrl");
        let config = Config::from_env();
        assert_eq!(config.rate_limit_requests, 3);
        assert_eq!(config.allowed_mount_base, "/srv/transctrl");
        clear_env();
    }

    #[test]
    fn rejects_empty_socket_path() {
        let config = Config {
            socket_path: String::new(),
            ..Config::from_env()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_relative_mount_base() {
        let config = Config {
            allowed_mount_base: "mnt".to_string(),
            ..Config::from_env()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_rate_limit() {
        let config = Config {
            rate_limit_requests: 0,
            ..Config::from_env()
        };
        assert!(config.validate().is_err());
    }
}
