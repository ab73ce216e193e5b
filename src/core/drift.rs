//! Drift Detector — field-by-field comparison between an observed container
//! and its desired spec.

use super::spec::InstanceSpec;
use crate::config::Config;
use crate::docker::inventory::{ManagedContainer, CONTAINER_CONFIG_PORT, CONTAINER_DATA_PORT};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MemoryParseError {
    #[error("unparseable memory value: {0}")]
    Unparseable(String),
}

/// Parse a memory string like `512m`, `2g`, `1024` (raw bytes) into bytes.
pub fn parse_memory(mem_str: &str) -> Result<i64, MemoryParseError> {
    let trimmed = mem_str.trim();
    if trimmed.is_empty() {
        return Err(MemoryParseError::Unparseable(mem_str.to_string()));
    }
    let last = trimmed.chars().last().unwrap();
    let multiplier = match last.to_ascii_lowercase() {
        'k' => 1024i64,
        'm' => 1024i64 * 1024,
        'g' => 1024i64 * 1024 * 1024,
        _ => 1,
    };
    let digits = if multiplier != 1 {
        &trimmed[..trimmed.len() - 1]
    } else {
        trimmed
    };
    digits
        .parse::<i64>()
        .map(|n| n * multiplier)
        .map_err(|_| MemoryParseError::Unparseable(mem_str.to_string()))
}

/// Returns true if `observed` differs from `spec` in any field the runtime
/// cannot patch in place, meaning the container must be destroyed and
/// recreated.
pub fn needs_recreation(observed: &ManagedContainer, spec: &InstanceSpec, config: &Config) -> bool {
    if observed.mounts.get("/config") != Some(&spec.config_path) {
        return true;
    }
    if observed.mounts.get("/downloads") != Some(&spec.data_path) {
        return true;
    }
    if observed.mounts.get("/watch") != Some(&spec.watch_path) {
        return true;
    }

    if observed.port_bindings.get(&CONTAINER_CONFIG_PORT).copied() != Some(spec.web_port as u16) {
        return true;
    }
    if observed.port_bindings.get(&CONTAINER_DATA_PORT).copied() != Some(spec.data_port as u16) {
        return true;
    }

    if !observed.image.is_empty() && observed.image != spec.image_ref() {
        return true;
    }

    let mem_str = spec
        .resource_limits
        .memory
        .clone()
        .unwrap_or_else(|| config.default_mem_limit.clone());
    let desired_mem = parse_memory(&mem_str).unwrap_or(-1);
    if observed.mem_limit_bytes != desired_mem {
        return true;
    }

    let desired_cpu = if spec.resource_limits.cpu_quota > 0 {
        spec.resource_limits.cpu_quota
    } else {
        config.default_cpu_quota
    };
    if observed.cpu_quota != desired_cpu {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::ResourceLimits;
    use std::collections::HashMap;

    fn base_spec() -> InstanceSpec {
        InstanceSpec {
            id: "a".to_string(),
            config_path: "/mnt/a/config".to_string(),
            data_path: "/mnt/a/data".to_string(),
            watch_path: "/mnt/a/watch".to_string(),
            web_port: 9001,
            data_port: 9002,
            image_tag: None,
            resource_limits: ResourceLimits::default(),
        }
    }

    fn matching_container(spec: &InstanceSpec, config: &Config) -> ManagedContainer {
        let mut mounts = HashMap::new();
        mounts.insert("/config".to_string(), spec.config_path.clone());
        mounts.insert("/downloads".to_string(), spec.data_path.clone());
        mounts.insert("/watch".to_string(), spec.watch_path.clone());

        let mut port_bindings = HashMap::new();
        port_bindings.insert(CONTAINER_CONFIG_PORT, spec.web_port as u16);
        port_bindings.insert(CONTAINER_DATA_PORT, spec.data_port as u16);

        ManagedContainer {
            container_id: "c1".to_string(),
            labels: HashMap::new(),
            mounts,
            port_bindings,
            image: spec.image_ref(),
            mem_limit_bytes: parse_memory(&config.default_mem_limit).unwrap(),
            cpu_quota: config.default_cpu_quota,
            state: "running".to_string(),
        }
    }

    #[test]
    fn parse_memory_handles_units() {
        assert_eq!(parse_memory("512m").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_memory("2g").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_memory("100").unwrap(), 100);
        assert!(parse_memory("abc").is_err());
    }

    #[test]
    fn no_drift_when_everything_matches() {
        let config = Config::from_env();
        let spec = base_spec();
        let container = matching_container(&spec, &config);
        assert!(!needs_recreation(&container, &spec, &config));
    }

    #[test]
    fn drift_on_changed_port() {
        let config = Config::from_env();
        let spec = base_spec();
        let mut container = matching_container(&spec, &config);
        container.port_bindings.insert(CONTAINER_CONFIG_PORT, 9999);
        assert!(needs_recreation(&container, &spec, &config));
    }

    #[test]
    fn drift_on_changed_mount() {
        let config = Config::from_env();
        let spec = base_spec();
        let mut container = matching_container(&spec, &config);
        container
            .mounts
            .insert("/config".to_string(), "/mnt/other".to_string());
        assert!(needs_recreation(&container, &spec, &config));
    }

    #[test]
    fn empty_observed_image_is_tolerated() {
        let config = Config::from_env();
        let spec = base_spec();
        let mut container = matching_container(&spec, &config);
        container.image = String::new();
        assert!(!needs_recreation(&container, &spec, &config));
    }
}
