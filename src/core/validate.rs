//! Spec Validator — pure checks run before a spec may be created.

use super::spec::{DesiredState, InstanceSpec};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid regex"));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid instance id: {0}")]
    InvalidId(String),
    #[error("{attr} must be an absolute path: {path}")]
    PathNotAbsolute { attr: &'static str, path: String },
    #[error("{attr} must be under {base}: {path}")]
    PathOutsideAllowedBase {
        attr: &'static str,
        path: String,
        base: String,
    },
    #[error("{attr} does not exist: {path}")]
    PathDoesNotExist { attr: &'static str, path: String },
    #[error("{port_name} out of range: {value}")]
    PortOutOfRange { port_name: &'static str, value: u32 },
    #[error("web_port and data_port must be different")]
    PortsIdentical,
    #[error("duplicate instance id in batch: {0}")]
    DuplicateId(String),
    #[error("duplicate host port in batch: {0}")]
    DuplicatePort(u32),
}

/// Validate a single spec: id format, path checks against `allowed_mount_base`,
/// and port range/distinctness. Does not check batch-level uniqueness.
pub fn validate(spec: &InstanceSpec, allowed_mount_base: &str) -> Result<(), ValidationError> {
    if !ID_PATTERN.is_match(&spec.id) || spec.id.starts_with('-') {
        return Err(ValidationError::InvalidId(spec.id.clone()));
    }

    for (attr, path) in [
        ("config_path", &spec.config_path),
        ("data_path", &spec.data_path),
        ("watch_path", &spec.watch_path),
    ] {
        if !path.starts_with('/') {
            return Err(ValidationError::PathNotAbsolute {
                attr,
                path: path.clone(),
            });
        }
        if !path.starts_with(allowed_mount_base) {
            return Err(ValidationError::PathOutsideAllowedBase {
                attr,
                path: path.clone(),
                base: allowed_mount_base.to_string(),
            });
        }
        if !Path::new(path).exists() {
            return Err(ValidationError::PathDoesNotExist {
                attr,
                path: path.clone(),
            });
        }
    }

    if !(1024..=65535).contains(&spec.web_port) {
        return Err(ValidationError::PortOutOfRange {
            port_name: "web_port",
            value: spec.web_port,
        });
    }
    if !(1024..=65535).contains(&spec.data_port) {
        return Err(ValidationError::PortOutOfRange {
            port_name: "data_port",
            value: spec.data_port,
        });
    }
    if spec.web_port == spec.data_port {
        return Err(ValidationError::PortsIdentical);
    }

    Ok(())
}

/// Batch-level checks: no duplicate id, no two specs sharing a host port.
pub fn validate_batch_uniqueness(desired: &DesiredState) -> Result<(), ValidationError> {
    let mut seen_ids = HashSet::new();
    let mut seen_ports = HashSet::new();
    for spec in &desired.instances {
        if !seen_ids.insert(spec.id.as_str()) {
            return Err(ValidationError::DuplicateId(spec.id.clone()));
        }
        if !seen_ports.insert(spec.web_port) {
            return Err(ValidationError::DuplicatePort(spec.web_port));
        }
        if !seen_ports.insert(spec.data_port) {
            return Err(ValidationError::DuplicatePort(spec.data_port));
        }
    }
    Ok(())
}
