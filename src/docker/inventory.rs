//! Inventory — translating bollard's container types into the crate's
//! narrower `ManagedContainer` view (labels, mounts, ports, image, limits).

use bollard::models::{ContainerInspectResponse, ContainerSummary};
use std::collections::HashMap;

pub const LABEL_MANAGED: &str = "transctrl.managed";
pub const LABEL_INSTANCE_ID: &str = "transctrl.instance-id";
pub const LABEL_CREATED_AT: &str = "transctrl.created-at";

pub const CONTAINER_CONFIG_PORT: u16 = 9091;
pub const CONTAINER_DATA_PORT: u16 = 51413;

/// A runtime-observed container, narrowed to the fields the drift detector
/// and status projection consult (SPEC_FULL.md §3).
#[derive(Debug, Clone, Default)]
pub struct ManagedContainer {
    pub container_id: String,
    pub labels: HashMap<String, String>,
    /// Bind-mount source paths, keyed by container-side destination
    /// (`/config`, `/downloads`, `/watch`).
    pub mounts: HashMap<String, String>,
    /// Host port bound to each container port (`9091/tcp`, `51413/tcp`).
    pub port_bindings: HashMap<u16, u16>,
    pub image: String,
    pub mem_limit_bytes: i64,
    pub cpu_quota: i64,
    /// `running | exited | created | restarting | paused | dead | other`
    pub state: String,
}

impl ManagedContainer {
    pub fn instance_id(&self) -> Option<&str> {
        self.labels.get(LABEL_INSTANCE_ID).map(String::as_str)
    }

    pub fn is_managed(&self) -> bool {
        self.labels.get(LABEL_MANAGED).map(String::as_str) == Some("true")
    }
}

impl From<ContainerSummary> for ManagedContainer {
    fn from(s: ContainerSummary) -> Self {
        let port_bindings = s
            .ports
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| Some((p.private_port, p.public_port?)))
            .collect();

        Self {
            container_id: s.id.unwrap_or_default(),
            labels: s.labels.unwrap_or_default(),
            mounts: HashMap::new(),
            port_bindings,
            image: s.image.unwrap_or_default(),
            mem_limit_bytes: 0,
            cpu_quota: 0,
            state: s
                .state
                .map(|st| st.to_string().to_lowercase())
                .unwrap_or_else(|| "other".to_string()),
        }
    }
}

impl From<ContainerInspectResponse> for ManagedContainer {
    fn from(details: ContainerInspectResponse) -> Self {
        let mounts = details
            .mounts
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| Some((m.destination?, m.source?)))
            .collect();

        let host_config = details.host_config.clone();

        let port_bindings = details
            .network_settings
            .as_ref()
            .and_then(|ns| ns.ports.as_ref())
            .map(|port_map| {
                port_map
                    .iter()
                    .filter_map(|(container_port_str, bindings)| {
                        let port_num = container_port_str
                            .split_once('/')
                            .map(|(n, _)| n)
                            .unwrap_or(container_port_str.as_str())
                            .parse::<u16>()
                            .ok()?;
                        let host_port = bindings
                            .as_deref()
                            .unwrap_or(&[])
                            .first()?
                            .host_port
                            .as_ref()?
                            .parse::<u16>()
                            .ok()?;
                        Some((port_num, host_port))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let state = details
            .state
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .map(|s| format!("{:?}", s).to_lowercase())
            .unwrap_or_else(|| "other".to_string());

        Self {
            container_id: details.id.unwrap_or_default(),
            labels: details.config.and_then(|c| c.labels).unwrap_or_default(),
            mounts,
            port_bindings,
            image: details.image.unwrap_or_default(),
            mem_limit_bytes: host_config.as_ref().and_then(|hc| hc.memory).unwrap_or(0),
            cpu_quota: host_config
                .as_ref()
                .and_then(|hc| hc.cpu_quota)
                .unwrap_or(0),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_managed_requires_exact_label_value() {
        let mut c = ManagedContainer::default();
        assert!(!c.is_managed());
        c.labels
            .insert(LABEL_MANAGED.to_string(), "yes".to_string());
        assert!(!c.is_managed());
        c.labels
            .insert(LABEL_MANAGED.to_string(), "true".to_string());
        assert!(c.is_managed());
    }

    #[test]
    fn instance_id_reads_label() {
        let mut c = ManagedContainer::default();
        assert_eq!(c.instance_id(), None);
        c.labels
            .insert(LABEL_INSTANCE_ID.to_string(), "abc".to_string());
        assert_eq!(c.instance_id(), Some("abc"));
    }
}
