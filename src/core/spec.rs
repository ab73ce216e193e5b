//! Desired-state data model — `InstanceSpec`, `ResourceLimits`, `DesiredState`.
//!
//! These are the domain-side counterparts of the generated proto messages;
//! `service::control` translates between them at the RPC boundary.

#[derive(Debug, Clone, Default)]
pub struct ResourceLimits {
    pub memory: Option<String>,
    pub cpu_quota: i64,
}

#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub id: String,
    pub config_path: String,
    pub data_path: String,
    pub watch_path: String,
    pub web_port: u32,
    pub data_port: u32,
    pub image_tag: Option<String>,
    pub resource_limits: ResourceLimits,
}

impl InstanceSpec {
    pub fn image_tag(&self) -> &str {
        match &self.image_tag {
            Some(tag) if !tag.is_empty() => tag.as_str(),
            _ => "latest",
        }
    }

    pub fn image_ref(&self) -> String {
        format!("linuxserver/transmission:{}", self.image_tag())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DesiredState {
    pub instances: Vec<InstanceSpec>,
}
