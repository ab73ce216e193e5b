//! Container domain — list, inspect, create, and lifecycle operations
//! against the Docker daemon via bollard.

use super::client::{DockerClient, DockerError};
use super::inventory::ManagedContainer;

use bollard::models::{
    ContainerCreateBody, HostConfig, Mount, MountTypeEnum, PortBinding, RestartPolicy,
    RestartPolicyNameEnum,
};
use bollard::query_parameters::{
    CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use std::collections::HashMap;

/// A container creation request, already validated by `core::validate`.
pub struct CreateSpec<'a> {
    pub name: &'a str,
    pub image: &'a str,
    /// (container destination, host source), e.g. ("/config", "/mnt/c").
    pub mounts: &'a [(&'a str, &'a str)],
    /// (container port, host port), e.g. (9091, 19091).
    pub port_bindings: &'a [(u16, u16)],
    pub labels: HashMap<String, String>,
    pub env: &'a [&'a str],
    pub mem_limit_bytes: i64,
    pub cpu_quota: i64,
}

fn not_found_or(id: &str, err: bollard::errors::Error) -> DockerError {
    match &err {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => DockerError::ContainerNotFound(id.to_string()),
        _ => DockerError::BollardError(err),
    }
}

impl DockerClient {
    /// List every container carrying the given label filters (stopped
    /// containers included — `all=true`).
    pub async fn list_containers(
        &self,
        label_filters: &[String],
    ) -> Result<Vec<ManagedContainer>, DockerError> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), label_filters.to_vec());
        let options = Some(ListContainersOptions {
            all: true,
            filters: Some(filters),
            ..Default::default()
        });
        let containers = self.client.list_containers(options).await?;
        Ok(containers.into_iter().map(ManagedContainer::from).collect())
    }

    pub async fn inspect_container(&self, id: &str) -> Result<ManagedContainer, DockerError> {
        let details = self
            .client
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| not_found_or(id, e))?;
        Ok(ManagedContainer::from(details))
    }

    pub async fn start_container(&self, container_id: &str) -> Result<(), DockerError> {
        self.client
            .start_container(container_id, None::<StartContainerOptions>)
            .await
            .map_err(|e| not_found_or(container_id, e))
    }

    pub async fn stop_container(
        &self,
        container_id: &str,
        timeout_secs: u32,
    ) -> Result<(), DockerError> {
        let options = Some(StopContainerOptions {
            t: Some(timeout_secs as i32),
            ..Default::default()
        });
        self.client
            .stop_container(container_id, options)
            .await
            .map_err(|e| not_found_or(container_id, e))
    }

    pub async fn remove_container(
        &self,
        container_id: &str,
        force: bool,
    ) -> Result<(), DockerError> {
        let options = Some(RemoveContainerOptions {
            force,
            v: false,
            ..Default::default()
        });
        self.client
            .remove_container(container_id, options)
            .await
            .map_err(|e| not_found_or(container_id, e))
    }

    /// Create and start a container with a fixed, hardened security/lifecycle
    /// profile: dropped capabilities, no-new-privileges, bridge network,
    /// restart-unless-stopped.
    pub async fn create_and_start(
        &self,
        spec: CreateSpec<'_>,
    ) -> Result<ManagedContainer, DockerError> {
        let mounts = spec
            .mounts
            .iter()
            .map(|(dest, src)| Mount {
                target: Some(dest.to_string()),
                source: Some(src.to_string()),
                typ: Some(MountTypeEnum::BIND),
                read_only: Some(false),
                ..Default::default()
            })
            .collect();

        let port_bindings = spec
            .port_bindings
            .iter()
            .map(|(container_port, host_port)| {
                (
                    format!("{}/tcp", container_port),
                    Some(vec![PortBinding {
                        host_ip: None,
                        host_port: Some(host_port.to_string()),
                    }]),
                )
            })
            .collect::<HashMap<_, _>>();

        let host_config = HostConfig {
            mounts: Some(mounts),
            port_bindings: Some(port_bindings),
            memory: Some(spec.mem_limit_bytes),
            cpu_quota: Some(spec.cpu_quota),
            cap_drop: Some(vec!["ALL".to_string()]),
            cap_add: Some(vec![
                "CHOWN".to_string(),
                "SETGID".to_string(),
                "SETUID".to_string(),
            ]),
            security_opt: Some(vec!["no-new-privileges=true".to_string()]),
            network_mode: Some("bridge".to_string()),
            restart_policy: Some(RestartPolicy {
                name: Some(RestartPolicyNameEnum::UNLESS_STOPPED),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(spec.image.to_string()),
            env: Some(spec.env.iter().map(|s| s.to_string()).collect()),
            labels: Some(spec.labels),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = Some(CreateContainerOptions {
            name: Some(spec.name.to_string()),
            ..Default::default()
        });

        let created = self
            .client
            .create_container(options, body)
            .await
            .map_err(DockerError::from)?;

        self.start_container(&created.id).await?;
        self.inspect_container(&created.id).await
    }
}
