//! Docker client — core struct, constructor, error types.
//!
//! Domain methods live in `container.rs`, which adds the `impl DockerClient`
//! block the `ContainerRuntime` trait needs.

use bollard::Docker;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockerError {
    #[error("Docker connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Container not found: {0}")]
    ContainerNotFound(String),
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Container {0} is not managed by transctrl")]
    NotManaged(String),
    #[error("Bollard error: {0}")]
    BollardError(#[from] bollard::errors::Error),
}

#[derive(Debug, Clone)]
pub struct DockerClient {
    /// The bollard Docker client. `pub(super)` so `container.rs` can call
    /// bollard APIs directly.
    pub(super) client: Docker,
}

impl DockerClient {
    pub fn new(docker_host: &str) -> Result<Self, DockerError> {
        let connection = if docker_host.is_empty() {
            Docker::connect_with_defaults()
                .map_err(|e| DockerError::ConnectionFailed(e.to_string()))?
        } else {
            let clean_path = docker_host.trim_start_matches("unix://");
            Docker::connect_with_socket(clean_path, 120, &bollard::API_DEFAULT_VERSION)
                .map_err(|e| DockerError::ConnectionFailed(e.to_string()))?
        };

        Ok(DockerClient { client: connection })
    }
}
