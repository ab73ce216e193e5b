//! Shared Docker error → gRPC status mapping.
//!
//! Single source of truth for converting [`DockerError`] into [`tonic::Status`].
//! Used by `service::control`.

use super::client::DockerError;
use tonic::Status;

/// Map a [`DockerError`] to the appropriate [`tonic::Status`].
///
/// Mapping rules:
/// - `ContainerNotFound` → `NOT_FOUND`
/// - `PermissionDenied` → `PERMISSION_DENIED`
/// - `ConnectionFailed` → `UNAVAILABLE`
/// - `NotManaged` → `FAILED_PRECONDITION`
/// - Everything else → `INTERNAL`
pub fn map_docker_error(err: DockerError) -> Status {
    match &err {
        DockerError::ContainerNotFound(id) => {
            Status::not_found(format!("Container not found: {}", id))
        }
        DockerError::PermissionDenied => Status::permission_denied("Permission denied"),
        DockerError::ConnectionFailed(msg) => {
            Status::unavailable(format!("Docker daemon unavailable: {}", msg))
        }
        DockerError::NotManaged(_) => Status::failed_precondition(format!("{}", err)),
        DockerError::BollardError(_) => Status::internal(format!("Docker error: {}", err)),
    }
}
