//! Container runtime driver — the trait boundary between the reconciler
//! and the Docker daemon (or a fake, in tests).

pub mod fake;
pub mod live;

use crate::docker::client::DockerError;
use crate::docker::container::CreateSpec;
use crate::docker::inventory::ManagedContainer;
use std::future::Future;
use std::pin::Pin;

pub use fake::FakeRuntime;
pub use live::DockerRuntime;

/// Unified async interface over "the place containers live". Object-safe
/// via boxed futures so it can sit behind `Arc<dyn ContainerRuntime>` in
/// shared application state.
pub trait ContainerRuntime: Send + Sync {
    /// All containers carrying the `transctrl.managed=true` label.
    fn list_managed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ManagedContainer>, DockerError>> + Send + '_>>;

    /// The managed container for a given instance id, if one exists.
    fn get_by_instance_id<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ManagedContainer>, DockerError>> + Send + 'a>>;

    fn inspect<'a>(
        &'a self,
        container_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ManagedContainer, DockerError>> + Send + 'a>>;

    fn create<'a>(
        &'a self,
        spec: CreateSpec<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ManagedContainer, DockerError>> + Send + 'a>>;

    fn stop<'a>(
        &'a self,
        container_id: &'a str,
        timeout_secs: u32,
    ) -> Pin<Box<dyn Future<Output = Result<(), DockerError>> + Send + 'a>>;

    fn remove<'a>(
        &'a self,
        container_id: &'a str,
        force: bool,
    ) -> Pin<Box<dyn Future<Output = Result<(), DockerError>> + Send + 'a>>;
}
