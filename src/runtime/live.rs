//! Docker-backed `ContainerRuntime`.

use super::ContainerRuntime;
use crate::docker::client::{DockerClient, DockerError};
use crate::docker::container::CreateSpec;
use crate::docker::inventory::{ManagedContainer, LABEL_MANAGED};
use std::future::Future;
use std::pin::Pin;

pub struct DockerRuntime {
    client: DockerClient,
}

impl DockerRuntime {
    pub fn new(client: DockerClient) -> Self {
        Self { client }
    }

    fn managed_filter() -> Vec<String> {
        vec![format!("{}=true", LABEL_MANAGED)]
    }
}

impl ContainerRuntime for DockerRuntime {
    fn list_managed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ManagedContainer>, DockerError>> + Send + '_>> {
        Box::pin(async move { self.client.list_containers(&Self::managed_filter()).await })
    }

    fn get_by_instance_id<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ManagedContainer>, DockerError>> + Send + 'a>>
    {
        Box::pin(async move {
            let containers = self.list_managed().await?;
            Ok(containers
                .into_iter()
                .find(|c| c.instance_id() == Some(instance_id)))
        })
    }

    fn inspect<'a>(
        &'a self,
        container_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ManagedContainer, DockerError>> + Send + 'a>> {
        Box::pin(async move { self.client.inspect_container(container_id).await })
    }

    fn create<'a>(
        &'a self,
        spec: CreateSpec<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ManagedContainer, DockerError>> + Send + 'a>> {
        Box::pin(async move { self.client.create_and_start(spec).await })
    }

    fn stop<'a>(
        &'a self,
        container_id: &'a str,
        timeout_secs: u32,
    ) -> Pin<Box<dyn Future<Output = Result<(), DockerError>> + Send + 'a>> {
        Box::pin(async move { self.client.stop_container(container_id, timeout_secs).await })
    }

    fn remove<'a>(
        &'a self,
        container_id: &'a str,
        force: bool,
    ) -> Pin<Box<dyn Future<Output = Result<(), DockerError>> + Send + 'a>> {
        Box::pin(async move { self.client.remove_container(container_id, force).await })
    }
}
