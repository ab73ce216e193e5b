//! Fake — in-memory test double for [`ContainerRuntime`].

use super::ContainerRuntime;
use crate::docker::client::DockerError;
use crate::docker::container::CreateSpec;
use crate::docker::inventory::{
    ManagedContainer, LABEL_CREATED_AT, LABEL_INSTANCE_ID, LABEL_MANAGED,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    containers: HashMap<String, ManagedContainer>,
    /// Container ids to fail with this error on the next call that touches them.
    inject_errors: HashMap<String, String>,
}

/// A deterministic in-memory runtime. Seed containers with
/// [`FakeRuntime::seed`], or simulate a failing daemon call with
/// [`FakeRuntime::inject_error`].
pub struct FakeRuntime {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn seed(&self, container: ManagedContainer) {
        self.inner
            .lock()
            .await
            .containers
            .insert(container.container_id.clone(), container);
    }

    /// The next call to `create`/`stop`/`remove`/`inspect` on `container_id`
    /// returns this error message wrapped as a connection failure.
    pub async fn inject_error(&self, container_id: &str, message: &str) {
        self.inner
            .lock()
            .await
            .inject_errors
            .insert(container_id.to_string(), message.to_string());
    }

    pub async fn snapshot(&self) -> Vec<ManagedContainer> {
        self.inner.lock().await.containers.values().cloned().collect()
    }

    async fn check_injected(&self, container_id: &str) -> Result<(), DockerError> {
        let mut state = self.inner.lock().await;
        if let Some(message) = state.inject_errors.remove(container_id) {
            return Err(DockerError::ConnectionFailed(message));
        }
        Ok(())
    }
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for FakeRuntime {
    fn list_managed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ManagedContainer>, DockerError>> + Send + '_>> {
        Box::pin(async move {
            let state = self.inner.lock().await;
            Ok(state
                .containers
                .values()
                .filter(|c| c.is_managed())
                .cloned()
                .collect())
        })
    }

    fn get_by_instance_id<'a>(
        &'a self,
        instance_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ManagedContainer>, DockerError>> + Send + 'a>>
    {
        Box::pin(async move {
            let state = self.inner.lock().await;
            Ok(state
                .containers
                .values()
                .find(|c| c.is_managed() && c.instance_id() == Some(instance_id))
                .cloned())
        })
    }

    fn inspect<'a>(
        &'a self,
        container_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ManagedContainer, DockerError>> + Send + 'a>> {
        Box::pin(async move {
            self.check_injected(container_id).await?;
            let state = self.inner.lock().await;
            state
                .containers
                .get(container_id)
                .cloned()
                .ok_or_else(|| DockerError::ContainerNotFound(container_id.to_string()))
        })
    }

    fn create<'a>(
        &'a self,
        spec: CreateSpec<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ManagedContainer, DockerError>> + Send + 'a>> {
        Box::pin(async move {
            self.check_injected(spec.name).await?;

            let id = format!("fake-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            let mut labels = spec.labels;
            labels
                .entry(LABEL_MANAGED.to_string())
                .or_insert_with(|| "true".to_string());
            labels
                .entry(LABEL_INSTANCE_ID.to_string())
                .or_insert_with(String::new);
            labels
                .entry(LABEL_CREATED_AT.to_string())
                .or_insert_with(|| "1970-01-01T00:00:00Z".to_string());

            let container = ManagedContainer {
                container_id: id.clone(),
                labels,
                mounts: spec
                    .mounts
                    .iter()
                    .map(|(dest, src)| (dest.to_string(), src.to_string()))
                    .collect(),
                port_bindings: spec
                    .port_bindings
                    .iter()
                    .map(|(c, h)| (*c, *h))
                    .collect(),
                image: spec.image.to_string(),
                mem_limit_bytes: spec.mem_limit_bytes,
                cpu_quota: spec.cpu_quota,
                state: "running".to_string(),
            };

            self.inner
                .lock()
                .await
                .containers
                .insert(id, container.clone());
            Ok(container)
        })
    }

    fn stop<'a>(
        &'a self,
        container_id: &'a str,
        _timeout_secs: u32,
    ) -> Pin<Box<dyn Future<Output = Result<(), DockerError>> + Send + 'a>> {
        Box::pin(async move {
            self.check_injected(container_id).await?;
            let mut state = self.inner.lock().await;
            let container = state
                .containers
                .get_mut(container_id)
                .ok_or_else(|| DockerError::ContainerNotFound(container_id.to_string()))?;
            container.state = "exited".to_string();
            Ok(())
        })
    }

    fn remove<'a>(
        &'a self,
        container_id: &'a str,
        force: bool,
    ) -> Pin<Box<dyn Future<Output = Result<(), DockerError>> + Send + 'a>> {
        Box::pin(async move {
            self.check_injected(container_id).await?;
            let mut state = self.inner.lock().await;
            match state.containers.get(container_id) {
                Some(c) if c.state == "running" && !force => {
                    return Err(DockerError::BollardError(
                        bollard::errors::Error::DockerResponseServerError {
                            status_code: 409,
                            message: "container is running, stop it first".to_string(),
                        },
                    ))
                }
                Some(_) => {}
                None => return Err(DockerError::ContainerNotFound(container_id.to_string())),
            }
            state.containers.remove(container_id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let runtime = FakeRuntime::new();
        let spec = CreateSpec {
            name: "transmission-a",
            image: "lscr.io/linuxserver/transmission:latest",
            mounts: &[("/config", "/mnt/a/config")],
            port_bindings: &[(9091, 19091)],
            labels: HashMap::from([(LABEL_INSTANCE_ID.to_string(), "a".to_string())]),
            env: &[],
            mem_limit_bytes: 512 * 1024 * 1024,
            cpu_quota: 50_000,
        };
        let created = runtime.create(spec).await.unwrap();
        assert!(created.is_managed());
        let listed = runtime.list_managed().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].instance_id(), Some("a"));
    }

    #[tokio::test]
    async fn injected_error_fires_once() {
        let runtime = FakeRuntime::new();
        runtime.inject_error("missing", "daemon hiccup").await;
        assert!(runtime.inspect("missing").await.is_err());
        assert!(matches!(
            runtime.inspect("missing").await,
            Err(DockerError::ContainerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_running_without_force_fails() {
        let runtime = FakeRuntime::new();
        let spec = CreateSpec {
            name: "transmission-b",
            image: "img",
            mounts: &[],
            port_bindings: &[],
            labels: HashMap::new(),
            env: &[],
            mem_limit_bytes: 0,
            cpu_quota: 0,
        };
        let created = runtime.create(spec).await.unwrap();
        assert!(runtime.remove(&created.container_id, false).await.is_err());
        assert!(runtime.remove(&created.container_id, true).await.is_ok());
    }
}
