//! Reconciler — observe, plan, execute against the desired state.

use super::drift::needs_recreation;
use super::spec::{DesiredState, InstanceSpec};
use super::validate::validate;
use crate::config::Config;
use crate::docker::container::CreateSpec;
use crate::docker::inventory::{
    ManagedContainer, CONTAINER_CONFIG_PORT, CONTAINER_DATA_PORT, LABEL_CREATED_AT,
    LABEL_INSTANCE_ID, LABEL_MANAGED,
};
use crate::runtime::ContainerRuntime;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Default, Clone)]
pub struct ReconcileResult {
    pub created_count: u32,
    pub destroyed_count: u32,
    pub unchanged_count: u32,
    pub recreated_count: u32,
    pub errors: Vec<String>,
}

/// The four disjoint action buckets computed from observed vs. desired state.
struct ActionPlan<'a> {
    destroy: Vec<ManagedContainer>,
    create: Vec<&'a InstanceSpec>,
    recreate: Vec<&'a InstanceSpec>,
    keep_count: usize,
}

fn plan<'a>(
    observed: &HashMap<String, ManagedContainer>,
    desired: &'a [InstanceSpec],
    config: &Config,
) -> ActionPlan<'a> {
    let desired_ids: HashSet<&str> = desired.iter().map(|s| s.id.as_str()).collect();

    let mut destroy: Vec<ManagedContainer> = observed
        .iter()
        .filter(|(id, _)| !desired_ids.contains(id.as_str()))
        .map(|(_, c)| c.clone())
        .collect();

    let mut create = Vec::new();
    let mut recreate = Vec::new();
    let mut keep_count = 0;

    for spec in desired {
        match observed.get(&spec.id) {
            None => create.push(spec),
            Some(container) => {
                if needs_recreation(container, spec, config) {
                    recreate.push(spec);
                    destroy.push(container.clone());
                } else {
                    keep_count += 1;
                }
            }
        }
    }

    ActionPlan {
        destroy,
        create,
        recreate,
        keep_count,
    }
}

pub struct Reconciler {
    runtime: std::sync::Arc<dyn ContainerRuntime>,
    config: Config,
}

impl Reconciler {
    pub fn new(runtime: std::sync::Arc<dyn ContainerRuntime>, config: Config) -> Self {
        Self { runtime, config }
    }

    pub async fn reconcile(&self, desired: &DesiredState) -> ReconcileResult {
        let desired = &desired.instances;
        let mut result = ReconcileResult::default();

        let existing = match self.runtime.list_managed().await {
            Ok(containers) => containers,
            Err(e) => {
                result
                    .errors
                    .push(format!("Global reconciliation error: {e}"));
                return result;
            }
        };

        let observed: HashMap<String, ManagedContainer> = existing
            .into_iter()
            .filter_map(|c| c.instance_id().map(|id| id.to_string()).map(|id| (id, c)))
            .collect();

        let action_plan = plan(&observed, desired, &self.config);
        let recreating: HashSet<&str> = action_plan.recreate.iter().map(|s| s.id.as_str()).collect();

        // Destroy phase: strictly before create, so recreated ids free their
        // host ports before the replacement binds them.
        for container in &action_plan.destroy {
            let instance_id = container.instance_id().unwrap_or("<unknown>").to_string();
            match self.destroy_one(container).await {
                Ok(()) => {
                    info!(instance_id, "destroyed container");
                    result.destroyed_count += 1;
                }
                Err(e) => {
                    warn!(instance_id, error = %e, "failed to destroy container");
                    result
                        .errors
                        .push(format!("Failed to destroy {instance_id}: {e}"));
                }
            }
        }

        // Create phase.
        for spec in action_plan.create.iter().chain(action_plan.recreate.iter()) {
            match self.create_one(spec).await {
                Ok(()) => {
                    info!(instance_id = %spec.id, "created container");
                    result.created_count += 1;
                    if recreating.contains(spec.id.as_str()) {
                        result.recreated_count += 1;
                    }
                }
                Err(e) => {
                    warn!(instance_id = %spec.id, error = %e, "failed to create container");
                    result
                        .errors
                        .push(format!("Failed to create {}: {e}", spec.id));
                }
            }
        }

        result.unchanged_count = action_plan.keep_count as u32;
        result
    }

    async fn destroy_one(&self, container: &ManagedContainer) -> Result<(), String> {
        if !container.is_managed() {
            return Err(format!(
                "container {} is not managed by transctrl",
                container.container_id
            ));
        }
        self.runtime
            .stop(&container.container_id, 10)
            .await
            .map_err(|e| e.to_string())?;
        self.runtime
            .remove(&container.container_id, true)
            .await
            .map_err(|e| e.to_string())
    }

    async fn create_one(&self, spec: &InstanceSpec) -> Result<(), String> {
        validate(spec, &self.config.allowed_mount_base).map_err(|e| e.to_string())?;

        let mut labels = HashMap::new();
        labels.insert(LABEL_MANAGED.to_string(), "true".to_string());
        labels.insert(LABEL_INSTANCE_ID.to_string(), spec.id.clone());
        labels.insert(LABEL_CREATED_AT.to_string(), Utc::now().to_rfc3339());

        let mem_limit = spec
            .resource_limits
            .memory
            .clone()
            .unwrap_or_else(|| self.config.default_mem_limit.clone());
        let mem_limit_bytes =
            super::drift::parse_memory(&mem_limit).map_err(|e| e.to_string())?;
        let cpu_quota = if spec.resource_limits.cpu_quota > 0 {
            spec.resource_limits.cpu_quota
        } else {
            self.config.default_cpu_quota
        };

        let image_ref = spec.image_ref();
        let name = format!("transctrl-{}", spec.id);
        let create_spec = CreateSpec {
            name: &name,
            image: &image_ref,
            mounts: &[
                ("/config", spec.config_path.as_str()),
                ("/downloads", spec.data_path.as_str()),
                ("/watch", spec.watch_path.as_str()),
            ],
            port_bindings: &[
                (CONTAINER_CONFIG_PORT, spec.web_port as u16),
                (CONTAINER_DATA_PORT, spec.data_port as u16),
            ],
            labels,
            env: &["PUID=1000", "PGID=1000", "TZ=UTC"],
            mem_limit_bytes,
            cpu_quota,
        };

        self.runtime
            .create(create_spec)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::ResourceLimits;
    use crate::runtime::FakeRuntime;
    use std::sync::Arc;

    fn config(base: &str) -> Config {
        Config {
            socket_path: "/tmp/transctrl.sock".to_string(),
            docker_host: String::new(),
            allowed_mount_base: base.to_string(),
            rate_limit_requests: 10,
            rate_limit_window_secs: 60,
            default_mem_limit: "512m".to_string(),
            default_cpu_quota: 50_000,
            log_level: "info".to_string(),
        }
    }

    fn dirs() -> (tempfile::TempDir, String) {
        let tmp = tempfile::tempdir().unwrap();
        for sub in ["config", "data", "watch"] {
            std::fs::create_dir_all(tmp.path().join(sub)).unwrap();
        }
        let base = tmp.path().to_str().unwrap().to_string();
        (tmp, base)
    }

    fn spec(id: &str, base: &str, web: u32, data: u32) -> InstanceSpec {
        InstanceSpec {
            id: id.to_string(),
            config_path: format!("{base}/config"),
            data_path: format!("{base}/data"),
            watch_path: format!("{base}/watch"),
            web_port: web,
            data_port: data,
            image_tag: None,
            resource_limits: ResourceLimits::default(),
        }
    }

    fn desired(instances: Vec<InstanceSpec>) -> DesiredState {
        DesiredState { instances }
    }

    #[tokio::test]
    async fn creates_missing_instance() {
        let (_tmp, base) = dirs();
        let runtime = Arc::new(FakeRuntime::new());
        let reconciler = Reconciler::new(runtime.clone(), config(&base));
        let result = reconciler
            .reconcile(&desired(vec![spec("a", &base, 9001, 9002)]))
            .await;
        assert_eq!(result.created_count, 1);
        assert_eq!(result.destroyed_count, 0);
        assert_eq!(result.unchanged_count, 0);
        assert!(result.errors.is_empty());
        assert_eq!(runtime.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn creates_many_distinct_instances() {
        let (_tmp, base) = dirs();
        let runtime = Arc::new(FakeRuntime::new());
        let reconciler = Reconciler::new(runtime.clone(), config(&base));
        let result = reconciler
            .reconcile(&desired(vec![
                spec("a", &base, 9001, 9002),
                spec("b", &base, 9003, 9004),
            ]))
            .await;
        assert_eq!(result.created_count, 2);
        assert!(result.errors.is_empty());
        assert_eq!(runtime.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn is_idempotent_once_converged() {
        let (_tmp, base) = dirs();
        let runtime = Arc::new(FakeRuntime::new());
        let reconciler = Reconciler::new(runtime.clone(), config(&base));
        let specs = desired(vec![spec("a", &base, 9001, 9002)]);
        reconciler.reconcile(&specs).await;
        let second = reconciler.reconcile(&specs).await;
        assert_eq!(second.created_count, 0);
        assert_eq!(second.unchanged_count, 1);
    }

    #[tokio::test]
    async fn destroys_instance_dropped_from_desired_state() {
        let (_tmp, base) = dirs();
        let runtime = Arc::new(FakeRuntime::new());
        let reconciler = Reconciler::new(runtime.clone(), config(&base));
        reconciler
            .reconcile(&desired(vec![spec("a", &base, 9001, 9002)]))
            .await;
        let result = reconciler.reconcile(&desired(vec![])).await;
        assert_eq!(result.destroyed_count, 1);
        assert!(runtime.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn recreates_on_port_drift() {
        let (_tmp, base) = dirs();
        let runtime = Arc::new(FakeRuntime::new());
        let reconciler = Reconciler::new(runtime.clone(), config(&base));
        reconciler
            .reconcile(&desired(vec![spec("a", &base, 9001, 9002)]))
            .await;
        let result = reconciler
            .reconcile(&desired(vec![spec("a", &base, 9005, 9002)]))
            .await;
        assert_eq!(result.recreated_count, 1);
        assert_eq!(result.created_count, 1);
        assert_eq!(result.destroyed_count, 1);
    }

    #[tokio::test]
    async fn continues_past_create_failure() {
        let (_tmp, base) = dirs();
        let runtime = Arc::new(FakeRuntime::new());
        runtime.inject_error("transctrl-bad", "daemon unreachable").await;
        let reconciler = Reconciler::new(runtime.clone(), config(&base));
        let result = reconciler
            .reconcile(&desired(vec![
                spec("bad", &base, 9001, 9002),
                spec("good", &base, 9003, 9004),
            ]))
            .await;
        assert_eq!(result.created_count, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("bad"));
    }

    #[tokio::test]
    async fn validation_failure_produces_an_error_and_issues_no_runtime_call() {
        let (_tmp, base) = dirs();
        let runtime = Arc::new(FakeRuntime::new());
        let reconciler = Reconciler::new(runtime.clone(), config(&base));
        let mut bad = spec("bad-path", &base, 9001, 9002);
        bad.config_path = format!("{base}/does-not-exist");
        let result = reconciler.reconcile(&desired(vec![bad])).await;
        assert_eq!(result.created_count, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("bad-path"));
        assert!(runtime.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn refuses_to_destroy_an_unmanaged_container() {
        let (_tmp, base) = dirs();
        let runtime = Arc::new(FakeRuntime::new());
        let reconciler = Reconciler::new(runtime.clone(), config(&base));
        let foreign = ManagedContainer {
            container_id: "someone-elses-container".to_string(),
            labels: HashMap::new(),
            mounts: HashMap::new(),
            port_bindings: HashMap::new(),
            image: String::new(),
            mem_limit_bytes: 0,
            cpu_quota: 0,
            state: "running".to_string(),
        };
        let err = reconciler.destroy_one(&foreign).await.unwrap_err();
        assert!(err.contains("not managed"));
    }
}
