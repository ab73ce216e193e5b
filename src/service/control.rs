//! `TransmissionController` gRPC service implementation.

use super::proto::{
    transmission_controller_server::TransmissionController, CurrentState, DesiredState, Empty,
    InstanceId, InstanceSpec as ProtoInstanceSpec, InstanceState, InstanceStatus,
    ReconcileResult as ProtoReconcileResult,
};
use crate::audit;
use crate::core::spec::{DesiredState as DomainDesiredState, InstanceSpec, ResourceLimits};
use crate::core::validate::validate_batch_uniqueness;
use crate::docker::inventory::{ManagedContainer, CONTAINER_CONFIG_PORT, CONTAINER_DATA_PORT};
use crate::state::SharedState;
use chrono::DateTime;
use prost_types::Timestamp;
use tonic::{Request, Response, Status};

pub struct TransmissionControllerImpl {
    state: SharedState,
}

impl TransmissionControllerImpl {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn to_domain_spec(proto: ProtoInstanceSpec) -> InstanceSpec {
        InstanceSpec {
            id: proto.id,
            config_path: proto.config_path,
            data_path: proto.data_path,
            watch_path: proto.watch_path,
            web_port: proto.web_port,
            data_port: proto.data_port,
            image_tag: if proto.image_tag.is_empty() {
                None
            } else {
                Some(proto.image_tag)
            },
            resource_limits: proto
                .resource_limits
                .map(|rl| ResourceLimits {
                    memory: if rl.memory.is_empty() {
                        None
                    } else {
                        Some(rl.memory)
                    },
                    cpu_quota: rl.cpu_quota,
                })
                .unwrap_or_default(),
        }
    }

    fn container_to_status(container: &ManagedContainer) -> InstanceStatus {
        let status = match container.state.as_str() {
            "running" => InstanceState::Running,
            "exited" | "paused" => InstanceState::Stopped,
            "created" | "restarting" => InstanceState::Creating,
            _ => InstanceState::Error,
        };

        let created_at = container
            .labels
            .get(crate::docker::inventory::LABEL_CREATED_AT)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| Timestamp {
                seconds: dt.timestamp(),
                nanos: dt.timestamp_subsec_nanos() as i32,
            })
            .unwrap_or_default();

        InstanceStatus {
            id: container.instance_id().unwrap_or_default().to_string(),
            container_id: container.container_id.clone(),
            status: status as i32,
            created_at: Some(created_at),
            actual_web_port: container.port_bindings.get(&CONTAINER_CONFIG_PORT).copied().unwrap_or(0) as u32,
            actual_data_port: container.port_bindings.get(&CONTAINER_DATA_PORT).copied().unwrap_or(0) as u32,
        }
    }
}

#[tonic::async_trait]
impl TransmissionController for TransmissionControllerImpl {
    async fn reconcile(
        &self,
        request: Request<DesiredState>,
    ) -> Result<Response<ProtoReconcileResult>, Status> {
        if !self.state.rate_limiter.is_allowed() {
            return Err(Status::resource_exhausted("rate limit exceeded"));
        }

        let desired = request.into_inner();
        audit::log_event(
            "reconcile",
            None,
            Some(serde_json::json!({ "instance_count": desired.instances.len() })),
        );

        let instances: Vec<InstanceSpec> = desired
            .instances
            .into_iter()
            .map(Self::to_domain_spec)
            .collect();
        let desired = DomainDesiredState { instances };

        if let Err(e) = validate_batch_uniqueness(&desired) {
            return Ok(Response::new(ProtoReconcileResult {
                created_count: 0,
                destroyed_count: 0,
                unchanged_count: 0,
                recreated_count: 0,
                errors: vec![e.to_string()],
            }));
        }

        let result = self.state.reconciler.reconcile(&desired).await;

        Ok(Response::new(ProtoReconcileResult {
            created_count: result.created_count,
            destroyed_count: result.destroyed_count,
            unchanged_count: result.unchanged_count,
            recreated_count: result.recreated_count,
            errors: result.errors,
        }))
    }

    async fn get_status(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<CurrentState>, Status> {
        let containers = self
            .state
            .runtime
            .list_managed()
            .await
            .map_err(crate::docker::error_map::map_docker_error)?;

        let instances = containers.iter().map(Self::container_to_status).collect();
        Ok(Response::new(CurrentState { instances }))
    }

    async fn get_instance(
        &self,
        request: Request<InstanceId>,
    ) -> Result<Response<InstanceStatus>, Status> {
        let id = request.into_inner().id;
        let container = self
            .state
            .runtime
            .get_by_instance_id(&id)
            .await
            .map_err(crate::docker::error_map::map_docker_error)?
            .ok_or_else(|| Status::not_found(format!("instance {id} not found")))?;

        Ok(Response::new(Self::container_to_status(&container)))
    }
}
