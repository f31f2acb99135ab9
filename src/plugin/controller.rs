//! go-plugin side services: `plugin.GRPCController` and `grpc.health.v1.Health`.

use crate::tfplugin::proto::health::{
    health_check_response::ServingStatus,
    health_server::{Health, HealthServer},
    HealthCheckRequest, HealthCheckResponse,
};
use crate::tfplugin::proto::plugin::{
    grpc_controller_server::{GrpcController, GrpcControllerServer},
    Empty,
};
use std::sync::Arc;
use tokio::sync::Notify;
use tonic::{Request, Response, Status};
use tracing::info;

/// Handles `Shutdown` by waking the server's shutdown future.
#[derive(Debug, Clone)]
pub struct Controller {
    shutdown: Arc<Notify>,
}

impl Controller {
    pub fn new(shutdown: Arc<Notify>) -> Self {
        Self { shutdown }
    }

    pub fn into_server(self) -> GrpcControllerServer<Self> {
        GrpcControllerServer::new(self)
    }
}

#[tonic::async_trait]
impl GrpcController for Controller {
    async fn shutdown(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        info!("Plugin host requested shutdown");
        self.shutdown.notify_one();
        Ok(Response::new(Empty {}))
    }
}

/// Always reports `SERVING`; the process is healthy for as long as it answers.
#[derive(Debug, Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn into_server(self) -> HealthServer<Self> {
        HealthServer::new(self)
    }
}

#[tonic::async_trait]
impl Health for HealthService {
    async fn check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        Ok(Response::new(HealthCheckResponse { status: ServingStatus::Serving as i32 }))
    }
}
