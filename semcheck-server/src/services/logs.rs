//! `LogsService/Export`

use std::sync::Arc;

use opentelemetry_proto::tonic::collector::logs::v1::{
    logs_service_server::LogsService, ExportLogsServiceRequest, ExportLogsServiceResponse,
};
use semcheck_core::Checker;
use tonic::{Request, Response, Status};

use crate::response::render;

/// Logs collector service
pub struct LogsCheckService {
    checker: Arc<Checker>,
}

impl LogsCheckService {
    pub fn new(checker: Arc<Checker>) -> Self {
        Self { checker }
    }
}

#[tonic::async_trait]
impl LogsService for LogsCheckService {
    async fn export(
        &self,
        request: Request<ExportLogsServiceRequest>,
    ) -> Result<Response<ExportLogsServiceResponse>, Status> {
        let req = request.into_inner();
        tracing::debug!(resources = req.resource_logs.len(), "logs export");

        let verdict = self.checker.check(&req.resource_logs);
        render(&verdict, self.checker.disable_error())
    }
}
