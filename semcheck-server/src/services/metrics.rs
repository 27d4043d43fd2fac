//! `MetricsService/Export`

use std::sync::Arc;

use opentelemetry_proto::tonic::collector::metrics::v1::{
    metrics_service_server::MetricsService, ExportMetricsServiceRequest,
    ExportMetricsServiceResponse,
};
use semcheck_core::Checker;
use tonic::{Request, Response, Status};

use crate::response::render;

/// Metrics collector service
pub struct MetricsCheckService {
    checker: Arc<Checker>,
}

impl MetricsCheckService {
    pub fn new(checker: Arc<Checker>) -> Self {
        Self { checker }
    }
}

#[tonic::async_trait]
impl MetricsService for MetricsCheckService {
    async fn export(
        &self,
        request: Request<ExportMetricsServiceRequest>,
    ) -> Result<Response<ExportMetricsServiceResponse>, Status> {
        let req = request.into_inner();
        tracing::debug!(resources = req.resource_metrics.len(), "metrics export");

        let verdict = self.checker.check(&req.resource_metrics);
        render(&verdict, self.checker.disable_error())
    }
}
