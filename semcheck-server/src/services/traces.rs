//! `TraceService/Export`

use std::sync::Arc;

use opentelemetry_proto::tonic::collector::trace::v1::{
    trace_service_server::TraceService, ExportTraceServiceRequest, ExportTraceServiceResponse,
};
use semcheck_core::Checker;
use tonic::{Request, Response, Status};

use crate::response::render;

/// Trace collector service
pub struct TraceCheckService {
    checker: Arc<Checker>,
}

impl TraceCheckService {
    pub fn new(checker: Arc<Checker>) -> Self {
        Self { checker }
    }
}

#[tonic::async_trait]
impl TraceService for TraceCheckService {
    async fn export(
        &self,
        request: Request<ExportTraceServiceRequest>,
    ) -> Result<Response<ExportTraceServiceResponse>, Status> {
        let req = request.into_inner();
        tracing::debug!(resources = req.resource_spans.len(), "trace export");

        let verdict = self.checker.check(&req.resource_spans);
        render(&verdict, self.checker.disable_error())
    }
}
