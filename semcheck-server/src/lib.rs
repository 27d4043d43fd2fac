//! Semcheck Server - OTLP gRPC receiver for semcheck-core
//!
//! Accepts OTLP exports for all three signal kinds and answers each call with
//! the compliance verdict for its payload. Nothing is forwarded or stored.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                    SemcheckServer                      │
//! │                                                        │
//! │  MetricsService/Export  TraceService/Export  LogsService/Export
//! │          │                     │                    │  │
//! │          ▼                     ▼                    ▼  │
//! │   Checker(metrics)      Checker(traces)      Checker(logs)
//! │          └─────────────┬───────┴────────────────────┘  │
//! │                        ▼                               │
//! │            ExportVerdict → response / status           │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! The server is a thin wrapper - all checking lives in `semcheck-core`.

mod config;
pub mod response;
pub mod services;

pub use config::{parse_address, ServerConfig, ServerConfigBuilder, DEFAULT_MAX_MESSAGE_SIZE};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use opentelemetry_proto::tonic::collector::{
    logs::v1::logs_service_server::LogsServiceServer,
    metrics::v1::metrics_service_server::MetricsServiceServer,
    trace::v1::trace_service_server::TraceServiceServer,
};
use semcheck_core::{Checker, CheckerConfig, GroupRegistry, Result, SignalKind};
use tonic::transport::server::Router;
use tonic::transport::Server;

use services::{LogsCheckService, MetricsCheckService, TraceCheckService};

/// OTLP compliance server
///
/// # Example
///
/// ```rust,ignore
/// use semcheck_core::{CheckerConfig, GroupRegistry};
/// use semcheck_server::SemcheckServer;
///
/// #[tokio::main]
/// async fn main() {
///     let config = CheckerConfig::load(None).unwrap();
///     let registry = GroupRegistry::builtin().unwrap();
///
///     let server = SemcheckServer::new(&config, &registry).unwrap();
///     server.run().await.unwrap();
/// }
/// ```
pub struct SemcheckServer {
    metrics: Arc<Checker>,
    traces: Arc<Checker>,
    logs: Arc<Checker>,
    config: ServerConfig,
}

impl SemcheckServer {
    /// Resolve every configured rule; fails on the first bad one
    pub fn new(checker_config: &CheckerConfig, registry: &GroupRegistry) -> Result<Self> {
        let config = ServerConfig::builder()
            .address_str(&checker_config.server_address)?
            .build();

        Ok(Self {
            metrics: Arc::new(Checker::new(SignalKind::Metrics, checker_config, registry)?),
            traces: Arc::new(Checker::new(SignalKind::Traces, checker_config, registry)?),
            logs: Arc::new(Checker::new(SignalKind::Logs, checker_config, registry)?),
            config,
        })
    }

    /// Replace the transport settings
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.config.address
    }

    pub fn checker(&self, kind: SignalKind) -> &Arc<Checker> {
        match kind {
            SignalKind::Metrics => &self.metrics,
            SignalKind::Traces => &self.traces,
            SignalKind::Logs => &self.logs,
        }
    }

    pub fn metrics_service(&self) -> MetricsCheckService {
        MetricsCheckService::new(Arc::clone(&self.metrics))
    }

    pub fn trace_service(&self) -> TraceCheckService {
        TraceCheckService::new(Arc::clone(&self.traces))
    }

    pub fn logs_service(&self) -> LogsCheckService {
        LogsCheckService::new(Arc::clone(&self.logs))
    }

    /// Build the tonic router with all three collector services
    pub fn router(&self) -> Router {
        let limit = self.config.max_message_size;

        let metrics = MetricsServiceServer::new(self.metrics_service());
        let traces = TraceServiceServer::new(self.trace_service());
        let logs = LogsServiceServer::new(self.logs_service());

        Server::builder()
            .add_service(metrics.max_decoding_message_size(limit))
            .add_service(traces.max_decoding_message_size(limit))
            .add_service(logs.max_decoding_message_size(limit))
    }

    /// Run the server until the process is stopped
    pub async fn run(&self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server until `shutdown` completes
    pub async fn run_until<F>(
        &self,
        shutdown: F,
    ) -> std::result::Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = self.addr();

        tracing::info!("Semcheck Server listening on {}", addr);
        tracing::info!("Services:");
        tracing::info!("  opentelemetry.proto.collector.metrics.v1.MetricsService/Export");
        tracing::info!("  opentelemetry.proto.collector.trace.v1.TraceService/Export");
        tracing::info!("  opentelemetry.proto.collector.logs.v1.LogsService/Export");

        self.router().serve_with_shutdown(addr, shutdown).await?;

        Ok(())
    }
}
