//! OTLP collector service implementations
//!
//! Each service owns the [`Checker`](semcheck_core::Checker) for its signal
//! kind and answers export calls from the checker's verdict.

mod logs;
mod metrics;
mod traces;

pub use logs::LogsCheckService;
pub use metrics::MetricsCheckService;
pub use traces::TraceCheckService;
