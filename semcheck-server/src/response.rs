//! Rendering verdicts as OTLP export responses
//!
//! | outcome          | reply                                                   |
//! |------------------|---------------------------------------------------------|
//! | accepted         | empty response                                          |
//! | partial success  | response with `partial_success` set                     |
//! | rejected         | `FAILED_PRECONDITION`, partial success in status details |

use bytes::Bytes;
use opentelemetry_proto::tonic::collector::logs::v1::{
    ExportLogsPartialSuccess, ExportLogsServiceResponse,
};
use opentelemetry_proto::tonic::collector::metrics::v1::{
    ExportMetricsPartialSuccess, ExportMetricsServiceResponse,
};
use opentelemetry_proto::tonic::collector::trace::v1::{
    ExportTracePartialSuccess, ExportTraceServiceResponse,
};
use prost::Message;
use semcheck_core::{ExportOutcome, ExportVerdict};
use tonic::{Code, Response, Status};

/// An OTLP export response carrying an optional partial success
pub trait ExportResponse: Default {
    type PartialSuccess: Message;

    fn partial_success(rejected: i64, message: String) -> Self::PartialSuccess;

    fn with_partial_success(partial_success: Self::PartialSuccess) -> Self;
}

impl ExportResponse for ExportMetricsServiceResponse {
    type PartialSuccess = ExportMetricsPartialSuccess;

    fn partial_success(rejected: i64, message: String) -> Self::PartialSuccess {
        ExportMetricsPartialSuccess {
            rejected_data_points: rejected,
            error_message: message,
        }
    }

    fn with_partial_success(partial_success: Self::PartialSuccess) -> Self {
        Self {
            partial_success: Some(partial_success),
        }
    }
}

impl ExportResponse for ExportTraceServiceResponse {
    type PartialSuccess = ExportTracePartialSuccess;

    fn partial_success(rejected: i64, message: String) -> Self::PartialSuccess {
        ExportTracePartialSuccess {
            rejected_spans: rejected,
            error_message: message,
        }
    }

    fn with_partial_success(partial_success: Self::PartialSuccess) -> Self {
        Self {
            partial_success: Some(partial_success),
        }
    }
}

impl ExportResponse for ExportLogsServiceResponse {
    type PartialSuccess = ExportLogsPartialSuccess;

    fn partial_success(rejected: i64, message: String) -> Self::PartialSuccess {
        ExportLogsPartialSuccess {
            rejected_log_records: rejected,
            error_message: message,
        }
    }

    fn with_partial_success(partial_success: Self::PartialSuccess) -> Self {
        Self {
            partial_success: Some(partial_success),
        }
    }
}

/// Turn a verdict into the reply for an export call
pub fn render<R: ExportResponse>(
    verdict: &ExportVerdict,
    disable_error: bool,
) -> Result<Response<R>, Status> {
    match verdict.outcome(disable_error) {
        ExportOutcome::Accepted => Ok(Response::new(R::default())),
        ExportOutcome::PartialSuccess { rejected, message } => Ok(Response::new(
            R::with_partial_success(R::partial_success(rejected, message)),
        )),
        ExportOutcome::Rejected {
            rejected,
            message,
            error,
        } => {
            let details = R::partial_success(rejected, message).encode_to_vec();
            Err(Status::with_details(
                Code::FailedPrecondition,
                error,
                Bytes::from(details),
            ))
        }
    }
}
