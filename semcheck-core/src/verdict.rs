//! Export-call verdicts
//!
//! One [`ExportVerdict`] is accumulated per export request. It knows nothing
//! about the wire protocol; [`ExportVerdict::outcome`] reduces it to what the
//! server must answer.

use crate::matching::ComplianceResult;

/// Message carried in partial-success responses
pub const PARTIAL_SUCCESS_MESSAGE: &str = "missing attributes";

/// Aggregated compliance findings for one export request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportVerdict {
    missing: usize,
    resource_missing: usize,
    schema_mismatches: usize,
    offending: Vec<String>,
    unmatched: Vec<String>,
}

/// What an export call should answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Everything accepted
    Accepted,
    /// Accepted, but reporting rejected records
    PartialSuccess { rejected: i64, message: String },
    /// Failed with a precondition error carrying the partial success
    Rejected {
        rejected: i64,
        message: String,
        error: String,
    },
}

/// `scope/signal` identifier used for reporting
pub fn signal_id(scope_name: &str, signal_name: &str) -> String {
    format!("{}/{}", scope_name, signal_name)
}

impl ExportVerdict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the result of one definition applied to one signal
    pub fn record(&mut self, scope_name: &str, signal_name: &str, result: ComplianceResult) {
        if result.missing == 0 {
            return;
        }
        self.missing += result.missing;
        let id = signal_id(scope_name, signal_name);
        if !self.offending.contains(&id) {
            self.offending.push(id);
        }
    }

    /// Note a signal no definition applied to
    pub fn record_unmatched(&mut self, scope_name: &str, signal_name: &str) {
        self.unmatched.push(signal_id(scope_name, signal_name));
    }

    /// Add resource-level findings; these never count toward rejection
    pub fn record_resource(&mut self, missing: usize) {
        self.resource_missing += missing;
    }

    pub fn record_schema_mismatch(&mut self) {
        self.schema_mismatches += 1;
    }

    /// Missing required attributes summed over matched records
    pub fn missing(&self) -> usize {
        self.missing
    }

    pub fn resource_missing(&self) -> usize {
        self.resource_missing
    }

    pub fn schema_mismatches(&self) -> usize {
        self.schema_mismatches
    }

    /// Offending `scope/signal` identifiers in first-seen order
    pub fn offending(&self) -> &[String] {
        &self.offending
    }

    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    pub fn is_compliant(&self) -> bool {
        self.missing == 0
    }

    /// Missing count as reported in rejected-records fields
    pub fn rejected(&self) -> i64 {
        i64::try_from(self.missing).unwrap_or(i64::MAX)
    }

    /// Error text listing the offending signals
    pub fn error_message(&self) -> String {
        format!("{}: {:?}", PARTIAL_SUCCESS_MESSAGE, self.offending)
    }

    /// Reduce to the answer for the export call
    ///
    /// The rejected count is identical whether or not errors are disabled;
    /// only the failure status differs.
    pub fn outcome(&self, disable_error: bool) -> ExportOutcome {
        if self.is_compliant() {
            return ExportOutcome::Accepted;
        }

        let rejected = self.rejected();
        let message = PARTIAL_SUCCESS_MESSAGE.to_string();
        if disable_error {
            ExportOutcome::PartialSuccess { rejected, message }
        } else {
            ExportOutcome::Rejected {
                rejected,
                message,
                error: self.error_message(),
            }
        }
    }
}
