//! # semcheck-core - OTLP semantic-convention compliance
//!
//! Checks that telemetry sent over OTLP carries the attributes required by
//! OpenTelemetry semantic conventions:
//!
//! - **Registry**: versioned semantic-convention groups, loaded from YAML
//!   model directories or the embedded default model
//! - **Match Definitions**: configuration rules resolved against the registry
//!   into a signal-name rule, a record pre-filter and a required-attribute set
//! - **Checker**: walks metrics, spans and log records; an attribute counts as
//!   present at record, scope or resource level
//! - **Verdict**: per-request missing count and offending signals, reduced to
//!   an accept / partial-success / reject outcome
//!
//! ## Example
//!
//! ```rust
//! use semcheck_core::{Checker, CheckerConfig, GroupRegistry, SignalKind};
//! use opentelemetry_proto::tonic::metrics::v1::ResourceMetrics;
//!
//! let config = CheckerConfig::from_yaml(r#"
//! metrics:
//!   - name: http.server.request.duration
//!     groups: [metric.http.server.request.duration]
//! "#).unwrap();
//!
//! let registry = GroupRegistry::builtin().unwrap();
//! let checker = Checker::new(SignalKind::Metrics, &config, &registry).unwrap();
//!
//! let payload: Vec<ResourceMetrics> = vec![];
//! let verdict = checker.check(&payload);
//! assert!(verdict.is_compliant());
//! ```

pub mod checker;
pub mod config;
pub mod error;
pub mod matching;
pub mod semconv;
pub mod traversal;
pub mod verdict;

pub use checker::{schema_matches, Checker};
pub use config::{AttributeFilter, CheckerConfig, FilterValue, MatchConfig, ResourceConfig};
pub use error::{CheckerError, ErrorCategory, Result};
pub use matching::{AttributeSet, ComplianceResult, MatchDefinition, NameRule, RecordContext};
pub use semconv::{
    AttributeRequirement, Group, GroupRegistry, RegistryLoader, RequirementLevel,
    SemanticVersion, VersionSource, DEFAULT_VERSION,
};
pub use traversal::SignalKind;
pub use verdict::{ExportOutcome, ExportVerdict, PARTIAL_SUCCESS_MESSAGE};
