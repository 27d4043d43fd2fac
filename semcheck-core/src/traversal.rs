//! Signal traversal capabilities
//!
//! OTLP payloads share one shape for every signal kind:
//!
//! ```text
//! Resource{Metrics,Spans,Logs}   (resource attributes, schema URL)
//!   └── Scope{Metrics,Spans,Logs}   (scope attributes, schema URL)
//!         └── signal                 (metric / span / log record)
//!               └── records          (data points, or the signal itself)
//! ```
//!
//! The traits here describe that shape once so the checker can walk every
//! kind with the same routine. New record shapes only need an [`Attributed`]
//! impl and a [`Signal::records`] arm.

use std::borrow::Cow;
use std::fmt;

use opentelemetry_proto::tonic::common::v1::{any_value, InstrumentationScope, KeyValue};
use opentelemetry_proto::tonic::logs::v1::{LogRecord, ResourceLogs, ScopeLogs};
use opentelemetry_proto::tonic::metrics::v1::{
    metric, ExponentialHistogramDataPoint, HistogramDataPoint, Metric, NumberDataPoint,
    ResourceMetrics, ScopeMetrics, SummaryDataPoint,
};
use opentelemetry_proto::tonic::resource::v1::Resource;
use opentelemetry_proto::tonic::trace::v1::{ResourceSpans, ScopeSpans, Span};

/// Record attribute naming a log record's event
pub const EVENT_NAME_ATTRIBUTE: &str = "event.name";

/// Telemetry kinds served by the checker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Metrics,
    Traces,
    Logs,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [SignalKind::Metrics, SignalKind::Traces, SignalKind::Logs];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Metrics => "metrics",
            SignalKind::Traces => "traces",
            SignalKind::Logs => "logs",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything carrying a list of attributes
pub trait Attributed {
    fn attributes(&self) -> &[KeyValue];
}

/// A collection of attribute-bearing records
pub trait Records {
    type Record: Attributed;

    fn records(&self) -> &[Self::Record];
}

/// Visitor over the records of one signal
///
/// [`Signal::records`] dispatches on the concrete record shape and hands
/// the matching collection to the visitor.
pub trait RecordVisitor {
    type Output;

    fn visit<C: Records + ?Sized>(&mut self, collection: &C) -> Self::Output;
}

/// A named signal: metric, span or log record
pub trait Signal {
    /// Name used for rule matching and reporting
    fn name(&self) -> Cow<'_, str>;

    /// Feed this signal's records to `visitor`; `None` when it has none
    fn records<V: RecordVisitor>(&self, visitor: &mut V) -> Option<V::Output>;
}

/// Scope-level block of a payload
pub trait ScopeBlock {
    type Signal: Signal;

    fn scope(&self) -> Option<&InstrumentationScope>;
    fn schema_url(&self) -> &str;
    fn signals(&self) -> &[Self::Signal];
}

/// Resource-level block of a payload
pub trait ResourceBlock {
    type Scope: ScopeBlock;

    fn resource(&self) -> Option<&Resource>;
    fn schema_url(&self) -> &str;
    fn scopes(&self) -> &[Self::Scope];
}

// ── Record shapes ────────────────────────────────────────────────────────────

macro_rules! impl_attributed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Attributed for $ty {
                fn attributes(&self) -> &[KeyValue] {
                    &self.attributes
                }
            }
        )*
    };
}

impl_attributed!(
    NumberDataPoint,
    HistogramDataPoint,
    ExponentialHistogramDataPoint,
    SummaryDataPoint,
    Span,
    LogRecord,
    InstrumentationScope,
    Resource,
);

impl<T: Attributed> Records for [T] {
    type Record = T;

    fn records(&self) -> &[T] {
        self
    }
}

macro_rules! impl_data_points {
    ($($ty:ty => $point:ty),* $(,)?) => {
        $(
            impl Records for $ty {
                type Record = $point;

                fn records(&self) -> &[$point] {
                    &self.data_points
                }
            }
        )*
    };
}

impl_data_points!(
    opentelemetry_proto::tonic::metrics::v1::Gauge => NumberDataPoint,
    opentelemetry_proto::tonic::metrics::v1::Sum => NumberDataPoint,
    opentelemetry_proto::tonic::metrics::v1::Histogram => HistogramDataPoint,
    opentelemetry_proto::tonic::metrics::v1::ExponentialHistogram => ExponentialHistogramDataPoint,
    opentelemetry_proto::tonic::metrics::v1::Summary => SummaryDataPoint,
);

// ── Signals ──────────────────────────────────────────────────────────────────

impl Signal for Metric {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name.as_str())
    }

    fn records<V: RecordVisitor>(&self, visitor: &mut V) -> Option<V::Output> {
        match self.data.as_ref()? {
            metric::Data::Gauge(gauge) => Some(visitor.visit(gauge)),
            metric::Data::Sum(sum) => Some(visitor.visit(sum)),
            metric::Data::Histogram(histogram) => Some(visitor.visit(histogram)),
            metric::Data::ExponentialHistogram(histogram) => Some(visitor.visit(histogram)),
            metric::Data::Summary(summary) => Some(visitor.visit(summary)),
        }
    }
}

impl Signal for Span {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name.as_str())
    }

    fn records<V: RecordVisitor>(&self, visitor: &mut V) -> Option<V::Output> {
        Some(visitor.visit(std::slice::from_ref(self)))
    }
}

impl Signal for LogRecord {
    /// The `event.name` attribute; empty when the record has none
    fn name(&self) -> Cow<'_, str> {
        let value = self
            .attributes
            .iter()
            .find(|kv| kv.key == EVENT_NAME_ATTRIBUTE)
            .and_then(|kv| kv.value.as_ref())
            .and_then(|v| v.value.as_ref());

        match value {
            Some(any_value::Value::StringValue(name)) => Cow::Borrowed(name.as_str()),
            _ => Cow::Borrowed(""),
        }
    }

    fn records<V: RecordVisitor>(&self, visitor: &mut V) -> Option<V::Output> {
        Some(visitor.visit(std::slice::from_ref(self)))
    }
}

// ── Payload blocks ───────────────────────────────────────────────────────────

macro_rules! impl_blocks {
    ($($resource:ty => $scope:ty { $scopes:ident, $signal:ty, $signals:ident }),* $(,)?) => {
        $(
            impl ResourceBlock for $resource {
                type Scope = $scope;

                fn resource(&self) -> Option<&Resource> {
                    self.resource.as_ref()
                }

                fn schema_url(&self) -> &str {
                    &self.schema_url
                }

                fn scopes(&self) -> &[$scope] {
                    &self.$scopes
                }
            }

            impl ScopeBlock for $scope {
                type Signal = $signal;

                fn scope(&self) -> Option<&InstrumentationScope> {
                    self.scope.as_ref()
                }

                fn schema_url(&self) -> &str {
                    &self.schema_url
                }

                fn signals(&self) -> &[$signal] {
                    &self.$signals
                }
            }
        )*
    };
}

impl_blocks!(
    ResourceMetrics => ScopeMetrics { scope_metrics, Metric, metrics },
    ResourceSpans => ScopeSpans { scope_spans, Span, spans },
    ResourceLogs => ScopeLogs { scope_logs, LogRecord, log_records },
);

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_proto::tonic::common::v1::AnyValue;
    use opentelemetry_proto::tonic::metrics::v1::{Gauge, Histogram};

    fn kv(key: &str, value: &str) -> KeyValue {
        KeyValue {
            key: key.to_string(),
            value: Some(AnyValue {
                value: Some(any_value::Value::StringValue(value.to_string())),
            }),
        }
    }

    /// Counts records and their attributes
    struct Counter;

    impl RecordVisitor for Counter {
        type Output = (usize, usize);

        fn visit<C: Records + ?Sized>(&mut self, collection: &C) -> (usize, usize) {
            let records = collection.records();
            let attrs = records.iter().map(|r| r.attributes().len()).sum();
            (records.len(), attrs)
        }
    }

    #[test]
    fn test_metric_dispatches_on_shape() {
        let gauge = Metric {
            name: "queue.depth".to_string(),
            data: Some(metric::Data::Gauge(Gauge {
                data_points: vec![
                    NumberDataPoint {
                        attributes: vec![kv("a", "1")],
                        ..Default::default()
                    },
                    NumberDataPoint::default(),
                ],
                ..Default::default()
            })),
            ..Default::default()
        };
        assert_eq!(gauge.records(&mut Counter), Some((2, 1)));

        let histogram = Metric {
            name: "latency".to_string(),
            data: Some(metric::Data::Histogram(Histogram {
                data_points: vec![HistogramDataPoint {
                    attributes: vec![kv("a", "1"), kv("b", "2")],
                    ..Default::default()
                }],
                ..Default::default()
            })),
            ..Default::default()
        };
        assert_eq!(histogram.records(&mut Counter), Some((1, 2)));
    }

    #[test]
    fn test_metric_without_data() {
        let metric = Metric {
            name: "empty".to_string(),
            ..Default::default()
        };
        assert_eq!(metric.records(&mut Counter), None);
    }

    #[test]
    fn test_span_is_its_own_record() {
        let span = Span {
            name: "GET /users".to_string(),
            attributes: vec![kv("http.request.method", "GET")],
            ..Default::default()
        };
        assert_eq!(span.name(), "GET /users");
        assert_eq!(span.records(&mut Counter), Some((1, 1)));
    }

    #[test]
    fn test_log_record_name_from_event_attribute() {
        let record = LogRecord {
            attributes: vec![kv(EVENT_NAME_ATTRIBUTE, "exception"), kv("x", "y")],
            ..Default::default()
        };
        assert_eq!(record.name(), "exception");
        assert_eq!(LogRecord::default().name(), "");
    }

    #[test]
    fn test_blocks_expose_nesting() {
        let payload = ResourceSpans {
            resource: Some(Resource {
                attributes: vec![kv("service.name", "checkout")],
                ..Default::default()
            }),
            scope_spans: vec![ScopeSpans {
                scope: Some(InstrumentationScope {
                    name: "http".to_string(),
                    ..Default::default()
                }),
                spans: vec![Span::default(), Span::default()],
                schema_url: "https://opentelemetry.io/schemas/1.24.0".to_string(),
            }],
            schema_url: String::new(),
        };

        assert_eq!(payload.resource().unwrap().attributes().len(), 1);
        let scope = &payload.scopes()[0];
        assert_eq!(scope.scope().unwrap().name, "http");
        assert_eq!(scope.signals().len(), 2);
        assert!(scope.schema_url().ends_with("1.24.0"));
    }

    #[test]
    fn test_signal_kind_display() {
        assert_eq!(SignalKind::Metrics.to_string(), "metrics");
        assert_eq!(SignalKind::ALL.len(), 3);
    }
}
