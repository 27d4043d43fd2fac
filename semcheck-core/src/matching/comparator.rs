//! Required-attribute comparison
//!
//! An attribute counts as present when it appears at any of the record,
//! scope or resource levels. Every missing key is logged and counted; the
//! comparison never stops early.

use super::{AttributeSet, MatchDefinition};
use crate::traversal::SignalKind;

/// Where the record under comparison sits in the payload
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    pub kind: SignalKind,
    /// `"resource"` for resource-level checks, otherwise the signal kind
    pub section: &'a str,
    pub scope_name: &'a str,
    pub signal_name: &'a str,
    pub schema_url: &'a str,
}

impl<'a> RecordContext<'a> {
    /// Context for a signal's records
    pub fn signal(
        kind: SignalKind,
        scope_name: &'a str,
        signal_name: &'a str,
        schema_url: &'a str,
    ) -> Self {
        Self {
            kind,
            section: kind.as_str(),
            scope_name,
            signal_name,
            schema_url,
        }
    }

    /// Context for a resource block
    pub fn resource(kind: SignalKind, schema_url: &'a str) -> Self {
        Self {
            kind,
            section: "resource",
            scope_name: "",
            signal_name: "",
            schema_url,
        }
    }
}

/// Outcome of applying one definition to one signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplianceResult {
    /// At least one record passed the pre-filter
    pub matched: bool,
    /// Missing required attributes summed over the signal's records
    pub missing: usize,
}

impl ComplianceResult {
    pub fn merge(&mut self, other: ComplianceResult) {
        self.matched |= other.matched;
        self.missing += other.missing;
    }
}

impl MatchDefinition {
    /// Count required attributes absent from all three levels
    pub fn compare_attributes(
        &self,
        ctx: &RecordContext<'_>,
        record: &AttributeSet<'_>,
        scope: &AttributeSet<'_>,
        resource: &AttributeSet<'_>,
    ) -> usize {
        self.count_missing(ctx, &[record, scope, resource])
    }

    /// Count required attributes absent from a resource
    pub fn compare_resource(&self, ctx: &RecordContext<'_>, resource: &AttributeSet<'_>) -> usize {
        self.count_missing(ctx, &[resource])
    }

    fn count_missing(&self, ctx: &RecordContext<'_>, levels: &[&AttributeSet<'_>]) -> usize {
        let present = |key: &str| levels.iter().any(|level| level.contains(key));

        let mut missing = 0;
        for key in &self.required {
            if present(key.as_str()) {
                continue;
            }
            missing += 1;
            tracing::info!(
                kind = %ctx.kind,
                section = ctx.section,
                scope.name = ctx.scope_name,
                name = ctx.signal_name,
                schema = ctx.schema_url,
                attribute = key.as_str(),
                "missing attribute"
            );
        }

        for key in &self.recommended {
            if !present(key.as_str()) {
                tracing::debug!(
                    kind = %ctx.kind,
                    section = ctx.section,
                    scope.name = ctx.scope_name,
                    name = ctx.signal_name,
                    attribute = key.as_str(),
                    "missing recommended attribute"
                );
            }
        }

        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::NameRule;
    use opentelemetry_proto::tonic::common::v1::{any_value, AnyValue, KeyValue};
    use tracing_test::traced_test;

    fn attrs(keys: &[&str]) -> Vec<KeyValue> {
        keys.iter()
            .map(|k| KeyValue {
                key: k.to_string(),
                value: Some(AnyValue {
                    value: Some(any_value::Value::StringValue("v".to_string())),
                }),
            })
            .collect()
    }

    fn ctx() -> RecordContext<'static> {
        RecordContext::signal(SignalKind::Metrics, "scope", "metric", "")
    }

    #[test]
    fn test_union_of_levels() {
        let def = MatchDefinition::new(NameRule::Any, ["a", "b", "c", "d"]);
        let record = attrs(&["a"]);
        let scope = attrs(&["b"]);
        let resource = attrs(&["c"]);

        let missing = def.compare_attributes(
            &ctx(),
            &AttributeSet::from(record.as_slice()),
            &AttributeSet::from(scope.as_slice()),
            &AttributeSet::from(resource.as_slice()),
        );
        assert_eq!(missing, 1);
    }

    #[test]
    fn test_counts_every_missing_key() {
        let def = MatchDefinition::new(NameRule::Any, ["a", "b", "c"]);
        let empty = AttributeSet::new();
        assert_eq!(def.compare_attributes(&ctx(), &empty, &empty, &empty), 3);
    }

    #[test]
    #[traced_test]
    fn test_every_missing_key_logged() {
        let def = MatchDefinition::new(NameRule::Any, ["http.method", "http.status_code"]);
        let empty = AttributeSet::new();

        assert_eq!(def.compare_attributes(&ctx(), &empty, &empty, &empty), 2);
        for key in ["http.method", "http.status_code"] {
            let field = format!("attribute=\"{}\"", key);
            logs_assert(|lines: &[&str]| {
                let count = lines
                    .iter()
                    .filter(|l| l.contains("missing attribute") && l.contains(&field))
                    .count();
                match count {
                    1 => Ok(()),
                    n => Err(format!("expected one line for {}, got {}", field, n)),
                }
            });
        }
    }

    #[test]
    #[traced_test]
    fn test_recommended_logged_at_debug_only() {
        let mut def = MatchDefinition::new(NameRule::Any, Vec::<String>::new());
        def.recommended.push("http.flavor".to_string());
        let empty = AttributeSet::new();

        assert_eq!(def.compare_attributes(&ctx(), &empty, &empty, &empty), 0);
        assert!(logs_contain("missing recommended attribute"));
        logs_assert(|lines: &[&str]| {
            if lines.iter().any(|l| l.contains("INFO") && l.contains("http.flavor")) {
                return Err("recommended attribute logged at info".to_string());
            }
            Ok(())
        });
    }

    #[test]
    fn test_recommended_not_counted() {
        let mut def = MatchDefinition::new(NameRule::Any, ["a"]);
        def.recommended.push("b".to_string());
        let record = attrs(&["a"]);

        let empty = AttributeSet::new();
        let missing =
            def.compare_attributes(&ctx(), &AttributeSet::from(record.as_slice()), &empty, &empty);
        assert_eq!(missing, 0);
    }

    #[test]
    fn test_resource_only_sees_resource() {
        let def = MatchDefinition::new(NameRule::Any, ["service.name", "host.name"]);
        let resource = attrs(&["service.name"]);
        let ctx = RecordContext::resource(SignalKind::Traces, "");

        assert_eq!(def.compare_resource(&ctx, &AttributeSet::from(resource.as_slice())), 1);
    }

    #[test]
    fn test_merge() {
        let mut result = ComplianceResult::default();
        result.merge(ComplianceResult { matched: false, missing: 0 });
        assert!(!result.matched);
        result.merge(ComplianceResult { matched: true, missing: 2 });
        result.merge(ComplianceResult { matched: false, missing: 1 });
        assert_eq!(result, ComplianceResult { matched: true, missing: 3 });
    }
}
