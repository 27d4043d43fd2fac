//! The per-kind compliance checker
//!
//! A [`Checker`] owns the resolved definitions for one signal kind and walks
//! export payloads of that kind:
//!
//! ```text
//! for each resource block      → resource schema + resource attributes
//!   for each scope block
//!     for each signal          → every name-matching definition
//!       for each record        → pre-filter, then compare attributes
//! ```
//!
//! Checkers are immutable after construction and shared across requests.

use crate::config::CheckerConfig;
use crate::error::Result;
use crate::matching::{AttributeSet, ComplianceResult, MatchDefinition, RecordContext};
use crate::semconv::GroupRegistry;
use crate::traversal::{
    Attributed, RecordVisitor, Records, ResourceBlock, ScopeBlock, Signal, SignalKind,
};
use crate::verdict::ExportVerdict;

/// Compliance checker for one signal kind
#[derive(Debug, Clone)]
pub struct Checker {
    kind: SignalKind,
    resource: MatchDefinition,
    definitions: Vec<MatchDefinition>,
    report_unmatched: bool,
    disable_error: bool,
}

impl Checker {
    /// Resolve the rules configured for `kind` against `registry`
    pub fn new(kind: SignalKind, config: &CheckerConfig, registry: &GroupRegistry) -> Result<Self> {
        let resource = MatchDefinition::resolve_resource(&config.resource, registry)?;
        let definitions = config
            .rules(kind)
            .iter()
            .map(|rule| MatchDefinition::resolve(rule, registry))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            kind = %kind,
            rules = definitions.len(),
            default_version = %registry.default_version(),
            "checker ready"
        );

        Ok(Self {
            kind,
            resource,
            definitions,
            report_unmatched: config.report_unmatched,
            disable_error: config.disable_error,
        })
    }

    /// Checker over already-resolved definitions
    pub fn from_definitions(
        kind: SignalKind,
        resource: MatchDefinition,
        definitions: Vec<MatchDefinition>,
    ) -> Self {
        Self {
            kind,
            resource,
            definitions,
            report_unmatched: false,
            disable_error: false,
        }
    }

    pub fn with_report_unmatched(mut self, report: bool) -> Self {
        self.report_unmatched = report;
        self
    }

    pub fn with_disable_error(mut self, disable: bool) -> Self {
        self.disable_error = disable;
        self
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn definitions(&self) -> &[MatchDefinition] {
        &self.definitions
    }

    pub fn disable_error(&self) -> bool {
        self.disable_error
    }

    pub fn report_unmatched(&self) -> bool {
        self.report_unmatched
    }

    /// Check every resource block of one export request
    pub fn check<B: ResourceBlock>(&self, blocks: &[B]) -> ExportVerdict {
        let mut verdict = ExportVerdict::new();
        for block in blocks {
            self.check_block(block, &mut verdict);
        }

        if !verdict.is_compliant() {
            tracing::debug!(
                kind = %self.kind,
                missing = verdict.missing(),
                offending = ?verdict.offending(),
                "export not compliant"
            );
        }
        verdict
    }

    fn check_block<B: ResourceBlock>(&self, block: &B, verdict: &mut ExportVerdict) {
        let schema_url = block.schema_url();
        if let Some(expected) = self.resource.schema_version() {
            if !schema_matches(schema_url, expected) {
                tracing::info!(
                    kind = %self.kind,
                    section = "resource",
                    version = schema_url,
                    expected,
                    "incorrect resource version"
                );
                verdict.record_schema_mismatch();
            }
        }

        let resource_attrs = block
            .resource()
            .map(|r| AttributeSet::from(r.attributes()))
            .unwrap_or_default();

        if block.resource().is_some() {
            let ctx = RecordContext::resource(self.kind, schema_url);
            verdict.record_resource(self.resource.compare_resource(&ctx, &resource_attrs));
        }

        for scope in block.scopes() {
            let scope_name = scope.scope().map(|s| s.name.as_str()).unwrap_or_default();
            let scope_attrs = scope
                .scope()
                .map(|s| AttributeSet::from(s.attributes()))
                .unwrap_or_default();

            for signal in scope.signals() {
                let name = signal.name();
                let ctx = RecordContext::signal(self.kind, scope_name, &name, scope.schema_url());
                self.check_signal(signal, &ctx, &scope_attrs, &resource_attrs, verdict);
            }
        }
    }

    fn check_signal<S: Signal>(
        &self,
        signal: &S,
        ctx: &RecordContext<'_>,
        scope: &AttributeSet<'_>,
        resource: &AttributeSet<'_>,
        verdict: &mut ExportVerdict,
    ) {
        let mut matched = false;

        for definition in self.definitions.iter().filter(|d| d.is_name_match(ctx.signal_name)) {
            let mut comparison = Comparison {
                definition,
                ctx,
                scope,
                resource,
            };
            let Some(result) = signal.records(&mut comparison) else {
                tracing::warn!(
                    kind = %self.kind,
                    scope.name = ctx.scope_name,
                    name = ctx.signal_name,
                    "signal carries no data"
                );
                break;
            };
            matched |= result.matched;
            verdict.record(ctx.scope_name, ctx.signal_name, result);
        }

        if !matched {
            if self.report_unmatched {
                tracing::info!(
                    kind = %self.kind,
                    scope.name = ctx.scope_name,
                    name = ctx.signal_name,
                    "unmatched {}",
                    ctx.signal_name
                );
            }
            verdict.record_unmatched(ctx.scope_name, ctx.signal_name);
        }
    }
}

/// Whether a schema URL declares `version`
///
/// Accepts the version itself or a URL ending in it, with or without a
/// leading `v` (`https://opentelemetry.io/schemas/1.24.0` declares `v1.24.0`).
pub fn schema_matches(schema_url: &str, version: &str) -> bool {
    if schema_url == version {
        return true;
    }
    let trimmed = schema_url.trim_end_matches('/');
    let declared = trimmed.rsplit('/').next().unwrap_or(trimmed);
    !declared.is_empty() && declared.trim_start_matches('v') == version.trim_start_matches('v')
}

/// Applies one definition to the records of one signal
struct Comparison<'c, 'a> {
    definition: &'c MatchDefinition,
    ctx: &'c RecordContext<'c>,
    scope: &'c AttributeSet<'a>,
    resource: &'c AttributeSet<'a>,
}

impl RecordVisitor for Comparison<'_, '_> {
    type Output = ComplianceResult;

    fn visit<C: Records + ?Sized>(&mut self, collection: &C) -> ComplianceResult {
        let mut result = ComplianceResult::default();
        for record in collection.records() {
            let attrs = AttributeSet::from(record.attributes());
            if !self.definition.is_attr_match(&attrs) {
                continue;
            }
            result.merge(ComplianceResult {
                matched: true,
                missing: self
                    .definition
                    .compare_attributes(self.ctx, &attrs, self.scope, self.resource),
            });
        }
        result
    }
}
