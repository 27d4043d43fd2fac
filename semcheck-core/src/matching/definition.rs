//! Match Definitions - resolved, immutable rules
//!
//! A [`MatchDefinition`] is built once per configured rule at startup. It
//! binds a signal-name rule and an optional record pre-filter to the set of
//! attributes matching signals must carry, taken from registry groups of the
//! rule's semantic version.

use crate::config::{AttributeFilter, MatchConfig, ResourceConfig};
use crate::error::{CheckerError, Result};
use crate::semconv::{GroupRegistry, VersionSource};

/// How a definition selects signals by name
#[derive(Debug, Clone)]
pub enum NameRule {
    /// Every signal
    Any,
    /// Exact string equality
    Exact(String),
    /// Shell-style wildcard (`http.server.*`)
    Wildcard(glob::Pattern),
    /// Unanchored regular expression
    Regex(regex::Regex),
}

impl NameRule {
    /// Build a rule from a configured name and optional regex
    ///
    /// The regex takes precedence. A name containing `*`, `?` or `[` is a
    /// wildcard; an empty name matches everything.
    pub fn parse(name: &str, pattern: Option<&str>) -> Result<Self> {
        if let Some(pattern) = pattern.filter(|p| !p.is_empty()) {
            let regex = regex::Regex::new(pattern).map_err(|e| CheckerError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(NameRule::Regex(regex));
        }

        if name.is_empty() {
            return Ok(NameRule::Any);
        }

        if name.contains(['*', '?', '[']) {
            let glob = glob::Pattern::new(name).map_err(|e| CheckerError::InvalidPattern {
                pattern: name.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(NameRule::Wildcard(glob));
        }

        Ok(NameRule::Exact(name.to_string()))
    }

    /// Human-readable form for log lines
    pub fn describe(&self) -> &str {
        match self {
            NameRule::Any => "*",
            NameRule::Exact(name) => name,
            NameRule::Wildcard(pattern) => pattern.as_str(),
            NameRule::Regex(regex) => regex.as_str(),
        }
    }
}

/// Resolved rule binding a name rule to a required-attribute set
#[derive(Debug, Clone)]
pub struct MatchDefinition {
    pub(crate) name_rule: NameRule,
    pub(crate) filter: Vec<AttributeFilter>,
    pub(crate) required: Vec<String>,
    pub(crate) recommended: Vec<String>,
    semantic_version: String,
    schema_version: Option<String>,
}

impl MatchDefinition {
    /// Definition with an explicit required set and no registry lookup
    pub fn new<I, S>(name_rule: NameRule, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut definition = Self {
            name_rule,
            filter: vec![],
            required: vec![],
            recommended: vec![],
            semantic_version: String::new(),
            schema_version: None,
        };
        for key in required {
            definition.require(key.into());
        }
        definition
    }

    /// Add a record pre-filter entry
    pub fn with_filter(mut self, filter: AttributeFilter) -> Self {
        self.filter.push(filter);
        self
    }

    /// Resolve a per-signal rule against the registry
    pub fn resolve(rule: &MatchConfig, registry: &GroupRegistry) -> Result<Self> {
        let name_rule = NameRule::parse(&rule.name, rule.name_pattern.as_deref())?;
        let mut definition = Self::new(name_rule, Vec::<String>::new());
        definition.filter = rule.match_attributes.clone();

        let label = definition.name_rule.describe().to_string();
        definition.load_requirements(
            &label,
            rule.semantic_version.as_deref(),
            &rule.groups,
            &rule.attributes,
            &rule.ignore,
            registry,
        )?;
        Ok(definition)
    }

    /// Resolve the resource-level expectations against the registry
    ///
    /// When a semantic version is configured, resources are also expected to
    /// declare it in their schema URL.
    pub fn resolve_resource(config: &ResourceConfig, registry: &GroupRegistry) -> Result<Self> {
        let mut definition = Self::new(NameRule::Any, Vec::<String>::new());
        definition.load_requirements(
            "resource",
            config.semantic_version.as_deref(),
            &config.groups,
            &config.attributes,
            &config.ignore,
            registry,
        )?;

        if config.semantic_version.as_deref().is_some_and(|v| !v.is_empty()) {
            definition.schema_version = Some(definition.semantic_version.clone());
        }
        Ok(definition)
    }

    fn load_requirements(
        &mut self,
        label: &str,
        requested: Option<&str>,
        groups: &[String],
        attributes: &[String],
        ignore: &[String],
        registry: &GroupRegistry,
    ) -> Result<()> {
        let (version, source) = registry.resolve(requested);
        match source {
            VersionSource::Requested => {}
            VersionSource::Unspecified => tracing::debug!(
                rule = %label,
                version = %version.version(),
                "no semantic version configured, using default"
            ),
            VersionSource::Unknown => tracing::warn!(
                rule = %label,
                requested = requested.unwrap_or_default(),
                version = %version.version(),
                "unknown semantic version, using default"
            ),
        }
        self.semantic_version = version.version().to_string();

        for group_id in groups {
            for requirement in version.requirements(group_id)? {
                if ignore.contains(&requirement.name) {
                    continue;
                }
                if requirement.level.is_required() {
                    self.require(requirement.name);
                } else if !self.recommended.contains(&requirement.name) {
                    self.recommended.push(requirement.name);
                }
            }
        }

        for key in attributes {
            if !ignore.contains(key) {
                self.require(key.clone());
            }
        }

        let required = &self.required;
        self.recommended.retain(|key| !required.contains(key));

        tracing::debug!(
            rule = %label,
            version = %self.semantic_version,
            required = self.required.len(),
            recommended = self.recommended.len(),
            "resolved match definition"
        );
        Ok(())
    }

    fn require(&mut self, key: String) {
        if !self.required.contains(&key) {
            self.required.push(key);
        }
    }

    pub fn name_rule(&self) -> &NameRule {
        &self.name_rule
    }

    /// Keys that must be present, in resolution order
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Keys that should be present; never counted as missing
    pub fn recommended(&self) -> &[String] {
        &self.recommended
    }

    pub fn filter(&self) -> &[AttributeFilter] {
        &self.filter
    }

    /// Version the required set was taken from
    pub fn semantic_version(&self) -> &str {
        &self.semantic_version
    }

    /// Version resources must declare in their schema URL, if any
    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semconv::RegistryLoader;
    use crate::{Checker, SignalKind};
    use opentelemetry_proto::tonic::metrics::v1::{
        metric, Gauge, Metric, NumberDataPoint, ResourceMetrics, ScopeMetrics,
    };
    use tracing_test::traced_test;

    const MODEL_V1: &str = r#"
groups:
  - id: attributes.http
    prefix: http
    attributes:
      - id: method
        requirement_level: required
      - id: status_code
        requirement_level: required
      - id: flavor
  - id: metric.http.server.duration
    extends: attributes.http
    attributes:
      - ref: http.route
        requirement_level: opt_in
"#;

    const MODEL_V2: &str = r#"
groups:
  - id: metric.http.server.duration
    attributes:
      - ref: http.request.method
        requirement_level: required
"#;

    fn registry() -> GroupRegistry {
        let mut loader = RegistryLoader::new()
            .without_builtin()
            .with_default_version("v1.0.0");
        loader.load_from_yaml("v1.0.0", MODEL_V1).unwrap();
        loader.load_from_yaml("v2.0.0", MODEL_V2).unwrap();
        loader.build().unwrap()
    }

    #[test]
    fn test_name_rule_parse() {
        assert!(matches!(NameRule::parse("", None).unwrap(), NameRule::Any));
        assert!(matches!(
            NameRule::parse("http.server.duration", None).unwrap(),
            NameRule::Exact(_)
        ));
        assert!(matches!(
            NameRule::parse("http.*", None).unwrap(),
            NameRule::Wildcard(_)
        ));
        assert!(matches!(
            NameRule::parse("http.*", Some("^rpc\\.")).unwrap(),
            NameRule::Regex(_)
        ));
    }

    #[test]
    fn test_invalid_patterns() {
        let err = NameRule::parse("", Some("(unclosed")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PATTERN");

        let err = NameRule::parse("http.[", None).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PATTERN");
    }

    #[test]
    fn test_resolve_groups() {
        let rule = MatchConfig::new("http.server.duration")
            .with_groups(["metric.http.server.duration"])
            .with_semantic_version("v1.0.0");
        let def = MatchDefinition::resolve(&rule, &registry()).unwrap();

        assert_eq!(def.required(), &["http.method", "http.status_code"]);
        assert_eq!(def.recommended(), &["http.flavor", "http.route"]);
        assert_eq!(def.semantic_version(), "v1.0.0");
        assert!(def.schema_version().is_none());
    }

    #[test]
    fn test_resolve_selects_version() {
        let rule = MatchConfig::new("http.server.duration")
            .with_groups(["metric.http.server.duration"])
            .with_semantic_version("v2.0.0");
        let def = MatchDefinition::resolve(&rule, &registry()).unwrap();
        assert_eq!(def.required(), &["http.request.method"]);
    }

    #[test]
    fn test_unknown_version_falls_back_to_default() {
        let registry = registry();
        let unknown = MatchConfig::new("http.server.duration")
            .with_groups(["metric.http.server.duration"])
            .with_semantic_version("v1.99");
        let default = MatchConfig::new("http.server.duration")
            .with_groups(["metric.http.server.duration"]);

        let from_unknown = MatchDefinition::resolve(&unknown, &registry).unwrap();
        let from_default = MatchDefinition::resolve(&default, &registry).unwrap();

        assert_eq!(from_unknown.semantic_version(), registry.default_version());
        assert_eq!(from_unknown.required(), from_default.required());
        assert_eq!(from_unknown.recommended(), from_default.recommended());
    }

    fn fallback_warnings(lines: &[&str]) -> usize {
        lines
            .iter()
            .filter(|l| l.contains("unknown semantic version, using default"))
            .count()
    }

    #[test]
    #[traced_test]
    fn test_unknown_version_warns_once_at_resolve() {
        let rule = MatchConfig::new("http.server.duration")
            .with_groups(["metric.http.server.duration"])
            .with_semantic_version("v1.99");
        let def = MatchDefinition::resolve(&rule, &registry()).unwrap();

        logs_assert(|lines: &[&str]| match fallback_warnings(lines) {
            1 => Ok(()),
            n => Err(format!("expected one fallback warning after resolve, got {}", n)),
        });
        assert!(logs_contain("requested=\"v1.99\""));

        let payload = vec![ResourceMetrics {
            scope_metrics: vec![ScopeMetrics {
                metrics: vec![Metric {
                    name: "http.server.duration".to_string(),
                    data: Some(metric::Data::Gauge(Gauge {
                        data_points: vec![NumberDataPoint::default(); 3],
                        ..Default::default()
                    })),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }];
        let checker = Checker::from_definitions(
            SignalKind::Metrics,
            MatchDefinition::new(NameRule::Any, Vec::<String>::new()),
            vec![def],
        );
        for _ in 0..2 {
            assert_eq!(checker.check(&payload).missing(), 3 * 2);
        }

        logs_assert(|lines: &[&str]| match fallback_warnings(lines) {
            1 => Ok(()),
            n => Err(format!("fallback warning repeated during check: {}", n)),
        });
    }

    #[test]
    #[traced_test]
    fn test_known_version_does_not_warn() {
        let rule = MatchConfig::new("http.server.duration")
            .with_groups(["metric.http.server.duration"])
            .with_semantic_version("v2.0.0");
        MatchDefinition::resolve(&rule, &registry()).unwrap();
        assert!(!logs_contain("unknown semantic version"));
    }

    #[test]
    fn test_extra_and_ignored_attributes() {
        let mut rule = MatchConfig::new("http.server.duration")
            .with_groups(["metric.http.server.duration"])
            .with_attributes(["service.tier", "http.flavor"]);
        rule.ignore = vec!["http.status_code".to_string(), "http.route".to_string()];

        let def = MatchDefinition::resolve(&rule, &registry()).unwrap();
        assert_eq!(def.required(), &["http.method", "service.tier", "http.flavor"]);
        assert!(def.recommended().is_empty());
    }

    #[test]
    fn test_unknown_group_is_fatal() {
        let rule = MatchConfig::new("x").with_groups(["no.such.group"]);
        let err = MatchDefinition::resolve(&rule, &registry()).unwrap_err();
        assert!(matches!(err, CheckerError::GroupNotFound { .. }));
    }

    #[test]
    fn test_resource_schema_version() {
        let registry = registry();

        let config = ResourceConfig {
            semantic_version: Some("v2.0.0".to_string()),
            attributes: vec!["service.name".to_string()],
            ..Default::default()
        };
        let def = MatchDefinition::resolve_resource(&config, &registry).unwrap();
        assert_eq!(def.schema_version(), Some("v2.0.0"));
        assert_eq!(def.required(), &["service.name"]);

        let config = ResourceConfig {
            semantic_version: Some("v1.99".to_string()),
            ..Default::default()
        };
        let def = MatchDefinition::resolve_resource(&config, &registry).unwrap();
        assert_eq!(def.schema_version(), Some("v1.0.0"));

        let def = MatchDefinition::resolve_resource(&ResourceConfig::default(), &registry).unwrap();
        assert_eq!(def.schema_version(), None);
    }
}
