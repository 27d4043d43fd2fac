//! Checker configuration
//!
//! Sources are layered, later ones winning:
//! 1. [`DEFAULT_CONFIG`] (embedded)
//! 2. A config file (`config.yaml` in the working directory unless a path is given)
//! 3. Environment variables (`SEMCHECK_` prefix, `__` between nested keys)

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{CheckerError, Result};
use crate::matching::NameRule;
use crate::traversal::SignalKind;

/// Configuration used when no file is present
pub const DEFAULT_CONFIG: &str = r#"
server_address: "0.0.0.0:4317"
report_unmatched: false
disable_error: false
resource:
  groups: []
  attributes: []
  ignore: []
metrics: []
traces: []
logs: []
"#;

/// Base name of the config file looked up in the working directory
pub const DEFAULT_CONFIG_NAME: &str = "config";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SEMCHECK";

/// Top-level checker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Address the OTLP gRPC server listens on
    #[serde(default = "default_server_address")]
    pub server_address: String,

    /// Expectations for resource attributes
    #[serde(default)]
    pub resource: ResourceConfig,

    /// Rules applied to metrics
    #[serde(default)]
    pub metrics: Vec<MatchConfig>,

    /// Rules applied to spans
    #[serde(default)]
    pub traces: Vec<MatchConfig>,

    /// Rules applied to log records
    #[serde(default)]
    pub logs: Vec<MatchConfig>,

    /// Log signals no rule applies to
    #[serde(default)]
    pub report_unmatched: bool,

    /// Never fail export calls; only report rejected counts
    #[serde(default)]
    pub disable_error: bool,
}

fn default_server_address() -> String {
    "0.0.0.0:4317".to_string()
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            resource: ResourceConfig::default(),
            metrics: vec![],
            traces: vec![],
            logs: vec![],
            report_unmatched: false,
            disable_error: false,
        }
    }
}

/// Resource-level expectations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Semantic version resources should declare in their schema URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_version: Option<String>,

    /// Groups whose attributes every resource must carry
    #[serde(default)]
    pub groups: Vec<String>,

    /// Additional required attribute keys
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Keys removed from the required set
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// One per-signal match rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Exact signal name, or a wildcard pattern (`http.server.*`); empty matches all
    #[serde(default)]
    pub name: String,

    /// Regular expression on the signal name; takes precedence over `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,

    /// Semantic version the groups are taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_version: Option<String>,

    /// Groups whose attributes matching signals must carry
    #[serde(default)]
    pub groups: Vec<String>,

    /// Additional required attribute keys
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Keys removed from the required set
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Only apply the rule to records already carrying these attributes
    #[serde(default)]
    pub match_attributes: Vec<AttributeFilter>,
}

/// Record-level pre-filter entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeFilter {
    /// Attribute key
    pub name: String,

    /// Expected value; presence alone is checked when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
}

/// Typed value of a pre-filter entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl CheckerConfig {
    /// Load configuration from the layered sources
    ///
    /// An explicit `path` must exist; the default `config.*` file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Yaml));

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: CheckerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse an inline YAML document on top of the defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: CheckerConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Yaml))
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the checker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server_address.trim().is_empty() {
            return Err(CheckerError::InvalidConfig {
                reason: "server_address must not be empty".to_string(),
            });
        }

        for kind in SignalKind::ALL {
            for (idx, rule) in self.rules(kind).iter().enumerate() {
                NameRule::parse(&rule.name, rule.name_pattern.as_deref())?;
                if let Some(filter) = rule.match_attributes.iter().find(|f| f.name.is_empty()) {
                    return Err(CheckerError::InvalidConfig {
                        reason: format!(
                            "{}[{}].match_attributes has an entry without a name (value: {:?})",
                            kind, idx, filter.value
                        ),
                    });
                }
            }
        }

        Ok(())
    }

    /// Rules configured for one signal kind
    pub fn rules(&self, kind: SignalKind) -> &[MatchConfig] {
        match kind {
            SignalKind::Metrics => &self.metrics,
            SignalKind::Traces => &self.traces,
            SignalKind::Logs => &self.logs,
        }
    }
}

impl MatchConfig {
    /// Rule matching `name` exactly (or by wildcard) and requiring `groups`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(attributes.into_iter().map(Into::into));
        self
    }

    pub fn with_semantic_version(mut self, version: impl Into<String>) -> Self {
        self.semantic_version = Some(version.into());
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: Option<FilterValue>) -> Self {
        self.match_attributes.push(AttributeFilter {
            name: name.into(),
            value,
        });
        self
    }
}
