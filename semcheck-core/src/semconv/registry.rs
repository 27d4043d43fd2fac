//! Group Registry - versioned lookup of semantic-convention groups

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{CheckerError, Result};

use super::group::SemanticVersion;
use super::DEFAULT_VERSION;

/// How a requested semantic version was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    /// The requested version exists in the registry
    Requested,
    /// No version was requested; the default was used
    Unspecified,
    /// The requested version is unknown; the default was used
    Unknown,
}

/// Read-only mapping from semantic version to its groups
///
/// Built once at startup and shared across export calls without locking.
#[derive(Debug, Clone)]
pub struct GroupRegistry {
    versions: HashMap<String, SemanticVersion>,
    default_version: String,
}

impl GroupRegistry {
    /// Build a registry from loaded versions
    ///
    /// The default version is `default_version` when given (it must exist),
    /// otherwise [`DEFAULT_VERSION`] when loaded, otherwise the highest
    /// version by numeric ordering.
    pub fn from_versions(
        versions: HashMap<String, SemanticVersion>,
        default_version: Option<String>,
    ) -> Result<Self> {
        if versions.is_empty() {
            return Err(CheckerError::InvalidRegistry {
                reason: "no semantic versions loaded".to_string(),
            });
        }

        let default_version = match default_version {
            Some(version) if versions.contains_key(&version) => version,
            Some(version) => {
                return Err(CheckerError::InvalidRegistry {
                    reason: format!("default version '{}' is not loaded", version),
                })
            }
            None if versions.contains_key(DEFAULT_VERSION) => DEFAULT_VERSION.to_string(),
            None => versions
                .keys()
                .max_by(|a, b| compare_versions(a, b))
                .cloned()
                .ok_or_else(|| CheckerError::InvalidRegistry {
                    reason: "no semantic versions loaded".to_string(),
                })?,
        };

        Ok(Self {
            versions,
            default_version,
        })
    }

    /// Registry containing only the embedded model
    pub fn builtin() -> Result<Self> {
        super::RegistryLoader::new().build()
    }

    /// Look up an exact version
    pub fn get(&self, version: &str) -> Option<&SemanticVersion> {
        self.versions.get(version)
    }

    /// The version used whenever a requested one is absent or unknown
    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// Resolve a requested version, substituting the default when needed
    pub fn resolve(&self, requested: Option<&str>) -> (&SemanticVersion, VersionSource) {
        let source = match requested.filter(|v| !v.is_empty()) {
            Some(version) => match self.versions.get(version) {
                Some(found) => return (found, VersionSource::Requested),
                None => VersionSource::Unknown,
            },
            None => VersionSource::Unspecified,
        };
        (&self.versions[&self.default_version], source)
    }

    /// Loaded version identifiers, lowest first
    pub fn versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self.versions.keys().map(|v| v.as_str()).collect();
        versions.sort_by(|a, b| compare_versions(a, b));
        versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Numeric ordering of `v1.24.0`-style identifiers
fn compare_versions(a: &str, b: &str) -> Ordering {
    version_key(a).cmp(&version_key(b)).then_with(|| a.cmp(b))
}

fn version_key(version: &str) -> Vec<u64> {
    version
        .trim_start_matches('v')
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}
