//! Registry Loader
//!
//! Loads semantic-convention models from:
//! - YAML strings
//! - YAML files
//! - Version directories (`<root>/<version>/**/*.yaml`)
//! - The model embedded in this crate

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CheckerError, Result};

use super::group::{ModelFile, SemanticVersion};
use super::registry::GroupRegistry;
use super::DEFAULT_VERSION;

const BUILTIN_MODEL: &str = include_str!("builtin.yaml");

/// Collects semantic versions and builds an immutable [`GroupRegistry`]
pub struct RegistryLoader {
    /// Loaded versions by identifier
    versions: HashMap<String, SemanticVersion>,

    /// Explicit default version
    default_version: Option<String>,

    /// Whether the embedded model is added for [`DEFAULT_VERSION`]
    include_builtin: bool,
}

impl RegistryLoader {
    /// Create a loader that includes the embedded model
    pub fn new() -> Self {
        Self {
            versions: HashMap::new(),
            default_version: None,
            include_builtin: true,
        }
    }

    /// Do not add the embedded model
    pub fn without_builtin(mut self) -> Self {
        self.include_builtin = false;
        self
    }

    /// Use this version whenever a requested one is absent or unknown
    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = Some(version.into());
        self
    }

    /// Load groups for `version` from a YAML string
    ///
    /// Returns the number of groups added. Groups are merged into anything
    /// already loaded for the same version.
    pub fn load_from_yaml(&mut self, version: &str, yaml: &str) -> Result<usize> {
        let model: ModelFile = serde_yaml::from_str(yaml)?;
        let target = self
            .versions
            .entry(version.to_string())
            .or_insert_with(|| SemanticVersion::new(version));

        let count = model.groups.len();
        for def in model.groups {
            target.insert_group(def.into_group()?)?;
        }
        Ok(count)
    }

    /// Load groups for `version` from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, version: &str, path: P) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CheckerError::RegistryLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        self.load_from_yaml(version, &content).map_err(|e| match e {
            CheckerError::Yaml(err) => CheckerError::RegistryLoad {
                path: path.display().to_string(),
                reason: err.to_string(),
            },
            other => other,
        })
    }

    /// Load every `*.yaml` / `*.yml` file below `dir` as one version
    pub fn load_version_directory<P: AsRef<Path>>(
        &mut self,
        version: &str,
        dir: P,
    ) -> Result<usize> {
        let mut count = 0;
        for path in model_files(dir.as_ref())? {
            count += self.load_from_file(version, &path)?;
        }
        self.versions
            .entry(version.to_string())
            .or_insert_with(|| SemanticVersion::new(version));
        Ok(count)
    }

    /// Load a registry root where every sub-directory is one version
    ///
    /// Expected structure:
    /// ```text
    /// registry/
    /// ├── v1.24.0/
    /// │   ├── http.yaml
    /// │   └── resource/service.yaml
    /// └── v1.25.0/
    ///     └── ...
    /// ```
    pub fn load_directory<P: AsRef<Path>>(&mut self, root: P) -> Result<Vec<String>> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CheckerError::RegistryLoad {
                path: root.display().to_string(),
                reason: "Not a directory".to_string(),
            });
        }

        let entries = fs::read_dir(root).map_err(|e| CheckerError::RegistryLoad {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut loaded = vec![];
        for dir in dirs {
            let Some(version) = dir.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            let groups = self.load_version_directory(&version, &dir)?;
            tracing::debug!(version = %version, groups, "loaded semantic version");
            loaded.push(version);
        }

        Ok(loaded)
    }

    /// Finish loading
    pub fn build(mut self) -> Result<GroupRegistry> {
        if self.include_builtin && !self.versions.contains_key(DEFAULT_VERSION) {
            self.load_from_yaml(DEFAULT_VERSION, BUILTIN_MODEL)?;
        }
        GroupRegistry::from_versions(self.versions, self.default_version)
    }
}

impl Default for RegistryLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Model files below `dir`, sorted for deterministic load order
fn model_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for extension in ["yaml", "yml"] {
        let pattern = format!("{}/**/*.{}", dir.display(), extension);
        let paths = glob::glob(&pattern).map_err(|e| CheckerError::RegistryLoad {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        for entry in paths {
            let path = entry.map_err(|e| CheckerError::RegistryLoad {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
            if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTTP_MODEL: &str = r#"
groups:
  - id: attributes.http.common
    type: attribute_group
    prefix: http
    attributes:
      - id: request.method
        requirement_level: required
  - id: metric.http.server.request.duration
    type: metric
    metric_name: http.server.request.duration
    extends: attributes.http.common
    attributes:
      - ref: url.scheme
        requirement_level: required
"#;

    #[test]
    fn test_load_from_yaml() {
        let mut loader = RegistryLoader::new().without_builtin();
        let count = loader.load_from_yaml("v1.0.0", HTTP_MODEL).unwrap();
        assert_eq!(count, 2);

        let registry = loader.build().unwrap();
        let version = registry.get("v1.0.0").unwrap();
        let reqs = version
            .requirements("metric.http.server.request.duration")
            .unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].name, "http.request.method");
        assert_eq!(reqs[1].name, "url.scheme");
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut loader = RegistryLoader::new();
        let result = loader.load_from_yaml("v1.0.0", "groups: [ {");
        assert!(matches!(result, Err(CheckerError::Yaml(_))));
    }

    #[test]
    fn test_builtin_model_parses() {
        let registry = GroupRegistry::builtin().unwrap();
        assert_eq!(registry.default_version(), DEFAULT_VERSION);

        let version = registry.get(DEFAULT_VERSION).unwrap();
        assert!(!version.is_empty());
        let reqs = version
            .requirements("metric.http.server.request.duration")
            .unwrap();
        assert!(reqs.iter().any(|r| r.name == "http.request.method" && r.level.is_required()));
    }

    #[test]
    fn test_load_directory() {
        let root = tempfile::tempdir().unwrap();
        let v1 = root.path().join("v1.0.0");
        let nested = root.path().join("v2.0.0").join("http");
        fs::create_dir_all(&v1).unwrap();
        fs::create_dir_all(&nested).unwrap();
        fs::write(v1.join("http.yaml"), HTTP_MODEL).unwrap();
        fs::write(
            nested.join("client.yml"),
            "groups:\n  - id: metric.http.client.request.duration\n",
        )
        .unwrap();
        fs::write(root.path().join("README.md"), "not a version").unwrap();

        let mut loader = RegistryLoader::new().without_builtin();
        let loaded = loader.load_directory(root.path()).unwrap();
        assert_eq!(loaded, vec!["v1.0.0", "v2.0.0"]);

        let registry = loader.build().unwrap();
        assert_eq!(registry.default_version(), "v2.0.0");
        assert_eq!(registry.get("v1.0.0").unwrap().len(), 2);
        assert!(registry
            .get("v2.0.0")
            .unwrap()
            .group("metric.http.client.request.duration")
            .is_some());
    }

    #[test]
    fn test_load_directory_requires_directory() {
        let mut loader = RegistryLoader::new();
        let err = loader.load_directory("/definitely/not/here").unwrap_err();
        assert_eq!(err.error_code(), "REGISTRY_LOAD_ERROR");
    }

    #[test]
    fn test_bad_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.yaml");
        fs::write(&file, "groups: [ {").unwrap();

        let mut loader = RegistryLoader::new();
        let err = loader.load_from_file("v1.0.0", &file).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
