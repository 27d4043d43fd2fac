//! Semantic-convention registry
//!
//! A registry maps a semantic-convention version (e.g. `v1.24.0`) to the
//! groups defined by that version. Each group is a named list of attribute
//! requirements; match rules select groups by id to build their required
//! attribute sets.
//!
//! ```text
//! registry/<version>/**/*.yaml ──► RegistryLoader ──► GroupRegistry
//!                                                        │
//!                                  resolve(version) ─────┤
//!                                                        ▼
//!                                  SemanticVersion::requirements(group)
//! ```
//!
//! An embedded model for [`DEFAULT_VERSION`] is always available, so the
//! checker runs without an external model directory.

mod group;
mod loader;
mod registry;

pub use group::{AttributeRequirement, Group, RequirementLevel, SemanticVersion};
pub use loader::RegistryLoader;
pub use registry::{GroupRegistry, VersionSource};

/// Version substituted whenever a requested version is absent or unknown
pub const DEFAULT_VERSION: &str = "v1.24.0";
