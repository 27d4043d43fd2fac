//! Semantic-convention groups and attribute requirements

use std::collections::{HashMap, HashSet};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::{CheckerError, Result};

/// How strongly a convention asks for an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequirementLevel {
    /// Must always be present
    Required,
    /// Must be present when the convention's condition holds
    ConditionallyRequired,
    /// Should be present
    #[default]
    Recommended,
    /// Only present when the user asks for it
    OptIn,
}

impl RequirementLevel {
    const NAMES: &'static [&'static str] =
        &["required", "conditionally_required", "recommended", "opt_in"];

    /// Parse the model's spelling of a level
    pub fn parse(level: &str) -> Option<Self> {
        match level {
            "required" => Some(RequirementLevel::Required),
            "conditionally_required" => Some(RequirementLevel::ConditionallyRequired),
            "recommended" => Some(RequirementLevel::Recommended),
            "opt_in" => Some(RequirementLevel::OptIn),
            _ => None,
        }
    }

    /// Whether a missing attribute at this level counts as a violation
    pub fn is_required(&self) -> bool {
        matches!(self, RequirementLevel::Required)
    }
}

// The model writes either `requirement_level: required` or
// `requirement_level: { conditionally_required: "<condition>" }`.
impl<'de> Deserialize<'de> for RequirementLevel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Detailed(HashMap<String, serde_yaml::Value>),
        }

        let key = match Raw::deserialize(deserializer)? {
            Raw::Plain(level) => level,
            Raw::Detailed(map) => map
                .into_keys()
                .next()
                .ok_or_else(|| D::Error::custom("empty requirement_level"))?,
        };

        RequirementLevel::parse(&key).ok_or_else(|| D::Error::unknown_variant(&key, Self::NAMES))
    }
}

/// One attribute a group asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRequirement {
    /// Fully qualified attribute key, e.g. `http.request.method`
    pub name: String,
    /// Requirement level declared by the group
    pub level: RequirementLevel,
}

impl AttributeRequirement {
    pub fn new(name: impl Into<String>, level: RequirementLevel) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }

    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name, RequirementLevel::Required)
    }
}

/// A named bundle of attribute requirements within one semantic version
#[derive(Debug, Clone)]
pub struct Group {
    /// Group identifier, e.g. `metric.http.server.request.duration`
    pub id: String,
    /// Parent group whose attributes this group inherits
    pub extends: Option<String>,
    /// Attribute requirements in declaration order
    pub attributes: Vec<AttributeRequirement>,
}

/// All groups of one semantic-convention version
#[derive(Debug, Clone, Default)]
pub struct SemanticVersion {
    version: String,
    groups: HashMap<String, Group>,
}

impl SemanticVersion {
    /// Create an empty version
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            groups: HashMap::new(),
        }
    }

    /// Version identifier, e.g. `v1.24.0`
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Add a group; ids must be unique within a version
    pub fn insert_group(&mut self, group: Group) -> Result<()> {
        if self.groups.contains_key(&group.id) {
            return Err(CheckerError::InvalidRegistry {
                reason: format!(
                    "duplicate group '{}' in version '{}'",
                    group.id, self.version
                ),
            });
        }
        self.groups.insert(group.id.clone(), group);
        Ok(())
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Attribute requirements of a group including everything it extends
    ///
    /// Inherited attributes come first; a group redeclaring an inherited
    /// attribute overrides its level.
    pub fn requirements(&self, group_id: &str) -> Result<Vec<AttributeRequirement>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(group_id);

        while let Some(id) = next {
            if !seen.insert(id) {
                return Err(CheckerError::InvalidRegistry {
                    reason: format!("cyclic extends chain at group '{}'", id),
                });
            }
            let group = self.groups.get(id).ok_or_else(|| CheckerError::GroupNotFound {
                group_id: id.to_string(),
                version: self.version.clone(),
            })?;
            chain.push(group);
            next = group.extends.as_deref();
        }

        let mut requirements: Vec<AttributeRequirement> = Vec::new();
        for group in chain.iter().rev() {
            for attr in &group.attributes {
                match requirements.iter_mut().find(|r| r.name == attr.name) {
                    Some(existing) => existing.level = attr.level,
                    None => requirements.push(attr.clone()),
                }
            }
        }

        Ok(requirements)
    }
}

/// A semantic-convention model file
#[derive(Debug, Deserialize)]
pub(crate) struct ModelFile {
    #[serde(default)]
    pub groups: Vec<GroupDef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupDef {
    pub id: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttributeDef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub requirement_level: RequirementLevel,
}

impl GroupDef {
    /// Resolve attribute names against the group prefix
    pub(crate) fn into_group(self) -> Result<Group> {
        let prefix = self.prefix.as_deref().filter(|p| !p.is_empty());
        let mut attributes = Vec::with_capacity(self.attributes.len());

        for attr in self.attributes {
            let name = match (attr.reference, attr.id) {
                (Some(reference), _) => reference,
                (None, Some(id)) => match prefix {
                    Some(prefix) => format!("{}.{}", prefix, id),
                    None => id,
                },
                (None, None) => {
                    return Err(CheckerError::InvalidRegistry {
                        reason: format!(
                            "attribute in group '{}' has neither id nor ref",
                            self.id
                        ),
                    })
                }
            };
            attributes.push(AttributeRequirement::new(name, attr.requirement_level));
        }

        Ok(Group {
            id: self.id,
            extends: self.extends,
            attributes,
        })
    }
}
