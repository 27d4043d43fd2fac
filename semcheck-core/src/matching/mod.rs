//! Match Definitions and the comparison engine
//!
//! Configuration rules are resolved once into [`MatchDefinition`]s. At export
//! time each definition answers three questions about a signal:
//!
//! 1. does its name match ([`MatchDefinition::is_name_match`])
//! 2. does a record pass the pre-filter ([`MatchDefinition::is_attr_match`])
//! 3. how many required attributes are missing
//!    ([`MatchDefinition::compare_attributes`])

mod attributes;
mod comparator;
mod definition;
mod matcher;

pub use attributes::AttributeSet;
pub use comparator::{ComplianceResult, RecordContext};
pub use definition::{MatchDefinition, NameRule};
