//! Entity tags and relationship kinds.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The kind of entity a tagged span denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityTag {
    Class,
    Attribute,
    Method,
}

impl EntityTag {
    /// All entity tags, in toolbar order.
    pub const ALL: [EntityTag; 3] = [EntityTag::Class, EntityTag::Attribute, EntityTag::Method];

    /// Upper-case label used in candidate streams and status messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityTag::Class => "CLASS",
            EntityTag::Attribute => "ATTRIBUTE",
            EntityTag::Method => "METHOD",
        }
    }

    /// Returns `true` for tags that must be scoped to a context class.
    pub fn needs_owner(&self) -> bool {
        matches!(self, EntityTag::Attribute | EntityTag::Method)
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "class" => Ok(EntityTag::Class),
            "attribute" => Ok(EntityTag::Attribute),
            "method" => Ok(EntityTag::Method),
            _ => Err(format!(
                "unknown entity tag `{s}`, expected class, attribute or method"
            )),
        }
    }
}

/// The type of a relationship between two classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Association,
    Generalization,
    Composition,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 3] = [
        RelationshipKind::Association,
        RelationshipKind::Generalization,
        RelationshipKind::Composition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Association => "association",
            RelationshipKind::Generalization => "generalization",
            RelationshipKind::Composition => "composition",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "association" => Ok(RelationshipKind::Association),
            "generalization" => Ok(RelationshipKind::Generalization),
            "composition" => Ok(RelationshipKind::Composition),
            _ => Err(format!(
                "unknown relationship type `{s}`, expected association, generalization or composition"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_tag_from_str_is_case_insensitive() {
        assert_eq!("CLASS".parse::<EntityTag>(), Ok(EntityTag::Class));
        assert_eq!("Attribute".parse::<EntityTag>(), Ok(EntityTag::Attribute));
        assert_eq!("method".parse::<EntityTag>(), Ok(EntityTag::Method));
        assert!("relation".parse::<EntityTag>().is_err());
    }

    #[test]
    fn test_relationship_kind_round_trips_through_display() {
        for kind in RelationshipKind::ALL {
            assert_eq!(kind.to_string().parse::<RelationshipKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_needs_owner() {
        assert!(!EntityTag::Class.needs_owner());
        assert!(EntityTag::Attribute.needs_owner());
        assert!(EntityTag::Method.needs_owner());
    }
}
