//! Canonical entities - deduplicated organizations and roles

use crate::Confidence;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Kind of named entity being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Employers, institutions, prize committees
    Organization,
    /// Titles and positions
    Role,
}

impl EntityType {
    /// Prefix used for canonical ids of this type
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Organization => "org",
            Self::Role => "role",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organization => write!(f, "organization"),
            Self::Role => write!(f, "role"),
        }
    }
}

/// Identifier of a canonical entity, stable for identical sorted input
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Build the id for the `ordinal`-th cluster (1-based) of a type
    ///
    /// # Examples
    ///
    /// ```
    /// use plutarch_domain::{CanonicalId, EntityType};
    ///
    /// assert_eq!(CanonicalId::numbered(EntityType::Organization, 3).as_str(), "org_003");
    /// ```
    pub fn numbered(entity_type: EntityType, ordinal: usize) -> Self {
        Self(format!("{}_{:03}", entity_type.id_prefix(), ordinal))
    }

    /// Wrap an existing id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deduplicated real-world organization or role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    /// Stable identifier
    pub canonical_id: CanonicalId,

    /// Preferred display name
    pub canonical_name: String,

    /// Organization or role
    pub entity_type: EntityType,

    /// Every surface form mapped to this entity
    pub aliases: BTreeSet<String>,

    /// Indices of the claims that mentioned any alias
    pub member_claim_indices: BTreeSet<usize>,

    /// Confidence in the chosen canonical name
    pub confidence: Confidence,

    /// Why this name was chosen (or why a fallback was taken)
    #[serde(default)]
    pub reasoning: String,
}

/// Alias-to-entity index for one entity type within one person's scope
///
/// Every alias maps to exactly one canonical id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntityMapRepr", into = "EntityMapRepr")]
pub struct EntityMap {
    entity_type: EntityType,
    entities: Vec<CanonicalEntity>,
    alias_index: BTreeMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct EntityMapRepr {
    entity_type: EntityType,
    entities: Vec<CanonicalEntity>,
}

impl From<EntityMapRepr> for EntityMap {
    fn from(repr: EntityMapRepr) -> Self {
        let mut map = EntityMap::new(repr.entity_type);
        for entity in repr.entities {
            map.insert(entity);
        }
        map
    }
}

impl From<EntityMap> for EntityMapRepr {
    fn from(map: EntityMap) -> Self {
        Self {
            entity_type: map.entity_type,
            entities: map.entities,
        }
    }
}

impl EntityMap {
    /// Create an empty map
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            entities: Vec::new(),
            alias_index: BTreeMap::new(),
        }
    }

    /// Add an entity and index its aliases
    ///
    /// An alias already owned by an earlier entity keeps its first owner, so
    /// the alias-to-id mapping stays a function.
    pub fn insert(&mut self, entity: CanonicalEntity) {
        let position = self.entities.len();
        for alias in &entity.aliases {
            self.alias_index.entry(alias.clone()).or_insert(position);
        }
        self.entities.push(entity);
    }

    /// Entity type held by this map
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Canonical id for a surface form
    pub fn canonical_id(&self, alias: &str) -> Option<&CanonicalId> {
        self.resolve(alias).map(|e| &e.canonical_id)
    }

    /// Full entity for a surface form
    pub fn resolve(&self, alias: &str) -> Option<&CanonicalEntity> {
        self.alias_index.get(alias).map(|&i| &self.entities[i])
    }

    /// Entity by canonical id
    pub fn get(&self, id: &CanonicalId) -> Option<&CanonicalEntity> {
        self.entities.iter().find(|e| &e.canonical_id == id)
    }

    /// All entities in id order
    pub fn entities(&self) -> &[CanonicalEntity] {
        &self.entities
    }

    /// Number of canonical entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entities are held
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of indexed aliases
    pub fn alias_count(&self) -> usize {
        self.alias_index.len()
    }
}
