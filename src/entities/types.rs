// Entity vocabulary — the categories a story can mention and the map that
// holds what was found.
//
// Everything here is ordered (BTreeMap/BTreeSet) so that extraction output,
// similarity input, and serialized reports are identical across runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kinds of real-world reference the extractors recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Country,
    ThreatActor,
    Malware,
    Cve,
    Sector,
    Technique,
    Person,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 7] = [
        EntityCategory::Country,
        EntityCategory::ThreatActor,
        EntityCategory::Malware,
        EntityCategory::Cve,
        EntityCategory::Sector,
        EntityCategory::Technique,
        EntityCategory::Person,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Country => "country",
            EntityCategory::ThreatActor => "threat_actor",
            EntityCategory::Malware => "malware",
            EntityCategory::Cve => "cve",
            EntityCategory::Sector => "sector",
            EntityCategory::Technique => "technique",
            EntityCategory::Person => "person",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        EntityCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown entity category: {s}"))
    }
}

/// Category -> normalized entity values. Categories with no matches are
/// never present as empty sets.
pub type EntityMap = BTreeMap<EntityCategory, BTreeSet<String>>;

/// A single (category, value) pair — the key of the connection index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub category: EntityCategory,
    pub value: String,
}

impl EntityKey {
    pub fn new(category: EntityCategory, value: impl Into<String>) -> Self {
        Self {
            category,
            value: value.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.value)
    }
}

/// Add a value under a category, creating the set on first use.
pub fn insert_entity(map: &mut EntityMap, category: EntityCategory, value: impl Into<String>) {
    map.entry(category).or_default().insert(value.into());
}

/// Merge every entity of `other` into `map`.
pub fn merge_entities(map: &mut EntityMap, other: EntityMap) {
    for (category, values) in other {
        if !values.is_empty() {
            map.entry(category).or_default().extend(values);
        }
    }
}

/// All entity values with their categories discarded.
pub fn flatten_values(map: &EntityMap) -> BTreeSet<&str> {
    map.values()
        .flat_map(|values| values.iter().map(String::as_str))
        .collect()
}

/// Iterate every (category, value) pair in category order.
pub fn entity_keys(map: &EntityMap) -> impl Iterator<Item = EntityKey> + '_ {
    map.iter().flat_map(|(category, values)| {
        values
            .iter()
            .map(move |value| EntityKey::new(*category, value.clone()))
    })
}

/// Total number of (category, value) pairs.
pub fn entity_count(map: &EntityMap) -> usize {
    map.values().map(BTreeSet::len).sum()
}
