// Entity dictionary — the category -> alias tables consulted by extraction.
//
// The tables are data, not code: a bundled default lives in
// data/entities.json and a user file with the same shape can replace it.
// Two kinds of entry exist:
//
//   aliases:  category -> canonical value -> surface forms
//   patterns: category -> regular expressions (e.g. CVE identifiers)
//
// Alias matching is case-insensitive and word-boundary aware. Runs of
// whitespace or hyphens are interchangeable, so "spear-phishing" and
// "spear phishing" resolve to the same canonical value. Anything not listed
// is not recognized.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{insert_entity, EntityCategory, EntityMap};

const BUNDLED_DICTIONARY: &str = include_str!("../../data/entities.json");

/// Raw dictionary as loaded from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDictionary {
    #[serde(default)]
    pub aliases: BTreeMap<EntityCategory, BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub patterns: BTreeMap<EntityCategory, Vec<String>>,
}

impl EntityDictionary {
    /// The dictionary shipped with the crate.
    pub fn bundled() -> Result<Self> {
        serde_json::from_str(BUNDLED_DICTIONARY).context("Bundled entity dictionary is invalid")
    }

    /// Load a dictionary file with the same shape as the bundled one.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read entity dictionary {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse entity dictionary {}", path.display()))
    }

    /// Add a surface form for a canonical value, creating both if needed.
    pub fn add_alias(&mut self, category: EntityCategory, canonical: &str, alias: &str) {
        self.aliases
            .entry(category)
            .or_default()
            .entry(canonical.to_string())
            .or_default()
            .push(alias.to_string());
    }

    /// Build the matchers. Fails if a pattern is not a valid regex.
    pub fn compile(&self) -> Result<CompiledDictionary> {
        let mut alias_matchers = Vec::new();

        for (category, table) in &self.aliases {
            // Every canonical value is implicitly one of its own aliases.
            let mut lookup: HashMap<String, String> = HashMap::new();
            for (canonical, aliases) in table {
                let canonical_key = normalize_surface(canonical);
                if canonical_key.is_empty() {
                    continue;
                }
                lookup.insert(canonical_key.clone(), canonical_key.clone());
                for alias in aliases {
                    let alias_key = normalize_surface(alias);
                    if !alias_key.is_empty() {
                        lookup.insert(alias_key, canonical_key.clone());
                    }
                }
            }

            if lookup.is_empty() {
                continue;
            }

            // Longest alias first so "north korean" wins over "north korea"
            // in the leftmost-first alternation.
            let mut surfaces: Vec<&String> = lookup.keys().collect();
            surfaces.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

            let alternation = surfaces
                .iter()
                .map(|s| alias_pattern(s))
                .collect::<Vec<_>>()
                .join("|");
            let regex = Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).with_context(|| {
                format!("Failed to compile alias table for category {category}")
            })?;

            alias_matchers.push(AliasMatcher {
                category: *category,
                regex,
                lookup,
            });
        }

        let mut pattern_matchers = Vec::new();
        for (category, patterns) in &self.patterns {
            for pattern in patterns {
                let regex = Regex::new(&format!(r"(?i)\b(?:{pattern})\b")).with_context(|| {
                    format!("Invalid {category} pattern in entity dictionary: {pattern}")
                })?;
                pattern_matchers.push(PatternMatcher {
                    category: *category,
                    regex,
                });
            }
        }

        debug!(
            alias_categories = alias_matchers.len(),
            patterns = pattern_matchers.len(),
            "Compiled entity dictionary"
        );

        Ok(CompiledDictionary {
            alias_matchers,
            pattern_matchers,
        })
    }
}

struct AliasMatcher {
    category: EntityCategory,
    regex: Regex,
    /// normalized surface form -> canonical value
    lookup: HashMap<String, String>,
}

struct PatternMatcher {
    category: EntityCategory,
    regex: Regex,
}

/// A dictionary ready for scanning text.
pub struct CompiledDictionary {
    alias_matchers: Vec<AliasMatcher>,
    pattern_matchers: Vec<PatternMatcher>,
}

impl CompiledDictionary {
    /// Find every recognized entity in `text`.
    pub fn scan(&self, text: &str) -> EntityMap {
        let mut entities = EntityMap::new();
        if text.trim().is_empty() {
            return entities;
        }

        for matcher in &self.alias_matchers {
            for m in matcher.regex.find_iter(text) {
                if let Some(canonical) = matcher.lookup.get(&normalize_surface(m.as_str())) {
                    insert_entity(&mut entities, matcher.category, canonical.clone());
                }
            }
        }

        for matcher in &self.pattern_matchers {
            for m in matcher.regex.find_iter(text) {
                insert_entity(&mut entities, matcher.category, m.as_str().to_lowercase());
            }
        }

        entities
    }

    /// Resolve a single surface form to its canonical value, if the category
    /// lists it. Used by extractors that find spans some other way.
    pub fn canonicalize(&self, category: EntityCategory, surface: &str) -> Option<&str> {
        let key = normalize_surface(surface);
        self.alias_matchers
            .iter()
            .filter(|m| m.category == category)
            .find_map(|m| m.lookup.get(&key).map(String::as_str))
    }
}

/// Lower-case and collapse whitespace/hyphen runs to a single space.
pub fn normalize_surface(surface: &str) -> String {
    surface
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Regex fragment for one normalized alias: words escaped, separators
/// matching any whitespace/hyphen run.
fn alias_pattern(normalized: &str) -> String {
    normalized
        .split(' ')
        .map(regex_lite::escape)
        .collect::<Vec<_>>()
        .join(r"[\s\-]+")
}
