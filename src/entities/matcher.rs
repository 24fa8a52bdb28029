// Dictionary-based entity extraction — the baseline every run supports.

use std::sync::Arc;

use anyhow::Result;

use super::dictionary::{CompiledDictionary, EntityDictionary};
use super::traits::EntityExtractor;
use super::types::EntityMap;

/// Scans title and text against the compiled entity dictionary.
pub struct DictionaryExtractor {
    dictionary: Arc<CompiledDictionary>,
}

impl DictionaryExtractor {
    pub fn new(dictionary: Arc<CompiledDictionary>) -> Self {
        Self { dictionary }
    }

    /// Extractor over the bundled dictionary.
    pub fn bundled() -> Result<Self> {
        let compiled = EntityDictionary::bundled()?.compile()?;
        Ok(Self::new(Arc::new(compiled)))
    }

    pub fn dictionary(&self) -> &Arc<CompiledDictionary> {
        &self.dictionary
    }
}

impl EntityExtractor for DictionaryExtractor {
    fn extract(&self, title: &str, text: &str) -> Result<EntityMap> {
        // Newline separator keeps a title's last word from fusing with the
        // body's first word across the word boundary.
        Ok(self.dictionary.scan(&format!("{title}\n{text}")))
    }

    fn name(&self) -> &'static str {
        "dictionary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::types::EntityCategory;

    #[test]
    fn test_title_and_text_both_scanned() {
        let extractor = DictionaryExtractor::bundled().unwrap();
        let entities = extractor
            .extract("Sandworm returns", "Attack hit a Ukrainian power grid")
            .unwrap();

        assert!(entities[&EntityCategory::ThreatActor].contains("sandworm"));
        assert!(entities[&EntityCategory::Country].contains("ukraine"));
        assert!(entities[&EntityCategory::Sector].contains("energy"));
    }

    #[test]
    fn test_empty_input_is_empty_map() {
        let extractor = DictionaryExtractor::bundled().unwrap();
        assert!(extractor.extract("", "").unwrap().is_empty());
    }
}
