// Entity extraction — typed entities and keywords for each story.
//
// The EntityExtractor trait defines the interface. DictionaryExtractor is the
// default; OnnxNerExtractor is the model-backed alternative selected through
// configuration.

pub mod dictionary;
pub mod keywords;
pub mod matcher;
pub mod onnx;
pub mod traits;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::stories::Story;
use dictionary::CompiledDictionary;
use keywords::KeywordExtractor;
use traits::{EntityExtractor, ExtractorBackend};

/// Build the configured extractor variant over a compiled dictionary.
pub fn create_extractor(
    backend: ExtractorBackend,
    dictionary: Arc<CompiledDictionary>,
    model_dir: &Path,
) -> Result<Box<dyn EntityExtractor>> {
    match backend {
        ExtractorBackend::Dictionary => {
            info!("Using dictionary entity extractor");
            Ok(Box::new(matcher::DictionaryExtractor::new(dictionary)))
        }
        ExtractorBackend::Onnx => {
            info!("Using local ONNX NER entity extractor");
            Ok(Box::new(onnx::OnnxNerExtractor::load(model_dir, dictionary)?))
        }
    }
}

/// Write a story's derived fields (entities and keywords) from its title and text.
pub fn enrich_story(
    story: &mut Story,
    extractor: &dyn EntityExtractor,
    keywords: &KeywordExtractor,
) -> Result<()> {
    story.entities = extractor.extract(&story.title, &story.text)?;
    story.keywords = keywords.extract(&story.title, &story.text);

    debug!(
        url = %story.url,
        entities = types::entity_count(&story.entities),
        keywords = story.keywords.len(),
        "Enriched story"
    );
    Ok(())
}

/// Enrich every story in the batch, in order.
pub fn enrich_stories(
    stories: &mut [Story],
    extractor: &dyn EntityExtractor,
    keywords: &KeywordExtractor,
) -> Result<()> {
    for story in stories.iter_mut() {
        enrich_story(story, extractor, keywords)?;
    }

    info!(
        stories = stories.len(),
        extractor = extractor.name(),
        "Extracted entities and keywords"
    );
    Ok(())
}
