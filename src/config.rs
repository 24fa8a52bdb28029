use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::correlation::cluster::ClusterStrategy;
use crate::correlation::similarity::SimilarityWeights;
use crate::correlation::{CorrelationSettings, DEFAULT_SIMILARITY_THRESHOLD};
use crate::entities::dictionary::{CompiledDictionary, EntityDictionary};
use crate::entities::keywords::{KeywordExtractor, DEFAULT_KEYWORD_COUNT, DEFAULT_TITLE_WEIGHT};
use crate::entities::traits::ExtractorBackend;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. Every value has a
/// default; a value that is set but unparseable is a load error.
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum similarity to join an existing cluster (0.0 to 1.0)
    pub similarity_threshold: f64,
    /// Entity vs keyword weight in the combined similarity
    pub weights: SimilarityWeights,
    /// Keywords kept per story
    pub keyword_count: usize,
    /// How much a title occurrence counts toward keyword frequency
    pub title_weight: u32,
    pub strategy: ClusterStrategy,
    /// Largest allowed cluster (unlimited when unset or 0)
    pub max_cluster_size: Option<usize>,
    pub extractor_backend: ExtractorBackend,
    /// Directory containing the ONNX NER model files
    pub model_dir: PathBuf,
    /// Replacement entity dictionary (bundled table when unset)
    pub dictionary_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            weights: SimilarityWeights::default(),
            keyword_count: DEFAULT_KEYWORD_COUNT,
            title_weight: DEFAULT_TITLE_WEIGHT,
            strategy: ClusterStrategy::Greedy,
            max_cluster_size: None,
            extractor_backend: ExtractorBackend::Dictionary,
            model_dir: default_model_dir(),
            dictionary_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let weights = SimilarityWeights {
            entity: parse_var("MOSAIC_ENTITY_WEIGHT")?.unwrap_or(defaults.weights.entity),
            keyword: parse_var("MOSAIC_KEYWORD_WEIGHT")?.unwrap_or(defaults.weights.keyword),
        };

        Ok(Self {
            similarity_threshold: parse_var("MOSAIC_SIMILARITY_THRESHOLD")?
                .unwrap_or(defaults.similarity_threshold),
            weights,
            keyword_count: parse_var("MOSAIC_KEYWORD_COUNT")?.unwrap_or(defaults.keyword_count),
            title_weight: parse_var("MOSAIC_TITLE_WEIGHT")?.unwrap_or(defaults.title_weight),
            strategy: parse_var("MOSAIC_CLUSTERING")?.unwrap_or(defaults.strategy),
            max_cluster_size: parse_var("MOSAIC_MAX_CLUSTER_SIZE")?,
            extractor_backend: parse_var("MOSAIC_EXTRACTOR")?
                .unwrap_or(defaults.extractor_backend),
            model_dir: env::var("MOSAIC_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            dictionary_path: env::var("MOSAIC_DICTIONARY").ok().map(PathBuf::from),
        })
    }

    /// Clamp out-of-range values instead of failing the batch, warning for
    /// each one that changes.
    pub fn validated(mut self) -> Self {
        let settings = self.correlation_settings().clamped();
        self.similarity_threshold = settings.threshold;
        self.max_cluster_size = settings.max_cluster_size;
        if settings.weights != self.weights {
            warn!(
                entity = settings.weights.entity,
                keyword = settings.weights.keyword,
                "Similarity weights normalized"
            );
            self.weights = settings.weights;
        }
        if self.keyword_count == 0 {
            warn!("MOSAIC_KEYWORD_COUNT is 0, using 1");
            self.keyword_count = 1;
        }
        if self.title_weight == 0 {
            warn!("MOSAIC_TITLE_WEIGHT is 0, using 1");
            self.title_weight = 1;
        }
        self
    }

    pub fn correlation_settings(&self) -> CorrelationSettings {
        CorrelationSettings {
            threshold: self.similarity_threshold,
            weights: self.weights,
            strategy: self.strategy,
            max_cluster_size: self.max_cluster_size,
        }
    }

    pub fn keyword_extractor(&self) -> KeywordExtractor {
        KeywordExtractor::new(self.keyword_count, self.title_weight)
    }

    /// Load and compile the configured entity dictionary.
    pub fn dictionary(&self) -> Result<Arc<CompiledDictionary>> {
        let dictionary = match &self.dictionary_path {
            Some(path) => EntityDictionary::from_path(path)?,
            None => EntityDictionary::bundled()?,
        };
        Ok(Arc::new(dictionary.compile()?))
    }
}

/// Returns the default directory for model files.
/// Uses the platform data directory: ~/.local/share/mosaic/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mosaic")
        .join("models")
}

/// Read and parse an optional environment variable.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid value for {name}: {raw}")),
        _ => Ok(None),
    }
}
