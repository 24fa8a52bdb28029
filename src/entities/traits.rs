// Entity extractor trait — the swap-ready abstraction.
//
// The default implementation scans the entity dictionary with regular
// expressions. A model-backed implementation (local ONNX NER) is an
// alternate variant chosen by configuration, never a fallback.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use super::types::EntityMap;

/// Trait for turning story text into typed, normalized entities.
///
/// Implementations must be deterministic: the same title and text always
/// produce the same map. Empty input yields an empty map, not an error.
pub trait EntityExtractor: Send + Sync {
    /// Extract entities from a story's title and body text.
    fn extract(&self, title: &str, text: &str) -> Result<EntityMap>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Which extractor variant to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractorBackend {
    /// Regex + dictionary tables (default)
    #[default]
    Dictionary,
    /// Local ONNX token-classification model layered over the dictionary
    Onnx,
}

impl FromStr for ExtractorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dictionary" | "regex" => Ok(ExtractorBackend::Dictionary),
            "onnx" | "ner" => Ok(ExtractorBackend::Onnx),
            other => anyhow::bail!("Unknown extractor backend: {other} (expected dictionary or onnx)"),
        }
    }
}

impl fmt::Display for ExtractorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractorBackend::Dictionary => write!(f, "dictionary"),
            ExtractorBackend::Onnx => write!(f, "onnx"),
        }
    }
}
