// Story similarity — Jaccard overlap of entities and keywords.
//
// Two signals, each a Jaccard ratio in [0, 1]:
//
//   entity  = |values_a ∩ values_b| / |values_a ∪ values_b|   (categories discarded)
//   keyword = |kw_a ∩ kw_b| / |kw_a ∪ kw_b|
//
// combined = (w_e * entity + w_k * keyword) / (w_e + w_k), taken only over
// signals where at least one side has something. A signal with nothing on
// either side carries no evidence and is left out of the weighted mean, so a
// keyword-only story is still fully similar to itself while two empty
// stories score 0.0.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entities::types::flatten_values;
use crate::stories::Story;

/// Relative weight of the two similarity signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub entity: f64,
    pub keyword: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            entity: 0.7,
            keyword: 0.3,
        }
    }
}

impl SimilarityWeights {
    /// Clamp negatives to zero and rescale to sum to 1. All-zero (or
    /// non-finite) weights fall back to the defaults.
    pub fn normalized(&self) -> Self {
        let clean = |w: f64| if w.is_finite() { w.max(0.0) } else { 0.0 };
        let entity = clean(self.entity);
        let keyword = clean(self.keyword);
        let sum = entity + keyword;
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            entity: entity / sum,
            keyword: keyword / sum,
        }
    }
}

/// Both signals and their combination for one story pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityBreakdown {
    /// None when neither story has entities
    pub entity: Option<f64>,
    /// None when neither story has keywords
    pub keyword: Option<f64>,
    pub combined: f64,
}

/// Jaccard similarity of two sets; 0.0 when both are empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Compute both signals and the weighted combination.
pub fn similarity_breakdown(
    a: &Story,
    b: &Story,
    weights: &SimilarityWeights,
) -> SimilarityBreakdown {
    let entities_a = flatten_values(&a.entities);
    let entities_b = flatten_values(&b.entities);
    let entity = (!entities_a.is_empty() || !entities_b.is_empty())
        .then(|| jaccard(&entities_a, &entities_b));

    let keywords_a: BTreeSet<&str> = a.keywords.iter().map(String::as_str).collect();
    let keywords_b: BTreeSet<&str> = b.keywords.iter().map(String::as_str).collect();
    let keyword = (!keywords_a.is_empty() || !keywords_b.is_empty())
        .then(|| jaccard(&keywords_a, &keywords_b));

    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    if let Some(score) = entity {
        weighted += weights.entity * score;
        weight_sum += weights.entity;
    }
    if let Some(score) = keyword {
        weighted += weights.keyword * score;
        weight_sum += weights.keyword;
    }

    let combined = if weight_sum > 0.0 {
        (weighted / weight_sum).clamp(0.0, 1.0)
    } else {
        0.0
    };

    SimilarityBreakdown {
        entity,
        keyword,
        combined,
    }
}

/// Combined similarity in [0, 1]. Symmetric and deterministic.
pub fn story_similarity(a: &Story, b: &Story, weights: &SimilarityWeights) -> f64 {
    similarity_breakdown(a, b, weights).combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&'static str]) -> BTreeSet<&'static str> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_jaccard_basic() {
        let score = jaccard(&set(&["a", "b", "c"]), &set(&["b", "c", "d"]));
        assert!((score - 0.5).abs() < 1e-12, "got {score}");
    }

    #[test]
    fn test_jaccard_both_empty() {
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn test_jaccard_one_empty() {
        assert_eq!(jaccard(&set(&["a"]), &set(&[])), 0.0);
    }

    #[test]
    fn test_weights_normalized() {
        let w = SimilarityWeights {
            entity: 7.0,
            keyword: 3.0,
        }
        .normalized();
        assert!((w.entity - 0.7).abs() < 1e-12);
        assert!((w.keyword - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_weights_negative_clamped() {
        let w = SimilarityWeights {
            entity: -1.0,
            keyword: 2.0,
        }
        .normalized();
        assert_eq!(w.entity, 0.0);
        assert_eq!(w.keyword, 1.0);
    }

    #[test]
    fn test_weights_all_zero_fall_back() {
        let w = SimilarityWeights {
            entity: 0.0,
            keyword: 0.0,
        }
        .normalized();
        assert_eq!(w, SimilarityWeights::default());
    }
}
