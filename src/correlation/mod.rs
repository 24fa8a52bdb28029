// Story correlation — similarity scoring, clustering, and the connection index.
//
// A run takes one batch of raw stories, enriches each with entities and
// keywords, then builds clusters (split to a size limit when one is set) and
// the connection index over the enriched batch. Everything is synchronous and in-memory; nothing is shared between
// runs.

pub mod cluster;
pub mod connections;
pub mod graph;
pub mod similarity;
pub mod summary;

use anyhow::Result;
use tracing::{info, warn};

use crate::entities::keywords::KeywordExtractor;
use crate::entities::traits::EntityExtractor;
use crate::entities::enrich_stories;
use crate::stories::Story;
use cluster::{build_clusters, cap_cluster_size, ClusterStrategy, StoryCluster};
use connections::{index_connections, ConnectionIndex, CrossClusterLink};
use graph::SimilarityGraph;
use similarity::SimilarityWeights;
use summary::ClusterSummary;

/// Default minimum similarity for joining an existing cluster.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.15;

/// Tunables for one correlation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationSettings {
    pub threshold: f64,
    pub weights: SimilarityWeights,
    pub strategy: ClusterStrategy,
    /// Largest allowed cluster; None means unlimited
    pub max_cluster_size: Option<usize>,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            weights: SimilarityWeights::default(),
            strategy: ClusterStrategy::Greedy,
            max_cluster_size: None,
        }
    }
}

impl CorrelationSettings {
    /// Clamp the threshold into [0, 1] and normalize the weights rather than
    /// failing a batch over one bad value.
    pub fn clamped(&self) -> Self {
        let threshold = if self.threshold.is_nan() {
            warn!("Similarity threshold is NaN, using default");
            DEFAULT_SIMILARITY_THRESHOLD
        } else {
            let clamped = self.threshold.clamp(0.0, 1.0);
            if clamped != self.threshold {
                warn!(
                    requested = self.threshold,
                    used = clamped,
                    "Similarity threshold out of range, clamping"
                );
            }
            clamped
        };

        let max_cluster_size = match self.max_cluster_size {
            Some(0) => {
                warn!("Maximum cluster size of 0 means no limit");
                None
            }
            other => other,
        };

        Self {
            threshold,
            weights: self.weights.normalized(),
            strategy: self.strategy,
            max_cluster_size,
        }
    }
}

/// The output of one run, handed to reporting.
#[derive(Debug, Clone)]
pub struct CorrelationRun {
    /// The batch, now carrying entities and keywords
    pub stories: Vec<Story>,
    pub clusters: Vec<StoryCluster>,
    pub connections: ConnectionIndex,
    pub settings: CorrelationSettings,
}

impl CorrelationRun {
    pub fn summaries(&self) -> Vec<ClusterSummary> {
        self.clusters
            .iter()
            .map(|c| ClusterSummary::build(c, &self.stories))
            .collect()
    }

    pub fn graph(&self) -> SimilarityGraph {
        SimilarityGraph::build(&self.stories, self.settings.threshold, &self.settings.weights)
    }

    pub fn cross_cluster_links(&self) -> Vec<CrossClusterLink> {
        self.connections
            .cross_cluster_links(&self.stories, &self.clusters)
    }
}

/// Runs extraction, clustering, and indexing over a batch.
pub struct Correlator {
    extractor: Box<dyn EntityExtractor>,
    keywords: KeywordExtractor,
    settings: CorrelationSettings,
}

impl Correlator {
    pub fn new(
        extractor: Box<dyn EntityExtractor>,
        keywords: KeywordExtractor,
        settings: CorrelationSettings,
    ) -> Self {
        Self {
            extractor,
            keywords,
            settings: settings.clamped(),
        }
    }

    pub fn settings(&self) -> &CorrelationSettings {
        &self.settings
    }

    /// Correlate one batch end to end.
    pub fn run(&self, mut stories: Vec<Story>) -> Result<CorrelationRun> {
        info!(stories = stories.len(), "Correlating stories");

        enrich_stories(&mut stories, self.extractor.as_ref(), &self.keywords)?;

        let mut clusters = build_clusters(
            &stories,
            self.settings.threshold,
            &self.settings.weights,
            self.settings.strategy,
        );
        if let Some(max_size) = self.settings.max_cluster_size {
            clusters = cap_cluster_size(
                clusters,
                &stories,
                self.settings.threshold,
                &self.settings.weights,
                max_size,
            );
        }
        let connections = index_connections(&stories);

        Ok(CorrelationRun {
            stories,
            clusters,
            connections,
            settings: self.settings,
        })
    }
}
