// Intelligence report — the JSON document handed to downstream consumers.
//
// Summary counts, the clusters (largest first), connection points grouped by
// category (most-mentioned first), a newest-first timeline, and the
// similarity graph for network visualization.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::correlation::connections::CrossClusterLink;
use crate::correlation::graph::SimilarityGraph;
use crate::correlation::summary::{ClusterSummary, StoryRef};
use crate::correlation::CorrelationRun;
use crate::entities::types::EntityCategory;

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_stories: usize,
    pub story_clusters: usize,
    pub multi_story_clusters: usize,
    pub connection_points: usize,
    pub threshold: f64,
    pub strategy: String,
    pub max_cluster_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionPoint {
    pub value: String,
    pub mention_count: usize,
    pub stories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntelligenceReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub clusters: Vec<ClusterSummary>,
    pub connections: BTreeMap<EntityCategory, Vec<ConnectionPoint>>,
    pub cross_cluster_links: Vec<CrossClusterLink>,
    pub timeline: Vec<StoryRef>,
    pub graph: SimilarityGraph,
}

impl IntelligenceReport {
    /// Assemble the report. Singleton clusters are left out unless asked for.
    pub fn build(
        run: &CorrelationRun,
        include_singletons: bool,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut clusters: Vec<ClusterSummary> = run
            .summaries()
            .into_iter()
            .filter(|c| include_singletons || c.story_count > 1)
            .collect();
        // Stable sort keeps creation order among equal sizes.
        clusters.sort_by_key(|c| Reverse(c.story_count));

        let mut connections: BTreeMap<EntityCategory, Vec<ConnectionPoint>> = BTreeMap::new();
        for (key, stories) in run.connections.iter() {
            connections
                .entry(key.category)
                .or_default()
                .push(ConnectionPoint {
                    value: key.value.clone(),
                    mention_count: stories.len(),
                    stories: stories.to_vec(),
                });
        }
        for points in connections.values_mut() {
            // Already in value order; stable sort by count keeps that as the tie-break.
            points.sort_by_key(|p| Reverse(p.mention_count));
        }

        let summary = ReportSummary {
            total_stories: run.stories.len(),
            story_clusters: run.clusters.len(),
            multi_story_clusters: run.clusters.iter().filter(|c| !c.is_singleton()).count(),
            connection_points: run.connections.len(),
            threshold: run.settings.threshold,
            strategy: run.settings.strategy.to_string(),
            max_cluster_size: run.settings.max_cluster_size,
        };

        Self {
            generated_at,
            summary,
            clusters,
            connections,
            cross_cluster_links: run.cross_cluster_links(),
            timeline: timeline(run),
            graph: run.graph(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Wrote intelligence report");
        Ok(())
    }
}

/// Stories newest first; stories without a date go last in input order.
fn timeline(run: &CorrelationRun) -> Vec<StoryRef> {
    let mut stories: Vec<StoryRef> = run.stories.iter().map(StoryRef::from).collect();
    stories.sort_by_key(|s| (s.published_at.is_none(), s.published_at.map(Reverse)));
    stories
}
