// Similarity graph — stories as nodes, an edge for every pair at or above
// the threshold. Exported with reports for network visualization and used
// by connected-components clustering.

use serde::Serialize;
use tracing::debug;

use super::similarity::{story_similarity, SimilarityWeights};
use crate::output::truncate_chars;
use crate::stories::Story;

const NODE_LABEL_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: usize,
    pub label: String,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphEdge {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarityGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl SimilarityGraph {
    pub fn build(stories: &[Story], threshold: f64, weights: &SimilarityWeights) -> Self {
        let nodes = stories
            .iter()
            .enumerate()
            .map(|(id, story)| GraphNode {
                id,
                label: truncate_chars(&story.title, NODE_LABEL_CHARS),
                source: story.source.clone(),
                url: story.url.clone(),
            })
            .collect();

        Self {
            nodes,
            edges: similarity_edges(stories, threshold, weights),
        }
    }
}

/// Every pair (i < j) whose similarity meets the threshold, in (i, j) order.
pub fn similarity_edges(
    stories: &[Story],
    threshold: f64,
    weights: &SimilarityWeights,
) -> Vec<GraphEdge> {
    let mut progress = ComparisonProgress::new(stories.len());
    let mut edges = Vec::new();

    for (i, a) in stories.iter().enumerate() {
        for (j, b) in stories.iter().enumerate().skip(i + 1) {
            let weight = story_similarity(a, b, weights);
            if weight >= threshold {
                edges.push(GraphEdge { from: i, to: j, weight });
            }
            progress.tick();
        }
    }

    debug!(edges = edges.len(), threshold, "Built similarity edges");
    edges
}

/// Logs pairwise comparison progress every 10%.
pub(crate) struct ComparisonProgress {
    total: usize,
    done: usize,
    last_logged: usize,
}

impl ComparisonProgress {
    pub(crate) fn new(story_count: usize) -> Self {
        Self {
            total: story_count * story_count.saturating_sub(1) / 2,
            done: 0,
            last_logged: 0,
        }
    }

    pub(crate) fn tick(&mut self) {
        self.done += 1;
        if self.total == 0 {
            return;
        }
        let percent = self.done * 100 / self.total;
        if percent >= self.last_logged + 10 {
            debug!(
                percent,
                done = self.done,
                total = self.total,
                "Correlation progress"
            );
            self.last_logged = percent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::types::{insert_entity, EntityCategory};

    fn story_with(url: &str, values: &[&str]) -> Story {
        let mut story = Story::new(url, url, "");
        for v in values {
            insert_entity(&mut story.entities, EntityCategory::Malware, *v);
        }
        story
    }

    #[test]
    fn test_edges_above_threshold_only() {
        let stories = vec![
            story_with("a", &["emotet"]),
            story_with("b", &["emotet"]),
            story_with("c", &["ryuk"]),
        ];
        let edges = similarity_edges(&stories, 0.5, &SimilarityWeights::default());
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].from, edges[0].to), (0, 1));
        assert!((edges[0].weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_graph_nodes_truncate_titles() {
        let mut story = story_with("a", &[]);
        story.title = "x".repeat(80);
        let graph = SimilarityGraph::build(&[story], 0.5, &SimilarityWeights::default());
        assert_eq!(graph.nodes[0].label.chars().count(), NODE_LABEL_CHARS + 3);
        assert!(graph.edges.is_empty());
    }
}
