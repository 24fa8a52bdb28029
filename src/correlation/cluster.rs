// Cluster building — partition a story batch into threads.
//
// Greedy (default): one pass in input order. Each story is compared with
// every story already placed; if the best match reaches the threshold the
// story joins that match's cluster, otherwise it starts a new one. On equal
// best scores the earliest cluster wins, then its earliest member. Clusters
// never merge after creation, so the result depends on input order and two
// members may be connected only through a chain of joins.
//
// Connected components: build the full threshold graph and take its
// components. Order-independent membership, different results from greedy
// on chained or tied inputs; selected explicitly by configuration.
//
// Both are O(n²) comparisons. Clusters come back in creation order
// (ordered by their first story) and include singletons.
//
// An optional size limit splits oversized clusters afterwards by
// re-clustering their members at a stricter threshold.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::graph::{similarity_edges, ComparisonProgress};
use super::similarity::{story_similarity, SimilarityWeights};
use crate::stories::Story;

/// Added to the threshold when an oversized cluster is re-clustered.
pub const SPLIT_THRESHOLD_STEP: f64 = 0.1;

/// How stories are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStrategy {
    /// Single pass, join the best already-placed match
    #[default]
    Greedy,
    /// Connected components of the threshold graph
    ConnectedComponents,
}

impl FromStr for ClusterStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "greedy" => Ok(ClusterStrategy::Greedy),
            "components" | "connected_components" | "connected-components" => {
                Ok(ClusterStrategy::ConnectedComponents)
            }
            other => anyhow::bail!("Unknown clustering strategy: {other} (expected greedy or components)"),
        }
    }
}

impl fmt::Display for ClusterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterStrategy::Greedy => write!(f, "greedy"),
            ClusterStrategy::ConnectedComponents => write!(f, "components"),
        }
    }
}

/// The placed story a member was matched to when it joined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JoinEdge {
    pub story: usize,
    pub similarity: f64,
}

/// One story in a cluster, by its index in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterMember {
    pub story: usize,
    /// None for the story that started the cluster
    pub joined_via: Option<JoinEdge>,
}

/// A group of stories believed to report the same event or thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryCluster {
    pub id: usize,
    /// Members in the order they were added
    pub members: Vec<ClusterMember>,
}

impl StoryCluster {
    fn seeded(id: usize, story: usize) -> Self {
        Self {
            id,
            members: vec![ClusterMember {
                story,
                joined_via: None,
            }],
        }
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// Batch indices of the members, in order.
    pub fn story_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().map(|m| m.story)
    }

    pub fn contains(&self, story: usize) -> bool {
        self.members.iter().any(|m| m.story == story)
    }

    /// Resolve members against the batch they were built from.
    pub fn stories<'a>(&self, batch: &'a [Story]) -> Vec<&'a Story> {
        self.story_indices().filter_map(|i| batch.get(i)).collect()
    }
}

/// Partition `stories` with the chosen strategy.
pub fn build_clusters(
    stories: &[Story],
    threshold: f64,
    weights: &SimilarityWeights,
    strategy: ClusterStrategy,
) -> Vec<StoryCluster> {
    let clusters = match strategy {
        ClusterStrategy::Greedy => greedy_clusters(stories, threshold, weights),
        ClusterStrategy::ConnectedComponents => component_clusters(stories, threshold, weights),
    };

    info!(
        stories = stories.len(),
        clusters = clusters.len(),
        multi_story = clusters.iter().filter(|c| !c.is_singleton()).count(),
        %strategy,
        threshold,
        "Clustered stories"
    );
    clusters
}

/// Single-pass greedy clustering in input order.
pub fn greedy_clusters(
    stories: &[Story],
    threshold: f64,
    weights: &SimilarityWeights,
) -> Vec<StoryCluster> {
    let indices: Vec<usize> = (0..stories.len()).collect();
    greedy_over(stories, &indices, threshold, weights, None)
}

/// Greedy pass over a subset of the batch. With a size limit, full clusters
/// stop accepting members and a story whose best match is full looks at the
/// next best.
fn greedy_over(
    stories: &[Story],
    indices: &[usize],
    threshold: f64,
    weights: &SimilarityWeights,
    max_size: Option<usize>,
) -> Vec<StoryCluster> {
    let mut progress = ComparisonProgress::new(indices.len());
    let mut clusters: Vec<StoryCluster> = Vec::new();

    for &index in indices {
        let story = &stories[index];
        // (cluster position, matched story, similarity)
        let mut best: Option<(usize, usize, f64)> = None;

        for (position, cluster) in clusters.iter().enumerate() {
            let full = max_size.is_some_and(|max| cluster.size() >= max);
            for placed in cluster.story_indices() {
                progress.tick();
                if full {
                    continue;
                }
                let similarity = story_similarity(story, &stories[placed], weights);
                // Strict comparison keeps the earliest cluster/member on ties.
                if best.is_none_or(|(_, _, top)| similarity > top) {
                    best = Some((position, placed, similarity));
                }
            }
        }

        match best {
            Some((position, placed, similarity)) if similarity >= threshold => {
                clusters[position].members.push(ClusterMember {
                    story: index,
                    joined_via: Some(JoinEdge {
                        story: placed,
                        similarity,
                    }),
                });
            }
            _ => {
                let id = clusters.len();
                clusters.push(StoryCluster::seeded(id, index));
            }
        }
    }

    clusters
}

/// Split every cluster larger than `max_size`.
///
/// An oversized cluster is re-clustered greedily over its own members at
/// `threshold + SPLIT_THRESHOLD_STEP` (at most 1.0), with full sub-clusters
/// closed to new members, so every resulting cluster fits. Clusters within
/// the limit are untouched. The result is re-ordered by first story and
/// re-numbered.
pub fn cap_cluster_size(
    clusters: Vec<StoryCluster>,
    stories: &[Story],
    threshold: f64,
    weights: &SimilarityWeights,
    max_size: usize,
) -> Vec<StoryCluster> {
    let max_size = max_size.max(1);
    let split_threshold = (threshold + SPLIT_THRESHOLD_STEP).min(1.0);
    let mut split_count = 0;

    let mut capped: Vec<StoryCluster> = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        if cluster.size() <= max_size {
            capped.push(cluster);
            continue;
        }
        split_count += 1;
        let members: Vec<usize> = cluster.story_indices().collect();
        capped.extend(greedy_over(
            stories,
            &members,
            split_threshold,
            weights,
            Some(max_size),
        ));
    }

    capped.sort_by_key(|c| c.members.first().map(|m| m.story));
    for (id, cluster) in capped.iter_mut().enumerate() {
        cluster.id = id;
    }

    if split_count > 0 {
        info!(
            split = split_count,
            clusters = capped.len(),
            max_size,
            split_threshold,
            "Split oversized clusters"
        );
    }
    capped
}

/// Connected components of the graph with an edge for every pair at or
/// above the threshold.
pub fn component_clusters(
    stories: &[Story],
    threshold: f64,
    weights: &SimilarityWeights,
) -> Vec<StoryCluster> {
    let edges = similarity_edges(stories, threshold, weights);

    let mut parent: Vec<usize> = (0..stories.len()).collect();
    // Best edge per story, for reporting how a member is attached.
    let mut strongest: Vec<Option<JoinEdge>> = vec![None; stories.len()];

    for edge in &edges {
        union(&mut parent, edge.from, edge.to);
        for (node, other) in [(edge.from, edge.to), (edge.to, edge.from)] {
            if strongest[node].is_none_or(|e| edge.weight > e.similarity) {
                strongest[node] = Some(JoinEdge {
                    story: other,
                    similarity: edge.weight,
                });
            }
        }
    }

    // Visiting stories in input order creates clusters in order of their
    // lowest index and appends members in input order.
    let mut cluster_of_root: Vec<Option<usize>> = vec![None; stories.len()];
    let mut clusters: Vec<StoryCluster> = Vec::new();

    for index in 0..stories.len() {
        let root = find(&mut parent, index);
        match cluster_of_root[root] {
            Some(position) => clusters[position].members.push(ClusterMember {
                story: index,
                joined_via: strongest[index],
            }),
            None => {
                let id = clusters.len();
                cluster_of_root[root] = Some(id);
                clusters.push(StoryCluster::seeded(id, index));
            }
        }
    }

    clusters
}

fn find(parent: &mut [usize], node: usize) -> usize {
    let mut root = node;
    while parent[root] != root {
        root = parent[root];
    }
    // Path compression
    let mut current = node;
    while parent[current] != root {
        let next = parent[current];
        parent[current] = root;
        current = next;
    }
    root
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let root_a = find(parent, a);
    let root_b = find(parent, b);
    if root_a != root_b {
        // Lower index becomes the root
        let (low, high) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        parent[high] = low;
    }
}
