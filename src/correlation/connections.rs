// Connection index — entity -> stories that mention it.
//
// Built independently of clustering so that links between stories stay
// visible even when the threshold keeps them in different clusters. Only
// entities mentioned by at least two stories are connections.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::info;

use super::cluster::StoryCluster;
use crate::entities::types::{entity_keys, EntityCategory, EntityKey};
use crate::stories::Story;

/// Minimum number of stories an entity needs to count as a connection.
pub const MIN_CONNECTION_STORIES: usize = 2;

/// One connection: an entity and the URLs of the stories mentioning it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub category: EntityCategory,
    pub value: String,
    pub stories: Vec<String>,
}

/// An entity whose stories landed in more than one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossClusterLink {
    pub entity: EntityKey,
    /// Cluster ids in ascending order
    pub clusters: Vec<usize>,
}

/// Entity -> story URLs in input order, for entities shared by 2+ stories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionIndex {
    entries: BTreeMap<EntityKey, Vec<String>>,
}

impl ConnectionIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &EntityKey) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Convenience lookup by category and value.
    pub fn stories_for(&self, category: EntityCategory, value: &str) -> Option<&[String]> {
        self.get(&EntityKey::new(category, value))
    }

    /// Entries in (category, value) order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &[String])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Flattened, serializable form.
    pub fn connections(&self) -> Vec<Connection> {
        self.iter()
            .map(|(key, stories)| Connection {
                category: key.category,
                value: key.value.clone(),
                stories: stories.to_vec(),
            })
            .collect()
    }

    /// Entities whose stories are spread over two or more clusters.
    pub fn cross_cluster_links(
        &self,
        stories: &[Story],
        clusters: &[StoryCluster],
    ) -> Vec<CrossClusterLink> {
        let mut cluster_of_url: HashMap<&str, usize> = HashMap::new();
        for cluster in clusters {
            for index in cluster.story_indices() {
                if let Some(story) = stories.get(index) {
                    cluster_of_url.insert(story.url.as_str(), cluster.id);
                }
            }
        }

        self.iter()
            .filter_map(|(key, urls)| {
                let mut ids: Vec<usize> = urls
                    .iter()
                    .filter_map(|url| cluster_of_url.get(url.as_str()).copied())
                    .collect();
                ids.sort_unstable();
                ids.dedup();
                (ids.len() > 1).then(|| CrossClusterLink {
                    entity: key.clone(),
                    clusters: ids,
                })
            })
            .collect()
    }
}

/// Build the connection index over an enriched batch.
pub fn index_connections(stories: &[Story]) -> ConnectionIndex {
    let mut entries: BTreeMap<EntityKey, Vec<String>> = BTreeMap::new();

    for story in stories {
        for key in entity_keys(&story.entities) {
            entries.entry(key).or_default().push(story.url.clone());
        }
    }

    entries.retain(|_, urls| urls.len() >= MIN_CONNECTION_STORIES);

    info!(connections = entries.len(), "Indexed cross-story connections");
    ConnectionIndex { entries }
}
