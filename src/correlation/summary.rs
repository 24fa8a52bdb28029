// Cluster summaries — what a thread is about, where it came from, and when.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cluster::StoryCluster;
use crate::entities::types::{merge_entities, EntityMap};
use crate::stories::Story;

/// A member story as shown in reports.
#[derive(Debug, Clone, Serialize)]
pub struct StoryRef {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&Story> for StoryRef {
    fn from(story: &Story) -> Self {
        Self {
            title: story.title.clone(),
            url: story.url.clone(),
            source: story.source.clone(),
            published_at: story.published_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub story_count: usize,
    pub stories: Vec<StoryRef>,
    /// Union of every member's entities
    pub entities: EntityMap,
    /// Keywords found in at least two members, in first-seen order
    pub shared_keywords: Vec<String>,
    /// Distinct sources in first-seen order
    pub sources: Vec<String>,
    /// None when no member has a publication time
    pub date_range: Option<DateRange>,
}

impl ClusterSummary {
    pub fn build(cluster: &StoryCluster, batch: &[Story]) -> Self {
        let members = cluster.stories(batch);

        let mut entities = EntityMap::new();
        for story in &members {
            merge_entities(&mut entities, story.entities.clone());
        }

        Self {
            cluster_id: cluster.id,
            story_count: members.len(),
            stories: members.iter().map(|s| StoryRef::from(*s)).collect(),
            entities,
            shared_keywords: shared_keywords(&members),
            sources: distinct_sources(&members),
            date_range: date_range(&members),
        }
    }
}

fn shared_keywords(members: &[&Story]) -> Vec<String> {
    // keyword -> number of members mentioning it
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for story in members {
        let mut seen_here = HashSet::new();
        for keyword in story.keywords.iter().map(String::as_str) {
            if !seen_here.insert(keyword) {
                continue;
            }
            let count = counts.entry(keyword).or_insert(0);
            if *count == 0 {
                order.push(keyword);
            }
            *count += 1;
        }
    }

    order
        .into_iter()
        .filter(|k| counts.get(k).copied().unwrap_or(0) >= 2)
        .map(str::to_string)
        .collect()
}

fn distinct_sources(members: &[&Story]) -> Vec<String> {
    let mut seen = HashSet::new();
    members
        .iter()
        .map(|s| s.source.as_str())
        .filter(|source| !source.is_empty() && seen.insert(*source))
        .map(str::to_string)
        .collect()
}

fn date_range(members: &[&Story]) -> Option<DateRange> {
    let mut dates = members.iter().filter_map(|s| s.published_at);
    let first = dates.next()?;
    let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(DateRange { start, end })
}
