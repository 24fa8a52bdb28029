// Colored terminal output for clusters, connections, and single-story extraction.

use colored::Colorize;

use crate::correlation::summary::ClusterSummary;
use crate::correlation::CorrelationRun;
use crate::entities::types::EntityMap;

const TITLE_PREVIEW_CHARS: usize = 90;

/// Display the clusters of a run, largest first.
pub fn display_clusters(run: &CorrelationRun, include_singletons: bool) {
    let mut summaries: Vec<ClusterSummary> = run
        .summaries()
        .into_iter()
        .filter(|c| include_singletons || c.story_count > 1)
        .collect();
    summaries.sort_by_key(|c| std::cmp::Reverse(c.story_count));

    println!(
        "\n{}",
        format!(
            "=== Story Threads ({} stories, {} clusters, threshold {:.2}) ===",
            run.stories.len(),
            run.clusters.len(),
            run.settings.threshold
        )
        .bold()
    );
    println!();

    if summaries.is_empty() {
        println!("  No multi-story threads found. Use --include-singletons to list every story.");
        return;
    }

    for summary in &summaries {
        let header = format!(
            "Cluster #{} ({} {})",
            summary.cluster_id,
            summary.story_count,
            if summary.story_count == 1 { "story" } else { "stories" }
        );
        let header = if summary.story_count >= 3 {
            header.bright_red().bold()
        } else if summary.story_count == 2 {
            header.bright_yellow().bold()
        } else {
            header.dimmed()
        };
        println!("  {header}");

        for story in &summary.stories {
            let date = story
                .published_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "    - {} {} {}",
                super::truncate_chars(&story.title, TITLE_PREVIEW_CHARS),
                format!("[{}]", story.source).dimmed(),
                date.dimmed()
            );
        }

        let entities = format_entities(&summary.entities);
        if !entities.is_empty() {
            println!("    Entities: {}", entities.cyan());
        }
        if !summary.shared_keywords.is_empty() {
            println!("    Shared keywords: {}", summary.shared_keywords.join(", ").dimmed());
        }
        println!();
    }
}

/// Display connection points (entities shared by 2+ stories).
pub fn display_connections(run: &CorrelationRun) {
    if run.connections.is_empty() {
        return;
    }

    println!(
        "{}",
        format!("=== Connection Points ({}) ===", run.connections.len()).bold()
    );
    println!();

    for (key, stories) in run.connections.iter() {
        println!(
            "  {:<14} {:<28} {} stories",
            key.category.to_string().dimmed(),
            key.value.bold(),
            stories.len()
        );
    }

    let links = run.cross_cluster_links();
    if !links.is_empty() {
        println!("\n  {}", "Links across clusters:".bold());
        for link in &links {
            let ids: Vec<String> = link.clusters.iter().map(|id| format!("#{id}")).collect();
            println!("    {} ties clusters {}", link.entity, ids.join(", "));
        }
    }
    println!();
}

/// Display the entities and keywords found in one piece of text.
pub fn display_extraction(entities: &EntityMap, keywords: &[String]) {
    println!("\n{}", "=== Entities ===".bold());
    if entities.is_empty() {
        println!("  (none recognized)");
    }
    for (category, values) in entities {
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        println!("  {:<14} {}", category.to_string().dimmed(), values.join(", "));
    }

    println!("\n{}", "=== Keywords ===".bold());
    if keywords.is_empty() {
        println!("  (none)");
    } else {
        println!("  {}", keywords.join(", "));
    }
}

fn format_entities(entities: &EntityMap) -> String {
    entities
        .iter()
        .map(|(category, values)| {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            format!("{}={}", category, values.join("/"))
        })
        .collect::<Vec<_>>()
        .join("  ")
}
