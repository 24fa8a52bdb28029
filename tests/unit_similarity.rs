// Unit tests for story similarity.
//
// Stories here carry hand-set entities and keywords so the numbers can be
// worked out by hand; extraction is covered in unit_entities.rs.

use mosaic::correlation::similarity::{
    similarity_breakdown, story_similarity, SimilarityWeights,
};
use mosaic::entities::types::{insert_entity, EntityCategory};
use mosaic::stories::Story;

const EPS: f64 = 1e-9;

fn story(entities: &[(EntityCategory, &str)], keywords: &[&str]) -> Story {
    let mut s = Story::new("https://example.com", "", "");
    for (category, value) in entities {
        insert_entity(&mut s.entities, *category, *value);
    }
    s.keywords = keywords.iter().map(|k| k.to_string()).collect();
    s
}

fn sample_stories() -> Vec<Story> {
    use EntityCategory::*;
    vec![
        story(&[(Country, "china"), (ThreatActor, "apt41")], &["grid", "breach"]),
        story(&[(ThreatActor, "apt41"), (Sector, "energy")], &["grid", "power"]),
        story(&[(Malware, "lockbit")], &["hospital", "ransom"]),
        story(&[], &["bakery", "award"]),
        story(&[], &[]),
        story(&[(Country, "china"), (Sector, "energy")], &[]),
    ]
}

#[test]
fn worked_example() {
    use EntityCategory::*;
    let a = story(&[(Country, "china"), (ThreatActor, "apt41")], &["grid", "breach"]);
    let b = story(&[(ThreatActor, "apt41"), (Sector, "energy")], &["grid", "power"]);

    let breakdown = similarity_breakdown(&a, &b, &SimilarityWeights::default());
    // entities: {china, apt41} vs {apt41, energy} -> 1/3
    // keywords: {grid, breach} vs {grid, power} -> 1/3
    assert!((breakdown.entity.unwrap() - 1.0 / 3.0).abs() < EPS);
    assert!((breakdown.keyword.unwrap() - 1.0 / 3.0).abs() < EPS);
    assert!((breakdown.combined - 1.0 / 3.0).abs() < EPS);
}

#[test]
fn entity_signal_weighted_higher() {
    use EntityCategory::*;
    let a = story(&[(ThreatActor, "apt41")], &["alpha"]);
    let b = story(&[(ThreatActor, "apt41")], &["bravo"]);
    // entity 1.0, keyword 0.0 -> 0.7
    let score = story_similarity(&a, &b, &SimilarityWeights::default());
    assert!((score - 0.7).abs() < EPS, "got {score}");
}

#[test]
fn custom_weights_apply() {
    use EntityCategory::*;
    let a = story(&[(ThreatActor, "apt41")], &["alpha"]);
    let b = story(&[(ThreatActor, "apt41")], &["bravo"]);
    let weights = SimilarityWeights {
        entity: 0.5,
        keyword: 0.5,
    };
    assert!((story_similarity(&a, &b, &weights) - 0.5).abs() < EPS);
}

#[test]
fn categories_are_discarded_when_flattening() {
    use EntityCategory::*;
    let a = story(&[(Sector, "energy")], &[]);
    let b = story(&[(Technique, "energy")], &[]);
    assert!((story_similarity(&a, &b, &SimilarityWeights::default()) - 1.0).abs() < EPS);
}

#[test]
fn symmetric_for_all_pairs() {
    let stories = sample_stories();
    let weights = SimilarityWeights::default();
    for a in &stories {
        for b in &stories {
            assert_eq!(
                story_similarity(a, b, &weights),
                story_similarity(b, a, &weights),
                "similarity must be symmetric"
            );
        }
    }
}

#[test]
fn range_is_unit_interval() {
    let stories = sample_stories();
    let weights = SimilarityWeights::default();
    for a in &stories {
        for b in &stories {
            let score = story_similarity(a, b, &weights);
            assert!((0.0..=1.0).contains(&score), "out of range: {score}");
        }
    }
}

#[test]
fn self_similarity_is_one_when_story_has_features() {
    let weights = SimilarityWeights::default();
    for s in sample_stories().iter().filter(|s| s.has_features()) {
        let score = story_similarity(s, s, &weights);
        assert!((score - 1.0).abs() < EPS, "self-similarity {score} for {s:?}");
    }
}

#[test]
fn keyword_only_story_is_self_similar() {
    let s = story(&[], &["bakery", "award"]);
    let breakdown = similarity_breakdown(&s, &s, &SimilarityWeights::default());
    assert_eq!(breakdown.entity, None);
    assert!((breakdown.combined - 1.0).abs() < EPS);
}

#[test]
fn empty_story_scores_zero_against_everything() {
    let empty = story(&[], &[]);
    let weights = SimilarityWeights::default();
    for other in sample_stories() {
        assert_eq!(story_similarity(&empty, &other, &weights), 0.0);
        assert_eq!(story_similarity(&other, &empty, &weights), 0.0);
    }
}

#[test]
fn entity_less_pair_does_not_get_entity_credit() {
    // Both lack entities: only the keyword signal is considered, and with no
    // shared keywords the score is zero.
    let a = story(&[], &["bakery"]);
    let b = story(&[], &["festival"]);
    let breakdown = similarity_breakdown(&a, &b, &SimilarityWeights::default());
    assert_eq!(breakdown.entity, None);
    assert_eq!(breakdown.combined, 0.0);
}

#[test]
fn entities_on_one_side_count_as_zero_overlap() {
    use EntityCategory::*;
    let a = story(&[(Country, "iran")], &["oil"]);
    let b = story(&[], &["oil"]);
    // entity 0.0 (union non-empty), keyword 1.0 -> 0.3
    let score = story_similarity(&a, &b, &SimilarityWeights::default());
    assert!((score - 0.3).abs() < EPS, "got {score}");
}

#[test]
fn keyword_order_does_not_matter() {
    let a = story(&[], &["grid", "power", "outage"]);
    let b = story(&[], &["outage", "grid", "power"]);
    assert!((story_similarity(&a, &b, &SimilarityWeights::default()) - 1.0).abs() < EPS);
}
