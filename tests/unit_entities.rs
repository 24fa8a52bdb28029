// Unit tests for entity and keyword extraction.
//
// Exercises the bundled dictionary through DictionaryExtractor (case,
// word boundaries, canonicalization, CVE pattern), custom dictionaries, the
// keyword ranking rules, and story enrichment.

use mosaic::entities::dictionary::EntityDictionary;
use mosaic::entities::keywords::KeywordExtractor;
use mosaic::entities::matcher::DictionaryExtractor;
use mosaic::entities::traits::{EntityExtractor, ExtractorBackend};
use mosaic::entities::types::EntityCategory;
use mosaic::entities::{enrich_stories, enrich_story};
use mosaic::stories::Story;

fn extractor() -> DictionaryExtractor {
    DictionaryExtractor::bundled().unwrap()
}

fn values(extractor: &DictionaryExtractor, text: &str, category: EntityCategory) -> Vec<String> {
    extractor
        .extract("", text)
        .unwrap()
        .get(&category)
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default()
}

// ============================================================
// Dictionary matching
// ============================================================

#[test]
fn demonyms_and_capitals_canonicalize_to_country() {
    let ex = extractor();
    assert_eq!(
        values(&ex, "Chinese hackers and Beijing officials denied it", EntityCategory::Country),
        vec!["china"]
    );
}

#[test]
fn matching_is_case_insensitive() {
    let ex = extractor();
    assert_eq!(values(&ex, "FANCY BEAR strikes again", EntityCategory::ThreatActor), vec!["apt28"]);
    assert_eq!(values(&ex, "apt41 and Apt41", EntityCategory::ThreatActor), vec!["apt41"]);
}

#[test]
fn matching_respects_word_boundaries() {
    let ex = extractor();
    assert!(values(&ex, "Chinatown festival draws crowds", EntityCategory::Country).is_empty());
    assert!(values(&ex, "the contiguous states", EntityCategory::Malware).is_empty());
}

#[test]
fn longest_alias_wins() {
    let ex = extractor();
    assert_eq!(
        values(&ex, "North Korean operators", EntityCategory::Country),
        vec!["north korea"]
    );
    let techniques = values(&ex, "A SPEAR-PHISHING wave", EntityCategory::Technique);
    assert_eq!(techniques, vec!["spear phishing"]);
}

#[test]
fn hyphen_and_space_variants_match() {
    let ex = extractor();
    assert_eq!(
        values(&ex, "zero-day in the wild", EntityCategory::Technique),
        vec!["zero day"]
    );
    assert_eq!(
        values(&ex, "a zero day was patched", EntityCategory::Technique),
        vec!["zero day"]
    );
}

#[test]
fn unknown_aliases_are_not_recognized() {
    let ex = extractor();
    assert!(values(&ex, "Panda Bear group spotted", EntityCategory::ThreatActor).is_empty());
}

#[test]
fn cve_pattern_normalized_to_lowercase() {
    let ex = extractor();
    assert_eq!(
        values(&ex, "Ivanti flaw CVE-2024-21887 exploited", EntityCategory::Cve),
        vec!["cve-2024-21887"]
    );
}

#[test]
fn cve_with_too_few_digits_ignored() {
    let ex = extractor();
    assert!(values(&ex, "see CVE-2024-123 for details", EntityCategory::Cve).is_empty());
}

#[test]
fn multiple_categories_from_one_headline() {
    let entities = extractor()
        .extract("LockBit 3.0 claims attack on hospital", "")
        .unwrap();
    assert!(entities[&EntityCategory::Malware].contains("lockbit"));
    assert!(entities[&EntityCategory::Sector].contains("healthcare"));
}

#[test]
fn extraction_is_deterministic() {
    let ex = extractor();
    let text = "Russian Sandworm used Industroyer against a Ukrainian power grid";
    assert_eq!(ex.extract("t", text).unwrap(), ex.extract("t", text).unwrap());
}

#[test]
fn empty_and_whitespace_text_yield_nothing() {
    let ex = extractor();
    assert!(ex.extract("", "").unwrap().is_empty());
    assert!(ex.extract("   ", "\n\t").unwrap().is_empty());
}

// ============================================================
// Custom dictionaries
// ============================================================

#[test]
fn added_alias_is_recognized() {
    let mut dict = EntityDictionary::bundled().unwrap();
    dict.add_alias(EntityCategory::Person, "xi jinping", "president xi");
    let ex = DictionaryExtractor::new(std::sync::Arc::new(dict.compile().unwrap()));

    let entities = ex.extract("President Xi meets envoy", "").unwrap();
    assert!(entities[&EntityCategory::Person].contains("xi jinping"));
}

#[test]
fn dictionary_loads_from_file() {
    let path = std::env::temp_dir().join("mosaic_test_dictionary.json");
    std::fs::write(
        &path,
        r#"{"aliases": {"malware": {"gootloader": ["goot loader"]}}, "patterns": {}}"#,
    )
    .unwrap();

    let dict = EntityDictionary::from_path(&path).unwrap();
    let ex = DictionaryExtractor::new(std::sync::Arc::new(dict.compile().unwrap()));
    let entities = ex.extract("Goot-Loader returns", "").unwrap();
    assert!(entities[&EntityCategory::Malware].contains("gootloader"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn malformed_dictionary_file_is_an_error() {
    let path = std::env::temp_dir().join("mosaic_test_bad_dictionary.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(EntityDictionary::from_path(&path).is_err());
    std::fs::remove_file(&path).ok();
}

#[test]
fn backend_names_parse() {
    assert_eq!("dictionary".parse::<ExtractorBackend>().unwrap(), ExtractorBackend::Dictionary);
    assert_eq!("ONNX".parse::<ExtractorBackend>().unwrap(), ExtractorBackend::Onnx);
    assert!("spacy".parse::<ExtractorBackend>().is_err());
}

// ============================================================
// Keywords
// ============================================================

#[test]
fn keywords_ranked_by_frequency_with_first_occurrence_ties() {
    let kw = KeywordExtractor::new(10, 2).with_stop_words(["the", "and"]);
    let result = kw.extract("", "pipeline outage pipeline operator outage gas");
    assert_eq!(result, vec!["pipeline", "outage", "operator", "gas"]);
}

#[test]
fn title_weight_is_configurable() {
    let body = "hospital hospital";
    let weighted = KeywordExtractor::new(10, 3).with_stop_words(Vec::<String>::new());
    assert_eq!(weighted.extract("ransomware", body)[0], "ransomware");

    let flat = KeywordExtractor::new(10, 1).with_stop_words(Vec::<String>::new());
    assert_eq!(flat.extract("ransomware", body)[0], "hospital");
}

#[test]
fn default_extractor_drops_english_stop_words() {
    let kw = KeywordExtractor::default();
    assert!(kw.is_stop_word("the"));
    let result = kw.extract("The ransomware and the hospital", "");
    assert!(!result.iter().any(|k| k == "the" || k == "and"), "Got {result:?}");
    assert!(result.iter().any(|k| k == "ransomware"));
}

#[test]
fn accented_words_are_not_split_into_fragments() {
    let kw = KeywordExtractor::default();
    let result = kw.extract("Café résumé leak in Zürich", "");
    assert_eq!(result, vec!["café", "résumé", "leak", "zürich"]);

    // No ASCII tail of "Zürich" leaks out to match an unrelated word.
    let other = kw.extract("Rich investors sue", "");
    assert!(!other.iter().any(|k| result.contains(k)), "Got {other:?}");
}

#[test]
fn keyword_count_caps_output() {
    let kw = KeywordExtractor::new(3, 2).with_stop_words(Vec::<String>::new());
    let result = kw.extract("", "alpha bravo charlie delta echo foxtrot");
    assert_eq!(result.len(), 3);
}

// ============================================================
// Enrichment
// ============================================================

#[test]
fn enrich_writes_entities_and_keywords() {
    let ex = extractor();
    let kw = KeywordExtractor::default();
    let mut story = Story::new(
        "https://example.com/1",
        "Volt Typhoon targets water utilities",
        "Officials say the intrusion began months ago.",
    );

    enrich_story(&mut story, &ex, &kw).unwrap();

    assert!(story.entities[&EntityCategory::ThreatActor].contains("volt typhoon"));
    assert!(story.entities[&EntityCategory::Sector].contains("water"));
    assert!(story.entities[&EntityCategory::Technique].contains("intrusion"));
    assert!(!story.keywords.is_empty());
}

#[test]
fn enrich_handles_empty_records() {
    let ex = extractor();
    let kw = KeywordExtractor::default();
    let mut stories = vec![Story::new("u1", "", ""), Story::new("u2", "Kimsuky phishing", "")];

    enrich_stories(&mut stories, &ex, &kw).unwrap();

    assert!(stories[0].entities.is_empty());
    assert!(stories[0].keywords.is_empty());
    assert!(stories[1].has_features());
}

#[test]
fn enrichment_is_idempotent() {
    let ex = extractor();
    let kw = KeywordExtractor::default();
    let mut story = Story::new("u", "APT29 phishing wave", "Cozy Bear hit government agencies");

    enrich_story(&mut story, &ex, &kw).unwrap();
    let first = story.clone();
    enrich_story(&mut story, &ex, &kw).unwrap();

    assert_eq!(story, first);
}
