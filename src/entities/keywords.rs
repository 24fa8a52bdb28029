// Keyword extraction — frequency-ranked salient terms for one story.
//
// Title and body are lower-cased and split on anything that is not a Unicode
// letter or digit, so accented words stay whole. Tokens must start with a
// letter. Stop words and tokens shorter than three characters are dropped. Each title
// occurrence counts `title_weight` times, each body occurrence once. The
// top N terms by weighted count are kept; equal counts keep the term that
// appeared first (title before body).

use std::collections::{HashMap, HashSet};

use stop_words::{get, LANGUAGE};

/// Default number of keywords kept per story.
pub const DEFAULT_KEYWORD_COUNT: usize = 10;

/// Default multiplier for tokens that appear in the title.
pub const DEFAULT_TITLE_WEIGHT: u32 = 2;

/// Minimum token length in characters.
const MIN_TOKEN_LEN: usize = 3;

/// Split lower-cased text into word tokens that start with a letter.
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().next().is_some_and(char::is_alphabetic))
}

/// Frequency-based keyword extractor.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    /// How many keywords to keep per story
    pub top_n: usize,
    /// How much a title occurrence counts relative to a body occurrence
    pub title_weight: u32,
    stop_words: HashSet<String>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD_COUNT, DEFAULT_TITLE_WEIGHT)
    }
}

impl KeywordExtractor {
    /// Build an extractor using the English stop word list.
    pub fn new(top_n: usize, title_weight: u32) -> Self {
        let stop_words = get(LANGUAGE::English)
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self {
            top_n,
            title_weight,
            stop_words,
        }
    }

    /// Replace the stop word list.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words = words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Extract the ranked keyword list for a story.
    pub fn extract(&self, title: &str, text: &str) -> Vec<String> {
        if self.top_n == 0 {
            return Vec::new();
        }

        let title = title.to_lowercase();
        let text = text.to_lowercase();

        // term -> (weighted count, first position)
        let mut counts: HashMap<&str, (u32, usize)> = HashMap::new();
        let tokens = tokenize(&title)
            .map(|token| (token, self.title_weight))
            .chain(tokenize(&text).map(|token| (token, 1)));

        for (position, (token, weight)) in tokens
            .filter(|(token, _)| {
                token.chars().count() >= MIN_TOKEN_LEN && !self.is_stop_word(token)
            })
            .enumerate()
        {
            let entry = counts.entry(token).or_insert((0, position));
            entry.0 += weight;
        }

        let mut ranked: Vec<(&str, u32, usize)> = counts
            .into_iter()
            .filter(|(_, (count, _))| *count > 0)
            .map(|(term, (count, first))| (term, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));

        ranked
            .into_iter()
            .take(self.top_n)
            .map(|(term, _, _)| term.to_string())
            .collect()
    }
}
