use crate::core::text::{tokenize, words};
use std::collections::{BTreeMap, BTreeSet};

/// Research areas recognised as single keywords even though they span several words
const RESEARCH_VOCABULARY: &[&str] = &[
    "artificial intelligence",
    "autonomous systems",
    "bioinformatics",
    "blockchain",
    "computational biology",
    "computer architecture",
    "computer graphics",
    "computer vision",
    "control systems",
    "cybersecurity",
    "data mining",
    "data science",
    "deep learning",
    "distributed systems",
    "embedded systems",
    "formal methods",
    "game theory",
    "human computer interaction",
    "information extraction",
    "information retrieval",
    "machine learning",
    "machine translation",
    "medical imaging",
    "multi agent systems",
    "natural language processing",
    "neural networks",
    "operating systems",
    "programming languages",
    "quantum computing",
    "reinforcement learning",
    "robotics",
    "sensor networks",
    "signal processing",
    "software engineering",
    "speech recognition",
    "text mining",
];

/// Common acronyms and the vocabulary phrase they stand for
const ACRONYMS: &[(&str, &str)] = &[
    ("ai", "artificial intelligence"),
    ("cv", "computer vision"),
    ("dl", "deep learning"),
    ("hci", "human computer interaction"),
    ("ir", "information retrieval"),
    ("ml", "machine learning"),
    ("nlp", "natural language processing"),
    ("rl", "reinforcement learning"),
];

/// Shortest single-word keyword kept from free text
const MIN_TOKEN_KEYWORD_LEN: usize = 4;

/// Generic academic words that carry no topical signal on their own
const GENERIC_WORDS: &[&str] = &["analysis", "applications", "research", "study", "studies", "theory"];

/// Vocabulary-driven keyword extraction with a bounded output size
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    max_keywords: usize,
    vocabulary: Vec<Vec<String>>,
}

impl KeywordExtractor {
    pub fn new(max_keywords: usize) -> Self {
        let mut vocabulary: Vec<Vec<String>> = RESEARCH_VOCABULARY.iter().map(|p| words(p)).collect();
        // Longest phrases first so "deep reinforcement learning" style overlaps resolve greedily
        vocabulary.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self {
            max_keywords,
            vocabulary,
        }
    }

    /// Extract keywords from free text plus an optional explicit keyword list
    ///
    /// Priority when the bound is hit: explicit keywords, then vocabulary
    /// phrases in order of appearance, then remaining content words by
    /// frequency (ties alphabetical).
    pub fn extract(&self, text: &str, explicit: &[String]) -> BTreeSet<String> {
        let mut ordered: Vec<String> = Vec::new();

        for keyword in explicit {
            push(canonical(keyword), &mut ordered);
        }

        let tokens = expand_acronyms(&words(text));
        let mut consumed = vec![false; tokens.len()];
        let mut phrases: Vec<(usize, String)> = Vec::new();

        for phrase in &self.vocabulary {
            let n = phrase.len();
            if n == 0 || n > tokens.len() {
                continue;
            }
            for start in 0..=tokens.len() - n {
                if consumed[start..start + n].iter().any(|c| *c) {
                    continue;
                }
                if tokens[start..start + n] == phrase[..] {
                    consumed[start..start + n].iter_mut().for_each(|c| *c = true);
                    phrases.push((start, phrase.join(" ")));
                }
            }
        }
        phrases.sort();
        for (_, phrase) in phrases {
            push(phrase, &mut ordered);
        }

        let leftover: Vec<&str> = tokens
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|(t, _)| t.as_str())
            .collect();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for token in tokenize(&leftover.join(" ")) {
            if token.chars().count() >= MIN_TOKEN_KEYWORD_LEN && !GENERIC_WORDS.contains(&token.as_str()) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
        let mut frequent: Vec<(String, usize)> = counts.into_iter().collect();
        frequent.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (token, _) in frequent {
            push(token, &mut ordered);
        }

        ordered.truncate(self.max_keywords);
        ordered.into_iter().collect()
    }
}

fn push(keyword: String, ordered: &mut Vec<String>) {
    if !keyword.is_empty() && !ordered.contains(&keyword) {
        ordered.push(keyword);
    }
}

fn canonical(keyword: &str) -> String {
    expand_acronyms(&words(keyword)).join(" ")
}

fn expand_acronyms(tokens: &[String]) -> Vec<String> {
    let mut expanded = Vec::with_capacity(tokens.len());
    for token in tokens {
        match ACRONYMS.iter().find(|(short, _)| *short == token.as_str()) {
            Some((_, long)) => expanded.extend(words(long)),
            None => expanded.push(token.clone()),
        }
    }
    expanded
}

/// Overlap divided by union size
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}
