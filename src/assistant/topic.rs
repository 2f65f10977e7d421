//! Frequency-based topic labeling
//!
//! Derives a short topic label from conversation text. Used at session end
//! to name sessions the user never titled.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Label returned when no usable keywords survive filtering
pub const FALLBACK_TOPIC: &str = "New Chat";

static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[a-z]{3,}\b").expect("word regex is valid")
});

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "is", "in", "and", "to", "a", "of", "that", "it", "on", "for", "you",
        "with", "as", "this", "are", "was", "but", "be", "at", "or", "not", "have",
        "from", "an", "by", "they", "we", "can", "if", "about", "your", "more",
        "what", "my", "do", "me", "so", "how", "i", "just", "like", "up", "out", "now",
    ]
    .into_iter()
    .collect()
});

/// Derive a topic label from conversation text
///
/// Lowercases the text, extracts alphabetic tokens of length >= 3, drops
/// stopwords, takes the 3 most frequent remaining tokens (ties broken by
/// first-encountered order) and joins them title-cased. Returns
/// [`FALLBACK_TOPIC`] when nothing survives filtering.
pub fn naive_topic(conversation: &str) -> String {
    let lowered = conversation.to_lowercase();

    // Count occurrences while remembering first-encounter order for tie-breaks
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for m in WORD_RE.find_iter(&lowered) {
        let word = m.as_str();
        if STOPWORDS.contains(word) {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    if order.is_empty() {
        return FALLBACK_TOPIC.to_string();
    }

    // Stable sort keeps first-encountered order among equal counts
    order.sort_by_key(|w| std::cmp::Reverse(counts[w]));

    let topic = order
        .iter()
        .take(3)
        .map(|w| title_case(w))
        .collect::<Vec<_>>()
        .join(" ");

    topic
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(naive_topic(""), "New Chat");
    }

    #[test]
    fn test_all_stopwords() {
        assert_eq!(naive_topic("the is in and"), "New Chat");
    }

    #[test]
    fn test_short_tokens_filtered() {
        assert_eq!(naive_topic("a to be or"), "New Chat");
    }

    #[test]
    fn test_most_frequent_first() {
        let text = "baby sleep sleep sleep feeding feeding baby bottle";
        assert_eq!(naive_topic(text), "Sleep Baby Feeding");
    }

    #[test]
    fn test_tie_broken_by_first_encounter() {
        let text = "vaccine schedule newborn";
        assert_eq!(naive_topic(text), "Vaccine Schedule Newborn");
    }

    #[test]
    fn test_deterministic() {
        let text = "user: how often should my newborn feed?\nassistant: newborn feeding happens every few hours";
        let first = naive_topic(text);
        for _ in 0..10 {
            assert_eq!(naive_topic(text), first);
        }
    }

    #[test]
    fn test_ignores_digits_and_punctuation() {
        assert_eq!(naive_topic("42 !!! ok"), "New Chat");
    }
}
