//! Input sanitization
//!
//! Masks profane terms in raw user input before it reaches the pipeline,
//! the message log or any model prompt.

use once_cell::sync::Lazy;
use regex::Regex;

// Fixed four-character mask regardless of word length
const MASK: &str = "****";

static PROFANITY_RE: Lazy<Regex> = Lazy::new(|| {
    // Word-boundary match over a fixed wordlist, case-insensitive
    let words = [
        "fuck", "fucking", "shit", "bitch", "bastard", "asshole", "dick",
        "piss", "crap", "damn", "goddamn", "bollocks", "wanker",
    ];
    let pattern = format!(r"(?i)\b(?:{})\b", words.join("|"));
    Regex::new(&pattern).expect("profanity regex is valid")
});

/// Mask profane terms in a message
///
/// Always returns a string; identity when nothing matched. Emits a
/// diagnostic when censoring occurred.
pub fn profanity_filter(text: &str) -> String {
    let censored = PROFANITY_RE.replace_all(text, MASK);
    if censored != text {
        tracing::warn!("Profanity censored from user message");
    }
    censored.into_owned()
}
