//! Intent routing
//!
//! Decides whether an incoming message is an appointment-lookup request or a
//! general knowledge question, and whether a general question needs an
//! external lookup at all.

use crate::llm::GroqClient;
use once_cell::sync::Lazy;
use regex::Regex;

/// Classified intent of an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// The user is asking about today's schedule/appointments
    AppointmentQuery,
    /// Anything else
    GeneralQuery,
}

static APPOINTMENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"today.*appointment",
        r"appointment.*today",
        r"today.*schedule",
        r"schedule.*today",
        r"what.*appointment.*today",
        r"do i have.*appointment.*today",
        r"any.*appointment.*today",
        r"what.*events.*today",
        r"today.*events",
        r"calendar.*today",
        r"today.*calendar",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("appointment pattern is valid"))
    .collect()
});

/// Classify a message against the appointment phrasing patterns
///
/// Matches the lowercased message; first match wins, no match means a
/// general query.
pub fn classify_intent(message: &str) -> Intent {
    let lowered = message.to_lowercase();
    if APPOINTMENT_PATTERNS.iter().any(|p| p.is_match(&lowered)) {
        Intent::AppointmentQuery
    } else {
        Intent::GeneralQuery
    }
}

/// Outcome of the lookup-decision model call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupDecision {
    /// The question needs external sources
    Lookup,
    /// The model can answer from general knowledge
    NoLookup,
}

impl LookupDecision {
    /// Parse a model reply into a decision
    ///
    /// The prompt demands an exact YES or NO token; only a leading YES or NO
    /// word after trimming and uppercasing is accepted. Anything else (an
    /// ambiguous reply like "NOT SURE" included) resolves to `NoLookup`,
    /// keeping the cheaper local path.
    pub fn parse(reply: &str) -> Self {
        let normalized = reply.trim().to_uppercase();
        let first_word = normalized
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|s| !s.is_empty());
        match first_word {
            Some("YES") => LookupDecision::Lookup,
            Some("NO") => LookupDecision::NoLookup,
            _ => {
                tracing::warn!(reply = %reply, "Ambiguous lookup decision, defaulting to no lookup");
                LookupDecision::NoLookup
            }
        }
    }
}

/// Ask the model whether a query requires looking up external sources
///
/// A model failure also resolves to `NoLookup`; the pipeline still has the
/// redirect reply behind it.
pub async fn needs_external_lookup(llm: &GroqClient, query: &str) -> LookupDecision {
    let prompt = format!(
        "You are an expert assistant. Decide if the following user question requires looking \
         up external sources or if you can answer it from your own knowledge. Answer ONLY \
         'YES' or 'NO'.\n\nUser question: {}",
        query
    );

    match llm
        .chat(crate::assistant::composer::SYSTEM_PERSONA, &prompt)
        .await
    {
        Ok(reply) => LookupDecision::parse(&reply),
        Err(e) => {
            tracing::warn!(error = %e, "Lookup decision call failed, defaulting to no lookup");
            LookupDecision::NoLookup
        }
    }
}
