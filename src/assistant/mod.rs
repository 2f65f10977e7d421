//! Conversational assistant pipeline
//!
//! The answering engine behind the chat feature: sanitize the inbound
//! message, route its intent, retrieve from the local knowledge store, fall
//! back to live web search when allowed, apply safety templates where they
//! must win, and compose a formatted, disclaimed reply. Every stage returns
//! a tagged result or a fallback string; the orchestrator never lets an
//! error escape to the caller.

pub mod composer;
pub mod intent;
pub mod memory;
pub mod retriever;
pub mod safety;
pub mod sanitizer;
pub mod topic;
pub mod web_search;

pub use composer::Composer;
pub use memory::SessionMemory;
pub use retriever::{InMemoryKnowledgeStore, KnowledgeRetriever, KnowledgeStore, Retrieval};
pub use safety::SafetyPolicy;
pub use topic::naive_topic;
pub use web_search::{WebLookup, WebSearcher};

use crate::assistant::composer::{DISCLAIMER, SOURCES_UNAVAILABLE};
use crate::assistant::intent::{classify_intent, needs_external_lookup, Intent, LookupDecision};
use crate::assistant::sanitizer::profanity_filter;
use crate::care::{CalendarEvent, CareData, HealthMetrics};
use crate::chat::MessageRole;
use crate::error::AppError;
use crate::llm::GroqClient;
use std::sync::Arc;
use tracing::{info, warn};

/// Thresholds under which a tracked metric earns a health tip
const WATER_TIP_THRESHOLD: f64 = 5.0;
const SLEEP_TIP_THRESHOLD: f64 = 6.0;
const STEPS_TIP_THRESHOLD: i64 = 2000;

/// The conversation orchestrator
///
/// Owns the pipeline stages and the injected collaborators. One instance is
/// shared across requests; each call to [`Assistant::process_query`] is an
/// independent unit of work whose only cross-call state is the session
/// memory store.
#[derive(Clone)]
pub struct Assistant {
    llm: Arc<GroqClient>,
    composer: Composer,
    retriever: KnowledgeRetriever,
    searcher: WebSearcher,
    safety: SafetyPolicy,
    care: Arc<dyn CareData>,
    memory: SessionMemory,
}

impl Assistant {
    /// Assemble the pipeline from its stages
    pub fn new(
        llm: Arc<GroqClient>,
        composer: Composer,
        retriever: KnowledgeRetriever,
        searcher: WebSearcher,
        safety: SafetyPolicy,
        care: Arc<dyn CareData>,
        memory: SessionMemory,
    ) -> Self {
        Self {
            llm,
            composer,
            retriever,
            searcher,
            safety,
            care,
            memory,
        }
    }

    /// Answer one inbound chat message
    ///
    /// Final safety net of the pipeline: any error that slips through the
    /// per-stage handling is converted into a plain textual reply here, so
    /// the caller always gets a string back.
    pub async fn process_query(&self, message: &str, session_id: &str, user_id: i64) -> String {
        match self.answer_query(message, session_id, user_id).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Query processing failed");
                format!("Error processing query: {}", e)
            }
        }
    }

    async fn answer_query(
        &self,
        message: &str,
        session_id: &str,
        user_id: i64,
    ) -> Result<String, AppError> {
        let clean = profanity_filter(message);

        let personalization = self.personalization_prefix(user_id).await;

        let reply = match classify_intent(&clean) {
            Intent::AppointmentQuery => {
                info!(session_id = %session_id, "Appointment intent detected");
                self.todays_appointments(user_id).await
            }
            Intent::GeneralQuery => {
                let mut reply = self
                    .general_reply(&clean, personalization.as_deref())
                    .await?;
                reply.push_str(&self.health_tip_suffix(user_id).await);
                reply
            }
        };

        self.memory
            .append(session_id, MessageRole::User, &clean)
            .await;
        self.memory
            .append(session_id, MessageRole::Assistant, &reply)
            .await;

        Ok(reply)
    }

    /// The general-knowledge pipeline: retrieval, then safety, then the
    /// lookup-gated web fallback, then composition.
    async fn general_reply(
        &self,
        query: &str,
        personalization: Option<&str>,
    ) -> Result<String, AppError> {
        if let Retrieval::Answer(answer) = self.retriever.retrieve_and_summarize(query).await {
            return Ok(answer);
        }

        // Local knowledge came up empty. Safety templates take priority over
        // both the generic fallback and the web: they must never depend on
        // retrieval or search availability.
        if let Some(template) = self.safety.check(query) {
            return Ok(template);
        }

        if needs_external_lookup(&self.llm, query).await == LookupDecision::Lookup {
            match self.searcher.lookup(query).await {
                WebLookup::Found { info, sources } => {
                    return self
                        .composer
                        .compose(query, &info, &sources, personalization)
                        .await;
                }
                WebLookup::NoResults => {
                    return Ok(self.composer.redirect_reply(query, personalization).await);
                }
                WebLookup::Failed => {
                    return Ok(format!("{}{}", SOURCES_UNAVAILABLE, DISCLAIMER));
                }
            }
        }

        Ok(self.composer.redirect_reply(query, personalization).await)
    }

    /// Build the personalization prefix from the user's profile projection
    ///
    /// A profile fetch failure only loses personalization, never the reply.
    async fn personalization_prefix(&self, user_id: i64) -> Option<String> {
        let profile = match self.care.get_user_profile(user_id).await {
            Ok(profile) => profile?,
            Err(e) => {
                warn!(user_id = user_id, error = %e, "Profile lookup failed");
                return None;
            }
        };

        let mut prefix = String::new();
        if let Some(name) = profile.name.filter(|n| !n.is_empty()) {
            prefix.push_str(&format!("The user's name is {}. ", name));
        }
        if let Some(birthday) = profile.birthday.filter(|b| !b.is_empty()) {
            prefix.push_str(&format!("The user's birthday is {}. ", birthday));
        }

        (!prefix.is_empty()).then_some(prefix)
    }

    /// Render today's calendar events as a fixed markdown list
    async fn todays_appointments(&self, user_id: i64) -> String {
        let events = match self.care.get_today_events(user_id).await {
            Ok(events) => events,
            Err(e) => {
                warn!(user_id = user_id, error = %e, "Calendar lookup failed");
                return format!("Could not retrieve today's appointments: {}", e);
            }
        };

        render_appointments(&events)
    }

    /// Casual tip lines for any below-threshold metric tracked today
    async fn health_tip_suffix(&self, user_id: i64) -> String {
        let metrics = match self.care.get_today_health_metrics(user_id).await {
            Ok(Some(metrics)) => metrics,
            Ok(None) => return String::new(),
            Err(e) => {
                warn!(user_id = user_id, error = %e, "Health metrics lookup failed");
                return String::new();
            }
        };

        let tips = health_tips(&metrics);
        if tips.is_empty() {
            String::new()
        } else {
            format!("\n\n---\n{}", tips.join("\n"))
        }
    }

    /// Summarize a finished conversation (used at session end)
    pub async fn summarize_conversation(&self, conversation: &str) -> String {
        self.composer.summarize_conversation(conversation).await
    }

    /// Session memory handle (read access for diagnostics and tests)
    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }
}

/// Render the fixed appointments markdown
fn render_appointments(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return format!(
            "### Today's Appointments\n\nYou have no appointments scheduled for today.{}",
            DISCLAIMER
        );
    }

    let mut lines = vec!["### Today's Appointments\n".to_string()];
    for event in events {
        lines.push(format!(
            "- **{}** at {}\n  {}",
            event.title,
            event.event_time,
            event.description.as_deref().unwrap_or("")
        ));
    }
    format!("{}{}", lines.join("\n"), DISCLAIMER)
}

/// One tip line per below-threshold metric
fn health_tips(metrics: &HealthMetrics) -> Vec<&'static str> {
    let mut tips = Vec::new();
    if metrics.water_intake < WATER_TIP_THRESHOLD {
        tips.push("💧 Remember to drink some water today!");
    }
    if metrics.sleep_hours < SLEEP_TIP_THRESHOLD {
        tips.push("😴 Try to get some rest if you can.");
    }
    if metrics.steps < STEPS_TIP_THRESHOLD {
        tips.push("🚶‍♀️ A short walk might help you feel better.");
    }
    tips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_appointments_empty() {
        let rendered = render_appointments(&[]);
        assert!(rendered.starts_with("### Today's Appointments"));
        assert!(rendered.contains("no appointments scheduled"));
        assert!(rendered.contains("*Disclaimer:"));
    }

    #[test]
    fn test_render_appointments_lists_titles_and_times() {
        let events = vec![
            CalendarEvent {
                title: "Midwife checkup".to_string(),
                event_time: "09:30".to_string(),
                description: Some("Bring referral".to_string()),
            },
            CalendarEvent {
                title: "Ultrasound".to_string(),
                event_time: "14:00".to_string(),
                description: None,
            },
        ];
        let rendered = render_appointments(&events);
        assert!(rendered.contains("**Midwife checkup** at 09:30"));
        assert!(rendered.contains("**Ultrasound** at 14:00"));
        let checkup_pos = rendered.find("Midwife checkup").unwrap();
        let ultrasound_pos = rendered.find("Ultrasound").unwrap();
        assert!(checkup_pos < ultrasound_pos);
    }

    #[test]
    fn test_health_tips_thresholds() {
        let all_good = HealthMetrics {
            sleep_hours: 8.0,
            water_intake: 6.0,
            steps: 5000,
        };
        assert!(health_tips(&all_good).is_empty());

        let low_water = HealthMetrics {
            sleep_hours: 8.0,
            water_intake: 4.0,
            steps: 5000,
        };
        assert_eq!(health_tips(&low_water).len(), 1);

        let all_low = HealthMetrics {
            sleep_hours: 5.0,
            water_intake: 1.0,
            steps: 100,
        };
        assert_eq!(health_tips(&all_low).len(), 3);
    }

    #[test]
    fn test_health_tips_boundary_values_earn_no_tip() {
        let at_threshold = HealthMetrics {
            sleep_hours: 6.0,
            water_intake: 5.0,
            steps: 2000,
        };
        assert!(health_tips(&at_threshold).is_empty());
    }
}
