//! Response composition
//!
//! Assembles generative-model prompts (persona + personalization + gathered
//! context), normalizes raw model output into consistent markdown, and
//! appends the medical disclaimer every general-path reply must end with.

use crate::error::AppError;
use crate::llm::GroqClient;
use std::sync::Arc;

/// Persona directive used as the system instruction for every model call
pub const SYSTEM_PERSONA: &str =
    "You are a highly knowledgeable, caring nurse assistant specializing in pregnancy and \
     postpartum care. Always assume the user is pregnant or recently gave birth. Provide \
     detailed, step-by-step, and empathetic medical explanations. Format your answers with \
     clear sections, bullet points, and headings for readability. Never refuse unless its \
     unrelated to answer medical questions, but always include a gentle disclaimer that your \
     advice does not replace professional medical consultation.";

/// Fixed disclaimer appended to every assistant reply
pub const DISCLAIMER: &str =
    "\n\n*Disclaimer: This advice is for informational purposes only and does not replace \
     professional medical consultation. Always consult your healthcare provider for personal \
     medical advice.*";

/// Stronger caveat appended when the reply was built from external sources
pub const EXTERNAL_SOURCE_NOTE: &str =
    "\n\n*Note: Information from external sources is for reference only. Always consult your \
     healthcare provider before making decisions about medication or treatment.*";

/// Fixed reply when the web fallback failed outright
pub const SOURCES_UNAVAILABLE: &str =
    "I'm having trouble accessing external sources right now.";

/// Fallback reply when even the redirect model call fails
const REDIRECT_FALLBACK: &str =
    "I'm here to help with any pregnancy or postpartum questions you have.";

/// Fallback summary when the summarizer model call fails
const SUMMARY_FALLBACK: &str = "Conversation summary unavailable";

/// Normalize raw model output into consistent markdown
///
/// Collapses double newlines, converts leading `- ` bullets to `• `, and
/// bolds `key: value` lines that are not URLs.
pub fn format_pretty(text: &str) -> String {
    let collapsed = text.replace("\n\n", "\n");
    let mut formatted = Vec::new();
    for line in collapsed.split('\n') {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("- ") {
            formatted.push(format!("• {}", rest));
        } else if line.contains(':') && !line.starts_with("http") {
            let (key, val) = line.split_once(':').unwrap_or((line, ""));
            formatted.push(format!("**{}**: {}", key.trim(), val.trim()));
        } else {
            formatted.push(line.to_string());
        }
    }
    formatted.join("\n")
}

/// Builds model prompts and formats replies
#[derive(Clone)]
pub struct Composer {
    llm: Arc<GroqClient>,
}

impl Composer {
    /// Create a composer over the shared model client
    pub fn new(llm: Arc<GroqClient>) -> Self {
        Self { llm }
    }

    /// Combine the persona directive with an optional personalization prefix
    pub fn system_prompt(personalization: Option<&str>) -> String {
        match personalization {
            Some(prefix) if !prefix.is_empty() => format!("{}{}", prefix, SYSTEM_PERSONA),
            _ => SYSTEM_PERSONA.to_string(),
        }
    }

    /// Compose the final answer from gathered context
    ///
    /// Embeds the query, the info context and the source list into one
    /// conversational-tone instruction (mandatory "Sources:" section when
    /// sources exist, 5-7 line cap), formats the reply, appends the
    /// external-source caveat when sources were used, then the disclaimer.
    pub async fn compose(
        &self,
        query: &str,
        info: &str,
        sources: &[String],
        personalization: Option<&str>,
    ) -> Result<String, AppError> {
        let sources_text = if sources.is_empty() {
            "None".to_string()
        } else {
            sources
                .iter()
                .map(|link| format!("- {}", link))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = format!(
            "You are a friendly nurse assistant. The user asked: '{}'. \
             Here is some information I found: {} \
             Here are the sources: {} \
             Please answer the user's question in a conversational, supportive, and concise \
             way, as if you are chatting with them directly. Always include a 'Sources:' \
             section if a lookup was performed, and remind the user to consult their \
             healthcare provider before acting on any information from external sources. \
             Format your response in clear, concise markdown (use lists, headings, and bold \
             where appropriate). Limit your response to 5-7 lines.",
            query, info, sources_text
        );

        let raw = self
            .llm
            .chat(&Self::system_prompt(personalization), &prompt)
            .await?;

        let mut answer = format_pretty(raw.trim());
        if !sources.is_empty() {
            answer.push_str(EXTERNAL_SOURCE_NOTE);
        }
        answer.push_str(DISCLAIMER);
        Ok(answer)
    }

    /// Reply for questions the assistant has no information about
    ///
    /// Gently redirects toward pregnancy/postpartum/childcare subjects. A
    /// model failure here degrades to a fixed supportive line rather than
    /// surfacing an error.
    pub async fn redirect_reply(&self, query: &str, personalization: Option<&str>) -> String {
        let prompt = format!(
            "You are a friendly nurse assistant. The user asked: '{}'. \
             You do not have relevant information to answer this directly. However, if the \
             user is asking about food, meals, or nutrition, suggest healthy meal ideas and \
             nutrition tips for pregnant or postpartum women. Otherwise, respond in a warm, \
             concise, and supportive way, gently letting the user know you don't have \
             information on that topic, and encourage them to ask about pregnancy, \
             postpartum, or childcare. Do not go off-topic. Format your response in clear, \
             concise markdown (use lists, headings, and bold where appropriate). Limit your \
             response to 5-7 lines.",
            query
        );

        let reply = match self
            .llm
            .chat(&Self::system_prompt(personalization), &prompt)
            .await
        {
            Ok(raw) => raw.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Redirect model call failed, using fallback reply");
                REDIRECT_FALLBACK.to_string()
            }
        };

        format!("{}{}", reply, DISCLAIMER)
    }

    /// Soften raw text into the assistant's voice and format it
    pub async fn soften(&self, raw: &str) -> Result<String, AppError> {
        let resp = self.llm.chat(SYSTEM_PERSONA, raw).await?;
        Ok(format_pretty(resp.trim()))
    }

    /// Summarize a finished conversation in 2-3 sentences
    ///
    /// Used at session end; a model failure yields a neutral fallback so the
    /// session can still be closed.
    pub async fn summarize_conversation(&self, conversation: &str) -> String {
        let prompt = format!(
            "Please summarize the following conversation between a user and an AI assistant \
             about pregnancy, postpartum, or childcare. Focus on key topics discussed and \
             any important advice given. Keep it concise (2-3 sentences max).\n\n\
             Conversation:\n{}",
            conversation
        );

        match self
            .llm
            .chat(
                "You are a helpful summarizer for healthcare conversations.",
                &prompt,
            )
            .await
        {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Conversation summary call failed");
                SUMMARY_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty_bullets() {
        assert_eq!(format_pretty("- rest well\n- drink water"), "• rest well\n• drink water");
    }

    #[test]
    fn test_format_pretty_bolds_key_value() {
        assert_eq!(format_pretty("Sleep: 8 hours"), "**Sleep**: 8 hours");
    }

    #[test]
    fn test_format_pretty_skips_urls() {
        let url = "https://example.com/article";
        assert_eq!(format_pretty(url), url);
    }

    #[test]
    fn test_format_pretty_collapses_double_newlines() {
        assert_eq!(format_pretty("first\n\nsecond"), "first\nsecond");
    }

    #[test]
    fn test_format_pretty_plain_line_unchanged() {
        assert_eq!(format_pretty("Take care of yourself"), "Take care of yourself");
    }

    #[test]
    fn test_system_prompt_personalized() {
        let prompt = Composer::system_prompt(Some("The user's name is Maya. "));
        assert!(prompt.starts_with("The user's name is Maya. "));
        assert!(prompt.ends_with(SYSTEM_PERSONA));
    }

    #[test]
    fn test_system_prompt_plain() {
        assert_eq!(Composer::system_prompt(None), SYSTEM_PERSONA);
    }
}
