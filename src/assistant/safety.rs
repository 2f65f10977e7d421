//! Safety-sensitive response policies
//!
//! Keyword classification for the two high-risk categories that must never
//! be answered by generation or depend on retrieval success: medication
//! safety and mental-health crisis. Matching queries get fixed, reviewed
//! templates. The policy is a plain value so keyword lists can be tuned and
//! tested without touching orchestration logic.

use crate::assistant::composer::DISCLAIMER;

/// High-risk category detected in a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyCategory {
    /// Questions about taking medication while pregnant or nursing
    Medication,
    /// Signals of emotional distress or self-harm risk
    MentalHealthCrisis,
}

/// Keyword-based safety classifier with fixed response templates
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    medication_keywords: Vec<&'static str>,
    crisis_keywords: Vec<&'static str>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            medication_keywords: vec![
                "medication", "medicine", "drug", "paracetamol", "acetaminophen",
                "ibuprofen", "antibiotic", "pill", "tablet", "painkiller",
                "safe to take", "is it safe", "can i take",
            ],
            crisis_keywords: vec![
                "depressed", "depression", "sad", "hopeless", "suicidal", "suicide",
                "kill myself", "ending my life", "worthless", "can't go on",
                "mental health", "anxious", "anxiety", "panic attack", "overwhelmed",
                "crying", "helpless", "lonely", "alone", "no one cares",
            ],
        }
    }
}

impl SafetyPolicy {
    /// Classify a query against the keyword lists
    ///
    /// Substring match, case-insensitive, unordered; any keyword present
    /// triggers. Medication is checked before mental health when both sets
    /// match.
    pub fn classify(&self, query: &str) -> Option<SafetyCategory> {
        let q = query.to_lowercase();
        if self.medication_keywords.iter().any(|kw| q.contains(kw)) {
            return Some(SafetyCategory::Medication);
        }
        if self.crisis_keywords.iter().any(|kw| q.contains(kw)) {
            return Some(SafetyCategory::MentalHealthCrisis);
        }
        None
    }

    /// The fixed, reviewed template for a category, disclaimer included
    pub fn template(&self, category: SafetyCategory) -> String {
        match category {
            SafetyCategory::Medication => format!("{}{}", MEDICATION_TEMPLATE, DISCLAIMER),
            SafetyCategory::MentalHealthCrisis => format!("{}{}", CRISIS_TEMPLATE, DISCLAIMER),
        }
    }

    /// Classify and return the matching template, if any
    pub fn check(&self, query: &str) -> Option<String> {
        self.classify(query).map(|category| {
            tracing::info!(?category, "Safety template selected for query");
            self.template(category)
        })
    }
}

const MEDICATION_TEMPLATE: &str = "### Medication Safety\n\n\
I'm here to support you with information and guidance. While I can't provide a definitive answer \
on the safety of specific medications like paracetamol during pregnancy or postpartum, I encourage \
you to consult your healthcare provider for personalized advice.\n\n\
If you'd like, I can help you find general information from reputable sources, but always check \
with your provider before taking any medication.\n";

const CRISIS_TEMPLATE: &str = "# I'm Here for You\n\n\
I'm so sorry you're feeling this way. Your feelings are valid, and you are not alone.\n\n\
If you're having thoughts of self-harm or suicide, please know that you matter and your life is \
important. It can help to talk about what you're feeling.\n\n\
**Would you like to share more about what's on your mind? I'm here to listen and support you.**\n\n\
Here are a few things you can try right now that might help, even a little:\n\
- **Take a few deep breaths** and try to relax your shoulders.\n\
- **Reach out to someone you trust**—a friend, family member, or your healthcare provider.\n\
- **Go for a short walk** or step outside for some fresh air if you can.\n\
- **Write down your feelings** or talk to someone about them.\n\
- **Remember:** You are not alone, and things can get better.\n\n\
If you are in crisis or need someone to talk to immediately, please consider reaching out to a helpline:\n\n\
- **National Suicide Prevention Lifeline (US):** 1-800-273-8255\n\
- **Samaritans (UK):** 116 123\n\
- **Crisis Text Line:** Text HOME to 741741 (US/Canada/UK)\n\
- **Befrienders Worldwide:** https://www.befrienders.org/ (for international support)\n\n\
You are not a burden. If you'd like, I can stay with you and chat, suggest gentle self-care ideas, \
or help you find ways to talk to your provider about how you're feeling. Just let me know how I can \
support you.\n";
