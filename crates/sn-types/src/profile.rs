//! Listener profile shape consumed from the story pipeline

use serde::{Deserialize, Serialize};

/// Profile of the listener a story is generated for.
///
/// Owned by the story pipeline; the guardrails only read `profile` to look
/// up per-profile rule overrides and never mutate the rest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserProfile {
    /// Key into the rule file's `profiles` map (e.g. "anxious")
    pub profile: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,

    /// Bedtime routine description, free-form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routine: Option<String>,

    #[serde(default)]
    pub preferences: Vec<String>,
}

impl UserProfile {
    /// Profile with only the override-lookup key set
    pub fn named(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            ..Self::default()
        }
    }
}
