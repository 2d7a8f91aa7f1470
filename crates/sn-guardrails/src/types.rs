//! Type definitions for the guardrail checks

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a rule breach
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    /// A banned term was matched
    Safety,
    /// A tone heuristic threshold was exceeded
    Tone,
    /// A disallowed character or emoji appeared in a prompt
    Character,
}

impl std::fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safety => write!(f, "safety"),
            Self::Tone => write!(f, "tone"),
            Self::Character => write!(f, "character"),
        }
    }
}

/// One rule breach found in a prompt or a generated story.
///
/// Serializable so the API layer can enumerate violations in a 422 payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub category: ViolationCategory,
    /// Names the offending term, threshold, or character
    pub detail: String,
}

impl Violation {
    pub fn new(category: ViolationCategory, detail: impl Into<String>) -> Self {
        Self {
            category,
            detail: detail.into(),
        }
    }
}

/// Kind of prompt being sanitized before generation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Story text prompt
    Narration,
    /// Image generation prompt
    Visual,
}

impl PromptKind {
    /// Whether the character/emoji allow-list applies to this kind.
    /// Image-prompt tokens are format-sensitive; narration prompts are not.
    pub fn checks_characters(&self) -> bool {
        matches!(self, Self::Visual)
    }
}

/// Raised by the prompt sanitizer when a prompt fails any check.
///
/// Carries every violation found in the pass, not just the first, so the
/// caller can report all of them at once.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("prompt rejected with {} violation(s)", .violations.len())]
pub struct GuardrailError {
    pub violations: Vec<Violation>,
}

impl GuardrailError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&ViolationCategory::Safety).unwrap();
        assert_eq!(json, "\"safety\"");
    }

    #[test]
    fn test_violation_json_shape_for_api_payload() {
        let violation = Violation::new(ViolationCategory::Tone, "12 exclamation points exceed limit of 10");
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["category"], "tone");
        assert_eq!(json["detail"], "12 exclamation points exceed limit of 10");
    }

    #[test]
    fn test_error_display_counts_violations() {
        let err = GuardrailError::new(vec![
            Violation::new(ViolationCategory::Safety, "banned term \"goblin\""),
            Violation::new(ViolationCategory::Character, "disallowed character '⚔'"),
        ]);
        assert_eq!(err.to_string(), "prompt rejected with 2 violation(s)");
    }

    #[test]
    fn test_visual_prompts_get_character_checks() {
        assert!(PromptKind::Visual.checks_characters());
        assert!(!PromptKind::Narration.checks_characters());
    }
}
