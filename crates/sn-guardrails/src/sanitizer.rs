//! Pre-generation prompt gate

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::debug;

use crate::rule_manager::RuleManager;
use crate::types::{GuardrailError, PromptKind, Violation, ViolationCategory};

/// ASCII punctuation acceptable in any prompt without an allow-list entry
const BASIC_PUNCTUATION: &str = ".,;:!?'\"-()[]&/%@#*+=_~";

/// Gates raw prompts before they reach a generation model.
///
/// Rejects, never rewrites: a prompt either passes unchanged or the call
/// fails with every violation found in the pass.
pub struct PromptSanitizer {
    rules: RuleManager,
}

impl PromptSanitizer {
    pub fn new(rules: RuleManager) -> Self {
        Self { rules }
    }

    /// Check `prompt` against the banned-term list and, for visual prompts,
    /// the character/emoji allow-list. Returns the prompt unchanged when it
    /// passes; fails with all violations collected otherwise.
    pub fn enforce<'a>(
        &self,
        prompt: &'a str,
        kind: PromptKind,
    ) -> Result<&'a str, GuardrailError> {
        let start = Instant::now();
        let compiled = self.rules.snapshot();
        // Sanitization runs before any profile context exists, so the
        // default rule set applies
        let rules = compiled.profile(None);

        let mut violations: Vec<Violation> = rules
            .matched_terms(prompt)
            .into_iter()
            .map(|term| {
                Violation::new(ViolationCategory::Safety, format!("banned term \"{}\"", term))
            })
            .collect();

        if kind.checks_characters() {
            violations.extend(
                disallowed_characters(prompt, &rules.allowed_characters)
                    .into_iter()
                    .map(|c| {
                        Violation::new(
                            ViolationCategory::Character,
                            format!("disallowed character '{}'", c),
                        )
                    }),
            );
        }

        debug!(
            "Prompt check ({:?}): {} terms, {} violations, {}ms",
            kind,
            rules.term_count(),
            violations.len(),
            start.elapsed().as_millis()
        );

        if violations.is_empty() {
            Ok(prompt)
        } else {
            Err(GuardrailError::new(violations))
        }
    }
}

/// Distinct characters in `text` outside the ASCII letter/digit/whitespace/
/// basic-punctuation baseline and not in the allow-list, in order of first
/// appearance.
fn disallowed_characters(text: &str, allowed: &BTreeSet<char>) -> Vec<char> {
    let mut seen = BTreeSet::new();
    let mut offenders = Vec::new();

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c.is_whitespace() || BASIC_PUNCTUATION.contains(c) {
            continue;
        }
        // Joiners and variation selectors only modify a neighbouring glyph
        if is_formatting(c) {
            continue;
        }
        if allowed.contains(&c) {
            continue;
        }
        if seen.insert(c) {
            offenders.push(c);
        }
    }

    offenders
}

fn is_formatting(c: char) -> bool {
    matches!(c, '\u{200D}' | '\u{FE0E}' | '\u{FE0F}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use sn_config::RuleLoader;
    use std::fs;
    use std::sync::Arc;
    use test_case::test_case;

    const RULES: &str = r#"
defaults:
  banned_terms: [goblin, nightmare fuel]
  allowed_emoji: ["🌙", "⭐"]
"#;

    fn sanitizer() -> (tempfile::TempDir, PromptSanitizer) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guardrails.yaml");
        fs::write(&path, RULES).unwrap();
        let loader = Arc::new(RuleLoader::load(path).unwrap());
        (dir, PromptSanitizer::new(RuleManager::new(loader)))
    }

    #[test]
    fn test_clean_prompt_passes_unchanged() {
        let (_dir, sanitizer) = sanitizer();
        let prompt = "A cozy cottage under a starry sky, soft light.";
        assert_eq!(sanitizer.enforce(prompt, PromptKind::Visual).unwrap(), prompt);
    }

    #[test_case("a goblin in the garden" ; "lowercase")]
    #[test_case("a GOBLIN in the garden" ; "uppercase")]
    #[test_case("a GoBlIn in the garden" ; "mixed case")]
    fn test_banned_term_rejected_any_casing(prompt: &str) {
        let (_dir, sanitizer) = sanitizer();
        let err = sanitizer.enforce(prompt, PromptKind::Narration).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].category, ViolationCategory::Safety);
        assert!(err.violations[0].detail.contains("goblin"));
    }

    #[test]
    fn test_allowed_emoji_passes() {
        let (_dir, sanitizer) = sanitizer();
        assert!(sanitizer
            .enforce("A quiet lake under the 🌙 and one ⭐", PromptKind::Visual)
            .is_ok());
    }

    #[test]
    fn test_disallowed_emoji_rejected_for_visual() {
        let (_dir, sanitizer) = sanitizer();
        let err = sanitizer
            .enforce("The brave hero ⚔️ saves the day.", PromptKind::Visual)
            .unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].category, ViolationCategory::Character);
        assert!(err.violations[0].detail.contains('⚔'));
    }

    #[test]
    fn test_narration_prompts_skip_character_check() {
        let (_dir, sanitizer) = sanitizer();
        assert!(sanitizer
            .enforce("The brave hero ⚔️ saves the day.", PromptKind::Narration)
            .is_ok());
    }

    #[test]
    fn test_all_violations_collected_in_one_error() {
        let (_dir, sanitizer) = sanitizer();
        let err = sanitizer
            .enforce("A goblin made of nightmare fuel 🗡 🗡", PromptKind::Visual)
            .unwrap_err();

        let safety = err
            .violations
            .iter()
            .filter(|v| v.category == ViolationCategory::Safety)
            .count();
        let character = err
            .violations
            .iter()
            .filter(|v| v.category == ViolationCategory::Character)
            .count();
        assert_eq!(safety, 2, "one violation per distinct banned term");
        assert_eq!(character, 1, "repeated character reported once");
    }

    #[test]
    fn test_basic_punctuation_needs_no_allow_list() {
        let (_dir, sanitizer) = sanitizer();
        assert!(sanitizer
            .enforce("Stars, moonlight; a lullaby (very soft) - the end?", PromptKind::Visual)
            .is_ok());
    }
}
