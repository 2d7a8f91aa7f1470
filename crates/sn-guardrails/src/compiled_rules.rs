//! Resolved rule sets compiled into regex::RegexSet for fast matching

use std::collections::BTreeSet;

use regex::RegexSet;
use tracing::warn;

use sn_config::{GuardrailConfig, ToneThresholds};

/// One profile's resolved rules, compiled for matching.
///
/// Banned terms become case-insensitive whole-word patterns in a single
/// `RegexSet`; the source terms are kept indexed alongside so a set match
/// maps back to the offending term.
#[derive(Debug)]
pub struct CompiledProfile {
    /// Lowercased source terms, indexed to match the set's patterns
    terms: Vec<String>,
    term_set: Option<RegexSet>,
    pub thresholds: ToneThresholds,
    pub allowed_characters: BTreeSet<char>,
}

impl CompiledProfile {
    /// Compile a resolved config into a matchable profile
    pub fn compile(config: &GuardrailConfig) -> Self {
        let patterns: Vec<String> = config
            .banned_terms
            .iter()
            .map(|term| format!(r"(?i)\b{}\b", regex::escape(term)))
            .collect();

        let term_set = if patterns.is_empty() {
            None
        } else {
            match RegexSet::new(&patterns) {
                Ok(set) => Some(set),
                Err(e) => {
                    // Escaped literals should always compile; a failure here
                    // disables term matching for this profile only
                    warn!("Failed to compile banned-term set: {}", e);
                    None
                }
            }
        };

        Self {
            terms: config.banned_terms.clone(),
            term_set,
            thresholds: config.tone_thresholds,
            allowed_characters: config.allowed_characters.clone(),
        }
    }

    /// Distinct banned terms matched in `text`, in term order
    pub fn matched_terms(&self, text: &str) -> Vec<&str> {
        let Some(ref set) = self.term_set else {
            return Vec::new();
        };
        set.matches(text)
            .into_iter()
            .filter_map(|idx| self.terms.get(idx).map(String::as_str))
            .collect()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_terms(terms: &[&str]) -> CompiledProfile {
        CompiledProfile::compile(&GuardrailConfig {
            banned_terms: terms.iter().map(|t| t.to_string()).collect(),
            tone_thresholds: ToneThresholds::default(),
            allowed_characters: BTreeSet::new(),
        })
    }

    #[test]
    fn test_compile_empty() {
        let profile = profile_with_terms(&[]);
        assert_eq!(profile.term_count(), 0);
        assert!(profile.matched_terms("anything at all").is_empty());
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let profile = profile_with_terms(&["goblin"]);
        assert_eq!(profile.matched_terms("A friendly GOBLIN appears."), vec!["goblin"]);
        assert_eq!(profile.matched_terms("a Goblin"), vec!["goblin"]);
    }

    #[test]
    fn test_match_respects_word_boundaries() {
        let profile = profile_with_terms(&["goblin"]);
        assert!(profile.matched_terms("the hobgoblins marched").is_empty());
        assert_eq!(profile.matched_terms("the goblin's hat"), vec!["goblin"]);
    }

    #[test]
    fn test_match_whole_phrases() {
        let profile = profile_with_terms(&["nightmare fuel"]);
        assert_eq!(
            profile.matched_terms("that is pure Nightmare Fuel right there"),
            vec!["nightmare fuel"]
        );
        assert!(profile.matched_terms("a nightmare about fuel").is_empty());
    }

    #[test]
    fn test_each_distinct_term_reported_once() {
        let profile = profile_with_terms(&["dragon", "goblin"]);
        let matched = profile.matched_terms("goblin goblin GOBLIN and a dragon");
        assert_eq!(matched, vec!["dragon", "goblin"]);
    }

    #[test]
    fn test_regex_metacharacters_in_terms_are_literal() {
        let profile = profile_with_terms(&["r.i.p"]);
        assert!(profile.matched_terms("ripe apples").is_empty());
        assert_eq!(profile.matched_terms("marked r.i.p here"), vec!["r.i.p"]);
    }
}
