//! Post-generation story inspection

use std::time::Instant;

use tracing::debug;

use sn_types::UserProfile;

use crate::rule_manager::RuleManager;
use crate::types::{Violation, ViolationCategory};

/// Whitespace-delimited tokens with fewer alphabetic characters than this
/// are treated as acronyms and never counted as shouting.
const SHOUT_MIN_LETTERS: usize = 3;

/// Advisory gate applied to generated story text.
///
/// Scans for banned terms and scores tone heuristics against the thresholds
/// resolved for the listener's profile. Content issues are reported as data,
/// never as errors; the caller decides whether to reject, log, or
/// regenerate.
pub struct ContentGuard {
    rules: RuleManager,
}

impl ContentGuard {
    pub fn new(rules: RuleManager) -> Self {
        Self { rules }
    }

    /// Scan `text` and return the violations found; an empty list means the
    /// story passes. Passing a profile tightens thresholds to that profile's
    /// override block, field by field.
    pub fn check_story(&self, text: &str, profile: Option<&UserProfile>) -> Vec<Violation> {
        let start = Instant::now();
        let compiled = self.rules.snapshot();
        let rules = compiled.profile(profile.map(|p| p.profile.as_str()));

        let mut violations: Vec<Violation> = rules
            .matched_terms(text)
            .into_iter()
            .map(|term| {
                Violation::new(ViolationCategory::Safety, format!("banned term \"{}\"", term))
            })
            .collect();

        let thresholds = rules.thresholds;

        let exclamations = text.matches('!').count();
        if exclamations > thresholds.max_exclamation_points as usize {
            violations.push(Violation::new(
                ViolationCategory::Tone,
                format!(
                    "{} exclamation points exceed limit of {}",
                    exclamations, thresholds.max_exclamation_points
                ),
            ));
        }

        let shouts = shout_chunks(text);
        if shouts > thresholds.max_all_caps_chunks as usize {
            violations.push(Violation::new(
                ViolationCategory::Tone,
                format!(
                    "{} all-caps words exceed limit of {}",
                    shouts, thresholds.max_all_caps_chunks
                ),
            ));
        }

        debug!(
            "Story check: {} chars, {} terms, {} violations, {}ms",
            text.len(),
            rules.term_count(),
            violations.len(),
            start.elapsed().as_millis()
        );

        violations
    }
}

/// Count whitespace-delimited tokens written entirely in capitals
fn shout_chunks(text: &str) -> usize {
    text.split_whitespace().filter(|t| is_shout(t)).count()
}

fn is_shout(token: &str) -> bool {
    let mut letters = 0;
    for c in token.chars().filter(|c| c.is_alphabetic()) {
        if !c.is_uppercase() {
            return false;
        }
        letters += 1;
    }
    letters >= SHOUT_MIN_LETTERS
}
