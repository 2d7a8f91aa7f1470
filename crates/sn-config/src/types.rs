//! Rule file schema and resolution

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub(crate) const DEFAULT_MAX_EXCLAMATION_POINTS: u32 = 10;
pub(crate) const DEFAULT_MAX_ALL_CAPS_CHUNKS: u32 = 10;

/// Tone heuristic thresholds.
///
/// Always fully populated: partial profile overrides are applied through
/// [`ToneThresholdOverride::apply`], never by replacing this struct wholesale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToneThresholds {
    /// Maximum number of `!` characters tolerated in a story
    #[serde(default = "default_max_exclamation_points")]
    pub max_exclamation_points: u32,

    /// Maximum number of all-caps words tolerated in a story
    #[serde(default = "default_max_all_caps_chunks")]
    pub max_all_caps_chunks: u32,
}

fn default_max_exclamation_points() -> u32 {
    DEFAULT_MAX_EXCLAMATION_POINTS
}

fn default_max_all_caps_chunks() -> u32 {
    DEFAULT_MAX_ALL_CAPS_CHUNKS
}

impl Default for ToneThresholds {
    fn default() -> Self {
        Self {
            max_exclamation_points: default_max_exclamation_points(),
            max_all_caps_chunks: default_max_all_caps_chunks(),
        }
    }
}

/// Partial tone override from a profile block.
///
/// Each `Some` field replaces the corresponding default; `None` fields
/// inherit it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ToneThresholdOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_exclamation_points: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_all_caps_chunks: Option<u32>,
}

impl ToneThresholdOverride {
    /// Overlay the fields present in this override onto `base`, field by field
    pub fn apply(&self, base: ToneThresholds) -> ToneThresholds {
        ToneThresholds {
            max_exclamation_points: self
                .max_exclamation_points
                .unwrap_or(base.max_exclamation_points),
            max_all_caps_chunks: self.max_all_caps_chunks.unwrap_or(base.max_all_caps_chunks),
        }
    }
}

/// The `defaults` block of the rule file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RuleDefaults {
    /// Terms banned in prompts and stories, matched as whole words/phrases
    #[serde(default)]
    pub banned_terms: Vec<String>,

    #[serde(default)]
    pub tone_thresholds: ToneThresholds,

    /// Non-ASCII characters acceptable in visual prompts
    #[serde(default)]
    pub allowed_characters: Vec<String>,

    /// Emoji acceptable in visual prompts
    #[serde(default)]
    pub allowed_emoji: Vec<String>,
}

/// A named profile's partial override block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfileOverride {
    /// Extra banned terms, unioned with the defaults (never replacing them)
    #[serde(default)]
    pub banned_terms: Vec<String>,

    #[serde(default)]
    pub tone_thresholds: ToneThresholdOverride,
}

/// Parsed on-disk rule file: a `defaults` block plus named profile overrides.
///
/// Every key is optional; an empty file parses to empty term lists and
/// built-in thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RuleFile {
    #[serde(default)]
    pub defaults: RuleDefaults,

    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileOverride>,
}

/// Fully-resolved rule set for one profile
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailConfig {
    /// Lowercased and deduplicated, matched as whole words/phrases
    pub banned_terms: Vec<String>,

    pub tone_thresholds: ToneThresholds,

    /// Union of `allowed_characters` and `allowed_emoji`, flattened to chars
    pub allowed_characters: BTreeSet<char>,
}

impl RuleFile {
    /// Resolve the rules for `profile`: start from `defaults`, union the
    /// profile's extra banned terms, and overlay each threshold field that
    /// the profile sets. Unknown profile names fall back to defaults alone.
    pub fn resolve(&self, profile: Option<&str>) -> GuardrailConfig {
        let block = profile.and_then(|name| self.profiles.get(name));

        let mut terms: BTreeSet<String> = normalized_terms(&self.defaults.banned_terms);
        if let Some(block) = block {
            terms.extend(normalized_terms(&block.banned_terms));
        }

        let tone_thresholds = block
            .map(|b| b.tone_thresholds.apply(self.defaults.tone_thresholds))
            .unwrap_or(self.defaults.tone_thresholds);

        let allowed_characters = self
            .defaults
            .allowed_characters
            .iter()
            .chain(self.defaults.allowed_emoji.iter())
            .flat_map(|entry| entry.chars())
            .collect();

        GuardrailConfig {
            banned_terms: terms.into_iter().collect(),
            tone_thresholds,
            allowed_characters,
        }
    }

    /// Names of the profiles defined in the file, sorted
    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

fn normalized_terms(terms: &[String]) -> BTreeSet<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
