//! Guardrail rule configuration
//!
//! Handles loading, caching, and hot-reloading the layered rule file
//! (a `defaults` block plus named per-profile overrides). Reload is checked
//! at the point of use by comparing the file's mtime, so rule edits take
//! effect without a restart and without a background watcher.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use sn_types::{AppError, AppResult};

pub mod types;

pub use types::*;

/// Snapshot of loader state for diagnostics endpoints
#[derive(Debug, Clone, Serialize)]
pub struct LoaderStatus {
    pub path: String,
    /// Bumped on every successful reload; compiled-rule caches key off it
    pub generation: u64,
    pub profiles: Vec<String>,
    pub default_term_count: usize,
    /// RFC 3339 timestamp of the last successful load
    pub last_loaded: String,
}

#[derive(Debug)]
struct LoaderState {
    rules: Arc<RuleFile>,
    loaded_mtime: SystemTime,
    /// mtime of a rewrite that failed to parse; skip re-parsing until the
    /// file changes again
    failed_mtime: Option<SystemTime>,
    generation: u64,
    last_loaded: DateTime<Utc>,
}

/// Loads, caches, and hot-reloads the rule file.
///
/// The parsed structure is owned here behind a lock and replaced wholesale
/// on reload, so concurrent readers see either the old rules or the new
/// ones, never a mix. Construction fails hard if the file is missing or
/// malformed; after that, a broken rewrite is logged and the prior valid
/// rules stay in effect.
#[derive(Debug)]
pub struct RuleLoader {
    path: PathBuf,
    state: RwLock<LoaderState>,
}

impl RuleLoader {
    /// Read and parse the rule file at `path`
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let (rules, mtime) = read_rule_file(&path)?;
        info!(
            "Loaded guardrail rules from {}: {} default terms, {} profiles",
            path.display(),
            rules.defaults.banned_terms.len(),
            rules.profiles.len()
        );
        Ok(Self {
            path,
            state: RwLock::new(LoaderState {
                rules: Arc::new(rules),
                loaded_mtime: mtime,
                failed_mtime: None,
                generation: 1,
                last_loaded: Utc::now(),
            }),
        })
    }

    /// Current parsed rules, reloading first if the file changed on disk.
    ///
    /// Returns the reload generation alongside so callers can key caches
    /// off it.
    pub fn current(&self) -> (u64, Arc<RuleFile>) {
        self.maybe_reload();
        let state = self.state.read();
        (state.generation, state.rules.clone())
    }

    /// Resolve the rules for a profile against the current file state
    pub fn resolve(&self, profile: Option<&str>) -> GuardrailConfig {
        let (_, rules) = self.current();
        rules.resolve(profile)
    }

    /// Diagnostics snapshot of the loader
    pub fn status(&self) -> LoaderStatus {
        self.maybe_reload();
        let state = self.state.read();
        LoaderStatus {
            path: self.path.display().to_string(),
            generation: state.generation,
            profiles: state.rules.profile_names(),
            default_term_count: state.rules.defaults.banned_terms.len(),
            last_loaded: state.last_loaded.to_rfc3339(),
        }
    }

    /// Path of the rule file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn maybe_reload(&self) {
        let disk_mtime = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                // Keep serving the cached rules; the file may be mid-rewrite
                debug!("Could not stat rule file {}: {}", self.path.display(), e);
                return;
            }
        };

        {
            let state = self.state.read();
            if !state.wants_reload(disk_mtime) {
                return;
            }
        }

        let mut state = self.state.write();
        // Re-check under the write lock; another caller may have won the race
        if !state.wants_reload(disk_mtime) {
            return;
        }

        match read_rule_file(&self.path) {
            Ok((rules, mtime)) => {
                state.rules = Arc::new(rules);
                state.loaded_mtime = mtime;
                state.failed_mtime = None;
                state.generation += 1;
                state.last_loaded = Utc::now();
                info!(
                    "Reloaded guardrail rules from {} (generation {})",
                    self.path.display(),
                    state.generation
                );
            }
            Err(e) => {
                state.failed_mtime = Some(disk_mtime);
                warn!(
                    "Failed to reload guardrail rules from {}, keeping previous rules: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

impl LoaderState {
    fn wants_reload(&self, disk_mtime: SystemTime) -> bool {
        disk_mtime > self.loaded_mtime && self.failed_mtime != Some(disk_mtime)
    }
}

fn read_rule_file(path: &Path) -> AppResult<(RuleFile, SystemTime)> {
    let mtime = fs::metadata(path)?.modified()?;
    let data = fs::read_to_string(path)?;
    let rules: RuleFile = serde_yaml::from_str(&data)
        .map_err(|e| AppError::Config(format!("Invalid rule file {}: {}", path.display(), e)))?;
    Ok((rules, mtime))
}
