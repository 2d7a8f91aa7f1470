//! Hot-swappable compiled rule sets shared by the sanitizer and the guard

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use sn_config::{RuleFile, RuleLoader};

use crate::compiled_rules::CompiledProfile;

/// Compiled rules for the default block and every named profile, tagged
/// with the loader generation they were built from.
#[derive(Debug)]
pub struct CompiledRules {
    generation: u64,
    default: Arc<CompiledProfile>,
    profiles: HashMap<String, Arc<CompiledProfile>>,
}

impl CompiledRules {
    /// Compiled rules for `name`, falling back to the defaults when the
    /// name is absent or unknown
    pub fn profile(&self, name: Option<&str>) -> &Arc<CompiledProfile> {
        name.and_then(|n| self.profiles.get(n)).unwrap_or(&self.default)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owns the rule loader and the compiled rule sets.
///
/// On each access the loader re-checks the rule file's mtime; when it
/// reports a new generation, every profile is recompiled and the compiled
/// set is swapped wholesale, so the sanitizer and the guard share one
/// compilation per file change. Clones share state.
pub struct RuleManager {
    loader: Arc<RuleLoader>,
    compiled: Arc<RwLock<Arc<CompiledRules>>>,
}

impl RuleManager {
    pub fn new(loader: Arc<RuleLoader>) -> Self {
        let (generation, rules) = loader.current();
        let compiled = Arc::new(compile_all(generation, &rules));
        Self {
            loader,
            compiled: Arc::new(RwLock::new(compiled)),
        }
    }

    /// The underlying loader, for status/diagnostics access
    pub fn loader(&self) -> &Arc<RuleLoader> {
        &self.loader
    }

    /// Compiled rules matching the current state of the rule file
    pub fn snapshot(&self) -> Arc<CompiledRules> {
        let (generation, rules) = self.loader.current();

        {
            let current = self.compiled.read();
            if current.generation() == generation {
                return current.clone();
            }
        }

        let rebuilt = Arc::new(compile_all(generation, &rules));
        let mut slot = self.compiled.write();
        // Another caller may have recompiled while we were building; only
        // swap if ours is newer
        if rebuilt.generation() > slot.generation() {
            debug!(
                "Recompiled guardrail rules at generation {} ({} profiles)",
                generation,
                rules.profiles.len()
            );
            *slot = rebuilt;
        }
        slot.clone()
    }
}

impl Clone for RuleManager {
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
            compiled: self.compiled.clone(),
        }
    }
}

fn compile_all(generation: u64, rules: &RuleFile) -> CompiledRules {
    let default = Arc::new(CompiledProfile::compile(&rules.resolve(None)));
    let profiles = rules
        .profiles
        .keys()
        .map(|name| {
            let compiled = CompiledProfile::compile(&rules.resolve(Some(name)));
            (name.clone(), Arc::new(compiled))
        })
        .collect();

    CompiledRules {
        generation,
        default,
        profiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};

    fn manager_with(content: &str) -> (tempfile::TempDir, RuleManager) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guardrails.yaml");
        fs::write(&path, content).unwrap();
        let loader = Arc::new(RuleLoader::load(path).unwrap());
        (dir, RuleManager::new(loader))
    }

    #[test]
    fn test_snapshot_reuses_compiled_rules_for_same_generation() {
        let (_dir, manager) = manager_with("defaults:\n  banned_terms: [goblin]\n");
        let first = manager.snapshot();
        let second = manager.snapshot();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_snapshot_recompiles_after_file_change() {
        let (dir, manager) = manager_with("defaults:\n  banned_terms: [goblin]\n");
        let first = manager.snapshot();
        assert_eq!(first.profile(None).matched_terms("a dragon"), Vec::<&str>::new());

        let path = dir.path().join("guardrails.yaml");
        fs::write(&path, "defaults:\n  banned_terms: [dragon]\n").unwrap();
        let file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(2))
            .unwrap();

        let second = manager.snapshot();
        assert_eq!(second.generation(), first.generation() + 1);
        assert_eq!(second.profile(None).matched_terms("a dragon"), vec!["dragon"]);
    }

    #[test]
    fn test_unknown_profile_falls_back_to_default() {
        let (_dir, manager) = manager_with(
            "defaults:\n  banned_terms: [goblin]\nprofiles:\n  anxious:\n    banned_terms: [storm]\n",
        );
        let compiled = manager.snapshot();
        assert_eq!(compiled.profile(Some("anxious")).term_count(), 2);
        assert_eq!(compiled.profile(Some("unknown")).term_count(), 1);
        assert_eq!(compiled.profile(None).term_count(), 1);
    }

    #[test]
    fn test_clones_share_compiled_state() {
        let (_dir, manager) = manager_with("defaults:\n  banned_terms: [goblin]\n");
        let clone = manager.clone();
        assert!(Arc::ptr_eq(&manager.snapshot(), &clone.snapshot()));
    }
}
