//! Content guardrails for generated bedtime stories
//!
//! Inspects prompts before they reach a generation model and story text
//! after generation, against a rule file that hot-reloads on edit.
//!
//! # Architecture
//!
//! - **RuleManager**: owns the rule loader and compiled rule sets, recompiles
//!   when the file changes on disk
//! - **PromptSanitizer**: pre-generation gate; `enforce()` rejects a prompt
//!   with every violation found, before any generation cost is incurred
//! - **ContentGuard**: post-generation gate; `check_story()` reports
//!   violations as data and the caller decides what to do with them
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sn_config::RuleLoader;
//! use sn_guardrails::{ContentGuard, PromptKind, PromptSanitizer, RuleManager};
//!
//! # fn main() -> sn_types::AppResult<()> {
//! let loader = Arc::new(RuleLoader::load("guardrails.yaml")?);
//! let rules = RuleManager::new(loader);
//!
//! let sanitizer = PromptSanitizer::new(rules.clone());
//! let guard = ContentGuard::new(rules);
//!
//! if let Err(rejected) = sanitizer.enforce("A cozy cottage at dusk", PromptKind::Visual) {
//!     eprintln!("prompt rejected: {:?}", rejected.violations);
//! }
//!
//! let violations = guard.check_story("Once upon a time, a meadow slept.", None);
//! if !violations.is_empty() {
//!     // Reject with a 422, log, or regenerate
//! }
//! # Ok(())
//! # }
//! ```

pub mod compiled_rules;
pub mod content_guard;
pub mod rule_manager;
pub mod sanitizer;
pub mod types;

pub use content_guard::ContentGuard;
pub use rule_manager::RuleManager;
pub use sanitizer::PromptSanitizer;
pub use types::*;
