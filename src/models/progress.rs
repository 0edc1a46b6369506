//! Lesson progress tracking per user.
//!
//! Progress is a per-user document mapping module ids to completion state.
//! Mutations are applied in memory here and persisted atomically by the
//! database layer via Firestore transactions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Progress within a single curriculum module, created lazily on first entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub started: bool,
    pub started_at: Option<String>,
    /// Completed lesson ids, insertion-ordered, duplicate-free.
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    /// Derived: completed_lessons covers the whole module. One-way.
    #[serde(default)]
    pub completed: bool,
    /// Set when `completed` first becomes true, never cleared.
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl ModuleProgress {
    fn start(now: &str) -> Self {
        Self {
            started: true,
            started_at: Some(now.to_string()),
            completed_lessons: Vec::new(),
            completed: false,
            completed_at: None,
        }
    }
}

/// Per-user progress document, keyed by uid in the `progress` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    #[serde(default)]
    pub modules: HashMap<String, ModuleProgress>,
    #[serde(default)]
    pub last_active_at: String,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            modules: HashMap::new(),
            last_active_at: String::new(),
        }
    }
}

impl UserProgress {
    /// Start a module if it has no progress record yet.
    ///
    /// Returns `true` if a record was created, `false` if the module was
    /// already started (calling twice never resets progress).
    pub fn start_module(&mut self, module_id: &str, now: &str) -> bool {
        if self.modules.contains_key(module_id) {
            return false;
        }
        self.modules
            .insert(module_id.to_string(), ModuleProgress::start(now));
        self.last_active_at = now.to_string();
        true
    }

    /// Record a completed lesson, auto-starting the module if needed.
    ///
    /// Duplicate completions are ignored. The module's `completed` flag is
    /// recomputed against `total_lessons`, but never cleared once set: a
    /// caller passing an inconsistent smaller total later cannot regress a
    /// finished module.
    ///
    /// Returns `true` if anything changed.
    pub fn complete_lesson(
        &mut self,
        module_id: &str,
        lesson_id: &str,
        total_lessons: usize,
        now: &str,
    ) -> bool {
        let mut changed = self.start_module(module_id, now);

        let Some(module) = self.modules.get_mut(module_id) else {
            return changed;
        };

        if !module.completed_lessons.iter().any(|l| l == lesson_id) {
            module.completed_lessons.push(lesson_id.to_string());
            changed = true;
        }

        if !module.completed && module.completed_lessons.len() >= total_lessons {
            module.completed = true;
            module.completed_at = Some(now.to_string());
            changed = true;
        }

        if changed {
            self.last_active_at = now.to_string();
        }
        changed
    }

    /// Whether a lesson has been completed.
    pub fn is_lesson_completed(&self, module_id: &str, lesson_id: &str) -> bool {
        self.modules
            .get(module_id)
            .is_some_and(|m| m.completed_lessons.iter().any(|l| l == lesson_id))
    }

    /// Overall curriculum completion percentage, 0..=100.
    ///
    /// The divisor is the fixed curriculum module count, not the number of
    /// modules the user has started.
    pub fn overall_percent(&self, curriculum_module_count: usize) -> u8 {
        if curriculum_module_count == 0 {
            return 0;
        }
        let completed = self.modules.values().filter(|m| m.completed).count();
        let percent =
            (completed as f64 / curriculum_module_count as f64 * 100.0).round() as u8;
        percent.min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2025-06-01T10:00:00Z";
    const LATER: &str = "2025-06-02T10:00:00Z";

    #[test]
    fn test_start_module_is_idempotent() {
        let mut progress = UserProgress::default();

        assert!(progress.start_module("anatomy", NOW));
        progress.complete_lesson("anatomy", "intro", 3, NOW);

        // Starting again must not reset accumulated lessons
        assert!(!progress.start_module("anatomy", LATER));
        assert_eq!(progress.modules["anatomy"].completed_lessons, vec!["intro"]);
        assert_eq!(
            progress.modules["anatomy"].started_at.as_deref(),
            Some(NOW)
        );
    }

    #[test]
    fn test_complete_lesson_rejects_duplicates() {
        let mut progress = UserProgress::default();
        progress.start_module("anatomy", NOW);

        assert!(progress.complete_lesson("anatomy", "intro", 3, NOW));
        assert!(!progress.complete_lesson("anatomy", "intro", 3, LATER));

        let module = &progress.modules["anatomy"];
        assert_eq!(module.completed_lessons, vec!["intro"]);
        assert!(!module.completed);
    }

    #[test]
    fn test_complete_lesson_auto_starts_module() {
        let mut progress = UserProgress::default();

        assert!(progress.complete_lesson("mindset", "relaxation", 3, NOW));

        let module = &progress.modules["mindset"];
        assert!(module.started);
        assert_eq!(module.completed_lessons, vec!["relaxation"]);
    }

    #[test]
    fn test_module_completion_sets_completed_at_once() {
        let mut progress = UserProgress::default();

        progress.complete_lesson("anatomy", "intro", 3, NOW);
        progress.complete_lesson("anatomy", "anatomy-basics", 3, NOW);
        progress.complete_lesson("anatomy", "science", 3, NOW);

        let module = &progress.modules["anatomy"];
        assert!(module.completed);
        assert_eq!(module.completed_at.as_deref(), Some(NOW));

        // Re-completing with the same total changes nothing
        assert!(!progress.complete_lesson("anatomy", "science", 3, LATER));
        assert_eq!(
            progress.modules["anatomy"].completed_at.as_deref(),
            Some(NOW)
        );
    }

    #[test]
    fn test_completed_never_regresses_on_smaller_total() {
        let mut progress = UserProgress::default();

        progress.complete_lesson("anatomy", "intro", 2, NOW);
        progress.complete_lesson("anatomy", "science", 2, NOW);
        assert!(progress.modules["anatomy"].completed);

        // A later call with a larger total (or any total) must not clear it
        progress.complete_lesson("anatomy", "anatomy-basics", 5, LATER);
        let module = &progress.modules["anatomy"];
        assert!(module.completed);
        assert_eq!(module.completed_at.as_deref(), Some(NOW));
    }

    #[test]
    fn test_overall_percent_uses_fixed_divisor() {
        let mut progress = UserProgress::default();

        // One of four modules completed, three never started
        progress.complete_lesson("anatomy", "a", 1, NOW);
        assert_eq!(progress.overall_percent(4), 25);

        // Starting (not completing) another module changes nothing
        progress.start_module("mindset", NOW);
        assert_eq!(progress.overall_percent(4), 25);
    }

    #[test]
    fn test_overall_percent_bounds() {
        let progress = UserProgress::default();
        assert_eq!(progress.overall_percent(4), 0);
        assert_eq!(progress.overall_percent(0), 0);

        let mut done = UserProgress::default();
        for id in ["m1", "m2", "m3", "m4"] {
            done.complete_lesson(id, "only", 1, NOW);
        }
        assert_eq!(done.overall_percent(4), 100);
    }

    #[test]
    fn test_is_lesson_completed() {
        let mut progress = UserProgress::default();
        progress.complete_lesson("anatomy", "intro", 3, NOW);

        assert!(progress.is_lesson_completed("anatomy", "intro"));
        assert!(!progress.is_lesson_completed("anatomy", "science"));
        assert!(!progress.is_lesson_completed("mindset", "intro"));
    }

    #[test]
    fn test_last_active_updates_on_change_only() {
        let mut progress = UserProgress::default();
        progress.complete_lesson("anatomy", "intro", 3, NOW);
        assert_eq!(progress.last_active_at, NOW);

        // Duplicate completion is a no-op and leaves last_active_at alone
        progress.complete_lesson("anatomy", "intro", 3, LATER);
        assert_eq!(progress.last_active_at, NOW);
    }
}
