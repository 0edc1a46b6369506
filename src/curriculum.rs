// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static curriculum metadata.
//!
//! The lesson content itself lives in the frontend; the API only needs the
//! module/lesson identifiers to validate progress updates and to know how
//! many lessons each module has. Compiled in rather than stored, since the
//! curriculum changes only with a deploy.

/// A curriculum module and its lesson identifiers, in display order.
#[derive(Debug, Clone, Copy)]
pub struct ModuleSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub free: bool,
    pub lessons: &'static [&'static str],
}

/// The MVP curriculum: 4 modules, 3 lessons each.
pub static CURRICULUM: &[ModuleSpec] = &[
    ModuleSpec {
        id: "anatomy",
        title: "Anatomy & Science",
        free: true,
        lessons: &["intro", "anatomy-basics", "science"],
    },
    ModuleSpec {
        id: "mindset",
        title: "Mindset & Arousal",
        free: true,
        lessons: &["relaxation", "arousal", "breathwork"],
    },
    ModuleSpec {
        id: "communication",
        title: "Communication",
        free: true,
        lessons: &["opening-up", "boundaries", "feedback"],
    },
    ModuleSpec {
        id: "preparation",
        title: "Preparation & Safety",
        free: true,
        lessons: &["physical-prep", "pelvic-floor", "hygiene"],
    },
];

/// Fixed divisor for overall progress: the full curriculum size,
/// not the number of modules a user happens to have started.
pub fn module_count() -> usize {
    CURRICULUM.len()
}

/// Look up a module by its identifier.
pub fn find_module(module_id: &str) -> Option<&'static ModuleSpec> {
    CURRICULUM.iter().find(|m| m.id == module_id)
}

/// Number of lessons in a module, if the module exists.
///
/// This is the server-side source of truth for completion checks, so a
/// client sending a stale (smaller) lesson count can never regress a
/// module's completed state.
pub fn total_lessons(module_id: &str) -> Option<usize> {
    find_module(module_id).map(|m| m.lessons.len())
}

/// Whether `lesson_id` is a known lesson of `module_id`.
pub fn lesson_exists(module_id: &str, lesson_id: &str) -> bool {
    find_module(module_id).is_some_and(|m| m.lessons.contains(&lesson_id))
}
