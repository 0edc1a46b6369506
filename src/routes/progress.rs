// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lesson progress routes.

use crate::curriculum;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ModuleProgress, UserProgress};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Progress routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/progress", get(get_progress))
        .route(
            "/api/progress/modules/{module_id}/start",
            post(start_module),
        )
        .route(
            "/api/progress/modules/{module_id}/lessons/{lesson_id}/complete",
            post(complete_lesson),
        )
}

/// Progress document plus the derived overall percentage.
#[derive(Serialize)]
pub struct ProgressResponse {
    pub modules: HashMap<String, ModuleProgress>,
    pub last_active_at: String,
    pub overall_percent: u8,
}

impl From<UserProgress> for ProgressResponse {
    fn from(progress: UserProgress) -> Self {
        let overall_percent = progress.overall_percent(curriculum::module_count());
        Self {
            modules: progress.modules,
            last_active_at: progress.last_active_at,
            overall_percent,
        }
    }
}

/// Load the caller's progress (empty defaults for new users).
async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProgressResponse>> {
    let progress = state.db.get_progress(&user.uid).await?.unwrap_or_default();
    Ok(Json(progress.into()))
}

/// Start a module. Idempotent: re-starting never resets progress.
async fn start_module(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(module_id): Path<String>,
) -> Result<Json<ProgressResponse>> {
    if curriculum::find_module(&module_id).is_none() {
        return Err(AppError::BadRequest(format!(
            "Unknown module: {}",
            module_id
        )));
    }

    let now = now_rfc3339();
    let progress = state
        .db
        .update_progress_atomic(&user.uid, |p| Ok(p.start_module(&module_id, &now)))
        .await?;

    Ok(Json(progress.into()))
}

/// Record a completed lesson, auto-starting its module if needed.
///
/// The lesson count comes from the compiled-in curriculum, so a stale
/// client can never regress a module's completed state.
async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((module_id, lesson_id)): Path<(String, String)>,
) -> Result<Json<ProgressResponse>> {
    let total_lessons = curriculum::total_lessons(&module_id).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown module: {}", module_id))
    })?;
    if !curriculum::lesson_exists(&module_id, &lesson_id) {
        return Err(AppError::BadRequest(format!(
            "Unknown lesson: {}/{}",
            module_id, lesson_id
        )));
    }

    let now = now_rfc3339();
    let progress = state
        .db
        .update_progress_atomic(&user.uid, |p| {
            Ok(p.complete_lesson(&module_id, &lesson_id, total_lessons, &now))
        })
        .await?;

    tracing::debug!(
        uid = %user.uid,
        module = %module_id,
        lesson = %lesson_id,
        "Lesson completion recorded"
    );

    Ok(Json(progress.into()))
}
