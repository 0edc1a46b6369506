// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and entitlement routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{OnboardingData, UserProfile, UserType};
use crate::services::{effective_premium, BetaGate};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const MAX_ANSWER_CHARS: usize = 200;

/// Profile routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", post(ensure_profile))
        .route("/api/me", get(get_me))
        .route("/api/profile/age-verification", post(verify_age))
        .route("/api/profile/onboarding", post(save_onboarding))
        .route("/api/entitlement", get(get_entitlement))
}

/// Public routes: the beta gate takes no identity at all.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/beta-access", post(redeem_beta_access))
}

// ─── Responses ───────────────────────────────────────────────

/// Profile as returned to the owning user. Billing bookkeeping fields
/// (customer/session ids, revoke details) stay server-side.
#[derive(Serialize)]
pub struct ProfileResponse {
    pub uid: String,
    pub email: String,
    pub created_at: String,
    pub is_age_verified: bool,
    pub age_verified_at: Option<String>,
    pub is_premium: bool,
    pub premium_activated_at: Option<String>,
    pub onboarding: Option<OnboardingData>,
    pub partner_id: Option<String>,
    pub partner_link_code: Option<String>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            uid: p.uid,
            email: p.email,
            created_at: p.created_at,
            is_age_verified: p.is_age_verified,
            age_verified_at: p.age_verified_at,
            is_premium: p.is_premium,
            premium_activated_at: p.premium_activated_at,
            onboarding: p.onboarding,
            partner_id: p.partner_id,
            partner_link_code: p.partner_link_code,
        }
    }
}

// ─── Profile Creation ────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CreateProfileRequest {
    #[validate(email)]
    email: String,
}

/// Get-or-create the caller's profile (called at signup / session start).
async fn ensure_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid profile request: {}", e)))?;

    if let Some(existing) = state.db.get_profile(&user.uid).await? {
        return Ok(Json(existing.into()));
    }

    let profile = UserProfile::new(user.uid.clone(), req.email, &now_rfc3339());
    state.db.create_profile(&profile).await?;
    tracing::info!(uid = %user.uid, "Profile created");

    Ok(Json(profile.into()))
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .db
        .get_profile(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.uid)))?;

    Ok(Json(profile.into()))
}

// ─── Age Verification ────────────────────────────────────────

/// Mark the caller as age-verified.
///
/// Monotonic: once verified, repeat calls are no-ops that leave the
/// original timestamp alone.
async fn verify_age(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let mut profile = state
        .db
        .get_profile(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.uid)))?;

    if !profile.is_age_verified {
        profile.is_age_verified = true;
        profile.age_verified_at = Some(now_rfc3339());
        state.db.update_age_verification(&profile).await?;
        tracing::info!(uid = %user.uid, "Age verified");
    }

    Ok(Json(profile.into()))
}

// ─── Onboarding ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct OnboardingRequest {
    user_type: UserType,
    #[validate(length(max = 10))]
    goals: Vec<String>,
    #[validate(length(max = 10))]
    concerns: Vec<String>,
    consent_accepted: bool,
}

/// Save the onboarding questionnaire. Set at most once.
async fn save_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<OnboardingRequest>,
) -> Result<Json<ProfileResponse>> {
    // Input checks happen before any store access
    if !req.consent_accepted {
        return Err(AppError::BadRequest(
            "Consent must be accepted to complete onboarding".to_string(),
        ));
    }
    req.validate().map_err(|e| {
        AppError::BadRequest(format!("Invalid onboarding request: {}", e))
    })?;
    for answer in req.goals.iter().chain(req.concerns.iter()) {
        if answer.trim().is_empty() || answer.chars().count() > MAX_ANSWER_CHARS {
            return Err(AppError::BadRequest(
                "Answers must be non-empty and at most 200 characters".to_string(),
            ));
        }
    }

    let mut profile = state
        .db
        .get_profile(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.uid)))?;

    if profile.onboarding.as_ref().is_some_and(|o| o.completed) {
        return Err(AppError::BadRequest(
            "Onboarding already completed".to_string(),
        ));
    }

    profile.onboarding = Some(OnboardingData {
        completed: true,
        user_type: req.user_type,
        goals: req.goals,
        concerns: req.concerns,
        consent_accepted: true,
        completed_at: Some(now_rfc3339()),
    });
    state.db.update_onboarding(&profile).await?;
    tracing::info!(uid = %user.uid, "Onboarding completed");

    Ok(Json(profile.into()))
}

// ─── Entitlement ─────────────────────────────────────────────

#[derive(Deserialize)]
struct EntitlementQuery {
    /// The client's sticky beta flag (client-side storage, not ours)
    #[serde(default)]
    beta: bool,
}

#[derive(Serialize)]
pub struct EntitlementResponse {
    pub is_premium: bool,
    pub effective_premium: bool,
}

/// Resolve effective premium access for the caller.
///
/// This is the explicit load/refresh accessor: clients re-hit it after
/// known external mutation points (returning from checkout).
async fn get_entitlement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<EntitlementQuery>,
) -> Result<Json<EntitlementResponse>> {
    let profile = state.db.get_profile(&user.uid).await?;

    Ok(Json(EntitlementResponse {
        is_premium: profile.as_ref().is_some_and(|p| p.is_premium),
        effective_premium: effective_premium(profile.as_ref(), query.beta),
    }))
}

// ─── Beta Access ─────────────────────────────────────────────

#[derive(Deserialize)]
struct BetaAccessRequest {
    code: String,
}

#[derive(Serialize)]
pub struct BetaAccessResponse {
    pub granted: bool,
}

/// Redeem a beta access code.
///
/// The resulting flag lives in client-side storage and is sticky there.
/// This is a soft gate over already-static content, never proof of
/// payment.
async fn redeem_beta_access(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BetaAccessRequest>,
) -> Json<BetaAccessResponse> {
    let gate = BetaGate::new(&state.config.beta_access_code);
    let granted = gate.redeem(req.code.trim());

    if granted {
        tracing::info!("Beta access code redeemed");
    }

    Json(BetaAccessResponse { granted })
}
