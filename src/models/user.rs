//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore (one per account, keyed by uid).
///
/// The premium fields are mutated only by the Stripe webhook path;
/// profile routes never write them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Auth provider uid (also used as document ID)
    pub uid: String,
    /// Email address
    pub email: String,
    /// When the account was created (RFC3339)
    pub created_at: String,

    /// Age verification flag. Once true it is never reset by normal flow.
    #[serde(default)]
    pub is_age_verified: bool,
    #[serde(default)]
    pub age_verified_at: Option<String>,

    /// Paid entitlement. Webhook-path writes only.
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub premium_activated_at: Option<String>,
    #[serde(default)]
    pub premium_revoked_at: Option<String>,
    #[serde(default)]
    pub premium_revoke_reason: Option<String>,
    /// Stripe customer ID recorded at activation (refund lookups)
    #[serde(default)]
    pub stripe_customer_id: Option<String>,
    /// Stripe checkout session ID recorded at activation (idempotency)
    #[serde(default)]
    pub stripe_session_id: Option<String>,

    /// Set at most once, always with completed=true.
    #[serde(default)]
    pub onboarding: Option<OnboardingData>,

    // Reserved for the partner-pairing feature; no flow writes these yet.
    #[serde(default)]
    pub partner_id: Option<String>,
    #[serde(default)]
    pub partner_link_code: Option<String>,
}

impl UserProfile {
    /// A fresh profile as created at signup.
    pub fn new(uid: String, email: String, now: &str) -> Self {
        Self {
            uid,
            email,
            created_at: now.to_string(),
            is_age_verified: false,
            age_verified_at: None,
            is_premium: false,
            premium_activated_at: None,
            premium_revoked_at: None,
            premium_revoke_reason: None,
            stripe_customer_id: None,
            stripe_session_id: None,
            onboarding: None,
            partner_id: None,
            partner_link_code: None,
        }
    }
}

/// Onboarding questionnaire answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingData {
    pub completed: bool,
    pub user_type: UserType,
    pub goals: Vec<String>,
    pub concerns: Vec<String>,
    /// Must be true for the record to be persisted at all.
    pub consent_accepted: bool,
    pub completed_at: Option<String>,
}

/// Whether the user is going through the curriculum alone or as a couple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Solo,
    Couple,
}
