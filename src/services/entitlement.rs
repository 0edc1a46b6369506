// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Premium entitlement resolution and the beta-access soft gate.
//!
//! Effective premium is a pure function of profile state and the client's
//! sticky beta flag. The beta gate is a shared access code, NOT a security
//! boundary: it must never be treated as proof of payment and must never
//! be the sole gate for resources with real cost. Here it only unlocks
//! already-static content.

use crate::models::UserProfile;
use subtle::ConstantTimeEq;

/// Resolve effective premium access.
///
/// True exactly when the stored profile says premium OR the caller holds
/// the beta flag. Never true for any other reason.
pub fn effective_premium(profile: Option<&UserProfile>, beta_access: bool) -> bool {
    beta_access || profile.is_some_and(|p| p.is_premium)
}

/// Validates candidate beta access codes against the configured secret.
///
/// The resulting flag is stored client-side and is sticky there; the
/// server only answers "does this code match". No rate limiting and no
/// per-user uniqueness, matching the soft-gate contract.
pub struct BetaGate {
    access_code: String,
}

impl BetaGate {
    pub fn new(access_code: &str) -> Self {
        Self {
            access_code: access_code.to_string(),
        }
    }

    /// Check a candidate code. Constant-time over equal-length inputs.
    pub fn redeem(&self, candidate: &str) -> bool {
        if self.access_code.is_empty() {
            // Unset code means the gate is closed, not open.
            return false;
        }
        if candidate.len() != self.access_code.len() {
            return false;
        }
        self.access_code
            .as_bytes()
            .ct_eq(candidate.as_bytes())
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;

    fn profile(is_premium: bool) -> UserProfile {
        let mut p = UserProfile::new(
            "user-1".to_string(),
            "user@example.com".to_string(),
            "2025-01-01T00:00:00Z",
        );
        p.is_premium = is_premium;
        p
    }

    #[test]
    fn test_effective_premium_truth_table() {
        let free = profile(false);
        let paid = profile(true);

        assert!(!effective_premium(Some(&free), false));
        assert!(effective_premium(Some(&free), true));
        assert!(effective_premium(Some(&paid), false));
        assert!(effective_premium(Some(&paid), true));
    }

    #[test]
    fn test_effective_premium_without_profile() {
        // New sessions without a loaded profile fall through to the flag
        assert!(!effective_premium(None, false));
        assert!(effective_premium(None, true));
    }

    #[test]
    fn test_beta_gate_redeem() {
        let gate = BetaGate::new("bloom-beta-2025");

        assert!(gate.redeem("bloom-beta-2025"));
        assert!(!gate.redeem("bloom-beta-2024"));
        assert!(!gate.redeem(""));
        assert!(!gate.redeem("bloom-beta-2025-extra"));
    }

    #[test]
    fn test_beta_gate_empty_code_grants_nothing() {
        let gate = BetaGate::new("");
        assert!(!gate.redeem(""));
        assert!(!gate.redeem("anything"));
    }
}
