// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod billing;
pub mod coach;
pub mod entitlement;

pub use billing::BillingService;
pub use coach::{ChatTurn, CoachReply, CoachService, TokenUsage};
pub use entitlement::{effective_premium, BetaGate};
