// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Bloom Academy: backend API for a subscription-gated education platform.
//!
//! This crate provides profile and entitlement management, lesson progress
//! tracking, the AI coach relay, and payment webhook handling.

pub mod config;
pub mod curriculum;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{BillingService, CoachService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub coach: CoachService,
    pub billing: BillingService,
}
