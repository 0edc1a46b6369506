// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod chat;
pub mod progress;
pub mod user;

pub use chat::{ChatMessage, MessageRole};
pub use progress::{ModuleProgress, UserProgress};
pub use user::{OnboardingData, UserProfile, UserType};
