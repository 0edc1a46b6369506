// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage, targeted field updates)
//! - Progress (per-user lesson completion, transactional updates)
//! - Messages (append-only chat log)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ChatMessage, UserProfile, UserProgress};
use firestore::paths;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a user profile by uid.
    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a profile document. The only whole-document profile write;
    /// every later mutation is a targeted field update.
    pub async fn create_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Persist the age-verification fields and nothing else.
    pub async fn update_age_verification(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(UserProfile::{is_age_verified, age_verified_at}))
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Persist the onboarding record and nothing else.
    pub async fn update_onboarding(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(UserProfile::{onboarding}))
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Persist the premium entitlement fields and nothing else.
    ///
    /// Only the webhook handler calls this; profile routes have no path
    /// that touches these fields.
    pub async fn update_premium_fields(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(UserProfile::{
                is_premium,
                premium_activated_at,
                premium_revoked_at,
                premium_revoke_reason,
                stripe_customer_id,
                stripe_session_id
            }))
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find profiles by Stripe customer ID (refund resolution).
    ///
    /// Limit 2: the handler only needs to distinguish "exactly one" from
    /// "zero or ambiguous".
    pub async fn find_profiles_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<UserProfile>, AppError> {
        let customer = customer_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("stripe_customer_id").eq(customer.clone())]))
            .limit(2)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Progress Operations ─────────────────────────────────────

    /// Get a user's progress document.
    pub async fn get_progress(&self, uid: &str) -> Result<Option<UserProgress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRESS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically mutate a user's progress document.
    ///
    /// Reads the current document (default-empty if missing), applies the
    /// mutation, and writes it back inside a Firestore transaction so a
    /// concurrent update from a second device retries instead of silently
    /// losing lessons to a blind overwrite.
    ///
    /// The mutation returns `true` if it changed anything; an unchanged
    /// document rolls the transaction back without writing.
    pub async fn update_progress_atomic<F>(
        &self,
        uid: &str,
        mutate: F,
    ) -> Result<UserProgress, AppError>
    where
        F: FnOnce(&mut UserProgress) -> Result<bool, AppError>,
    {
        // Begin a transaction
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Read current progress within the transaction scope
        let current: Option<UserProgress> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRESS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read progress in transaction: {}", e))
            })?;

        let mut progress = current.unwrap_or_default();

        let changed = mutate(&mut progress)?;
        if !changed {
            // Nothing to persist; don't hold the transaction open
            let _ = transaction.rollback().await;
            return Ok(progress);
        }

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::PROGRESS)
            .document_id(uid)
            .object(&progress)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add progress to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(progress)
    }

    // ─── Message Log Operations ──────────────────────────────────

    /// Append a message to a user's conversation log.
    pub async fn append_message(&self, message: &ChatMessage) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::MESSAGES)
            .document_id(&message.id)
            .object(message)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List a user's messages, oldest first.
    pub async fn list_messages(&self, uid: &str) -> Result<Vec<ChatMessage>, AppError> {
        let owner = uid.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MESSAGES)
            .filter(move |q| q.for_all([q.field("uid").eq(owner.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
