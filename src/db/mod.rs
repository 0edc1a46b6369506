//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Per-user progress documents (keyed by uid)
    pub const PROGRESS: &str = "progress";
    /// Append-only chat log, flat collection with a `uid` field
    pub const MESSAGES: &str = "messages";
}
