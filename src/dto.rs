//! Response envelopes for the mood journal API.
//!
//! Wrapper shapes for the JSON the handlers return. Row types live in
//! `models`; this module only adds the `{ message, <resource> }` and list
//! envelopes around them.
//!
//! Conventions:
//! - keys are camelCase on the wire
//! - mutations answer with a human-readable `message` next to the resource

use serde::Serialize;

use crate::models::entry::{Entry, Pagination};
use crate::models::mood::MoodSample;
use crate::models::user::UserProfile;

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Signup and login. The token is also set as the `token` cookie.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub user: UserProfile,
    pub access_token: String,
    pub expires_in: i64,
}

/// GET /api/auth/me
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

// ============================================================================
// Entries
// ============================================================================

/// GET /api/entries
#[derive(Debug, Serialize)]
pub struct EntryListResponse {
    pub entries: Vec<Entry>,
    pub pagination: Pagination,
}

/// GET/POST/PUT /api/entries[/:id]
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub entry: Entry,
}

// ============================================================================
// Moods
// ============================================================================

/// GET /api/mood
#[derive(Debug, Serialize)]
pub struct MoodListResponse {
    pub moods: Vec<MoodSample>,
}

/// POST /api/mood
#[derive(Debug, Serialize)]
pub struct MoodLoggedResponse {
    pub message: String,
    pub mood: MoodSample,
}
