//! User-related models

use serde::{Deserialize, Serialize};

use super::ParticipantId;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: ParticipantId,
    pub email: String,
    pub display_name: String,
}

impl Identity {
    /// Display name falls back to the local part of the e-mail address.
    pub fn new(id: ParticipantId, email: &str, display_name: Option<&str>) -> Self {
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());

        Self {
            id,
            email: email.to_string(),
            display_name,
        }
    }
}
