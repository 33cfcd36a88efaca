//! Product listing models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContextId, ParticipantId};

/// Environmental facts a seller attaches to a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sustainability {
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_footprint_kg: Option<f64>,
    #[serde(default)]
    pub recyclable: bool,
    #[serde(default)]
    pub certifications: Vec<String>,
}

/// A marketplace listing. Its id doubles as the chat context id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ContextId,
    pub name: String,
    pub description: String,
    /// Price as entered by the seller; formatting is left to the caller.
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub owner_id: ParticipantId,
    pub owner_email: String,
    #[serde(default)]
    pub sustainability: Sustainability,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
