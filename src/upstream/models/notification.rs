// src/upstream/models/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// In-app notification as delivered by the Unite API.
///
/// Field names vary between deployments, so the aliases below cover the
/// spellings observed on the wire. Anything missing falls back to a default
/// instead of failing the whole list.
#[derive(Serialize, Deserialize, Clone, Debug, Default, ToSchema)]
pub struct Notification {
    #[serde(alias = "_id", alias = "notificationId", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(alias = "message", default)]
    pub body: Option<String>,
    #[serde(rename = "type", default)]
    pub type_field: Option<String>, // Use type_field instead of r#type
    #[serde(alias = "isRead", alias = "seen", default)]
    pub read: bool,
    #[serde(alias = "actionType", default)]
    pub action_type: Option<String>,
    #[serde(alias = "actionData", default)]
    #[schema(value_type = Option<Object>)]
    pub action_data: Option<Value>,
    #[serde(alias = "createdAt", alias = "created_at", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Default, ToSchema)]
pub struct NotificationFilter {
    pub unread_only: Option<bool>,
    #[serde(rename = "type")]
    pub type_field: Option<String>, // Use type_field instead of r#type
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationCountResponse {
    pub total: i64,
    pub unread: i64,
}
