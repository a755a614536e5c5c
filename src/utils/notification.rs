use serde_json::Value;

use crate::upstream::models::notification::{Notification, NotificationCountResponse};

/// Extract the notification objects from an upstream list response. The
/// notifications endpoint wraps its payload the same inconsistent ways the
/// request list does.
pub fn notification_items(body: &Value) -> Vec<Notification> {
    let raw_items: Vec<&Value> = if let Some(items) = body.as_array() {
        items.iter().collect()
    } else {
        ["data", "notifications", "items"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_array))
            .map(|items| items.iter().collect())
            .unwrap_or_default()
    };

    raw_items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

/// Badge counts for the notification bell.
pub fn count_notifications(items: &[Notification]) -> NotificationCountResponse {
    NotificationCountResponse {
        total: items.len() as i64,
        unread: items.iter().filter(|n| !n.read).count() as i64,
    }
}

/// Request id referenced by a notification's action payload, when it links
/// to a request at all. Lets the dashboard deep-link from the bell into the
/// request detail view.
pub fn linked_request_id(notification: &Notification) -> Option<String> {
    let data = notification.action_data.as_ref()?;
    for key in ["requestId", "request_id", "Request_ID", "_id"] {
        match data.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}
