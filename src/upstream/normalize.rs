// src/upstream/normalize.rs
//
// The Unite backend serves the same entities in several shapes: ids under
// four different names, actor references flat or nested, timestamps as ISO
// strings, epoch numbers, or `{"$date": ...}` wrappers. Every probe lives
// here so downstream code only ever sees the canonical types.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;

use super::models::event::{EventCategory, EventSummary};
use super::models::request::{EventRequest, ExplicitGrants, RequestStatus};

/// Errors that can occur while normalizing raw backend payloads
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("request payload carries no id under any known field name")]
    MissingId,
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

const ID_KEYS: &[&str] = &["Request_ID", "RequestId", "_id", "requestId"];
const STATUS_KEYS: &[&str] = &["Status", "status"];
const ADMIN_ACTION_KEYS: &[&str] = &["AdminAction", "adminAction"];
const STAKEHOLDER_ACTION_KEYS: &[&str] = &["StakeholderFinalAction", "stakeholderFinalAction"];
const COORDINATOR_ACTION_KEYS: &[&str] = &["CoordinatorFinalAction", "coordinatorFinalAction"];
const COORDINATOR_ID_KEYS: &[&str] = &["coordinator_id", "Coordinator_ID", "coordinatorId"];
const STAKEHOLDER_ID_KEYS: &[&str] = &["stakeholder_id", "Stakeholder_ID", "stakeholderId"];

const TITLE_KEYS: &[&str] = &["title", "Title", "eventName", "Event_Name", "name"];
const LOCATION_KEYS: &[&str] = &["location", "Location", "venue", "address"];
const START_KEYS: &[&str] = &["startDate", "StartDate", "startTime", "start", "eventDate", "date", "Date"];
const END_KEYS: &[&str] = &["endDate", "EndDate", "endTime", "end"];
const CATEGORY_KEYS: &[&str] = &["category", "Category", "eventCategory", "eventType", "type"];
const TARGET_DONATION_KEYS: &[&str] = &["targetDonations", "TargetDonations", "targetDonationCount", "donationTarget"];
const MAX_PARTICIPANT_KEYS: &[&str] = &["maxParticipants", "MaxParticipants", "participantLimit"];
const AUDIENCE_KEYS: &[&str] = &["expectedAudience", "ExpectedAudience", "audienceSize", "expectedAttendees"];

/// Normalize one raw request object into the canonical [`EventRequest`].
pub fn normalize_request(raw: &Value) -> Result<EventRequest, NormalizeError> {
    if !raw.is_object() {
        return Err(NormalizeError::NotAnObject("event request"));
    }

    let id = probe_id(raw, ID_KEYS).ok_or(NormalizeError::MissingId)?;
    let raw_status = probe_string(raw, STATUS_KEYS);
    let status = raw_status
        .as_deref()
        .map(RequestStatus::parse)
        .unwrap_or_else(|| RequestStatus::Unknown(String::new()));

    let event_value = raw.get("event").or_else(|| raw.get("Event"));

    Ok(EventRequest {
        id,
        status,
        raw_status,
        admin_action: probe_string(raw, ADMIN_ACTION_KEYS),
        stakeholder_final_action: probe_string(raw, STAKEHOLDER_ACTION_KEYS),
        coordinator_final_action: probe_string(raw, COORDINATOR_ACTION_KEYS),
        coordinator_id: probe_actor_id(raw, COORDINATOR_ID_KEYS, "coordinator"),
        stakeholder_id: probe_actor_id(raw, STAKEHOLDER_ID_KEYS, "stakeholder"),
        is_edit: raw
            .get("originalData")
            .and_then(Value::as_object)
            .map(|obj| !obj.is_empty())
            .unwrap_or(false),
        grants: probe_grants(raw, event_value),
        event: event_value.map(normalize_event).unwrap_or_else(|| normalize_event(raw)),
    })
}

/// Normalize a raw event object (embedded in a request, or standalone from
/// the public calendar feed).
pub fn normalize_event(raw: &Value) -> EventSummary {
    EventSummary {
        title: probe_string(raw, TITLE_KEYS),
        location: probe_string(raw, LOCATION_KEYS),
        starts_at: probe_datetime(raw, START_KEYS),
        ends_at: probe_datetime(raw, END_KEYS),
        category: probe_string(raw, CATEGORY_KEYS).map(|c| EventCategory::parse(&c)),
        status: probe_string(raw, STATUS_KEYS),
        target_donations: probe_integer(raw, TARGET_DONATION_KEYS),
        max_participants: probe_integer(raw, MAX_PARTICIPANT_KEYS),
        expected_audience: probe_integer(raw, AUDIENCE_KEYS),
    }
}

/// Extract the list of request objects from a list response. The backend has
/// shipped `{data: [...]}`, `{requests: [...]}`, `{items: [...]}` and a bare
/// array at different times.
pub fn request_items(body: &Value) -> Vec<&Value> {
    if let Some(items) = body.as_array() {
        return items.iter().collect();
    }
    for key in ["data", "requests", "items", "results"] {
        if let Some(items) = body.get(key).and_then(Value::as_array) {
            return items.iter().collect();
        }
    }
    Vec::new()
}

fn probe_id(raw: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match raw.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            // Mongo-style `{"$oid": "..."}` wrapper
            Some(Value::Object(obj)) => {
                if let Some(Value::String(s)) = obj.get("$oid") {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
    }
    None
}

fn probe_string(raw: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(Value::String(s)) = raw.get(*key) {
            if !s.trim().is_empty() {
                return Some(s.trim().to_string());
            }
        }
    }
    None
}

fn probe_integer(raw: &Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        match raw.get(*key) {
            Some(Value::Number(n)) => return n.as_i64(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.trim().parse::<i64>() {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

/// Actor ids may sit flat on the request or nested under a sub-object
/// (`coordinator: {_id: ...}`).
fn probe_actor_id(raw: &Value, keys: &[&str], nested_key: &str) -> Option<String> {
    if let Some(id) = probe_id(raw, keys) {
        return Some(id);
    }
    let nested = raw
        .get(nested_key)
        .or_else(|| raw.get(capitalize(nested_key).as_str()))?;
    probe_id(nested, &["_id", "id", "Id"])
}

fn probe_datetime(raw: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    for key in keys {
        if let Some(parsed) = raw.get(*key).and_then(value_to_datetime) {
            return Some(parsed);
        }
    }
    None
}

fn value_to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_datetime_str(s),
        Value::Number(n) => n.as_i64().and_then(epoch_to_datetime),
        // `{"$date": <millis | string>}` wrapper
        Value::Object(obj) => obj.get("$date").and_then(value_to_datetime),
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Date-only strings from the calendar forms
    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    // Some records store the epoch as a string
    trimmed.parse::<i64>().ok().and_then(epoch_to_datetime)
}

fn epoch_to_datetime(epoch: i64) -> Option<DateTime<Utc>> {
    // Values past ~2001 in milliseconds are unambiguous; anything smaller is
    // treated as seconds.
    if epoch > 1_000_000_000_000 {
        Utc.timestamp_millis_opt(epoch).single()
    } else {
        Utc.timestamp_opt(epoch, 0).single()
    }
}

fn probe_grants(raw: &Value, event: Option<&Value>) -> ExplicitGrants {
    let actions = probe_allowed_actions(raw).or_else(|| event.and_then(probe_allowed_actions));

    let flag = |key: &str| -> Option<bool> {
        raw.get(key)
            .or_else(|| event.and_then(|e| e.get(key)))
            .and_then(Value::as_bool)
    };

    ExplicitGrants {
        actions,
        can_view: flag("canView"),
        can_accept: flag("canAccept"),
        can_reject: flag("canReject"),
        can_reschedule: flag("canReschedule"),
        can_confirm: flag("canConfirm"),
        can_decline: flag("canDecline"),
        can_cancel: flag("canAdminAction"),
        can_delete: flag("canDelete"),
        can_manage_staff: flag("canManageStaff"),
    }
}

fn probe_allowed_actions(raw: &Value) -> Option<Vec<String>> {
    let list = raw.get("allowedActions")?.as_array()?;
    Some(
        list.iter()
            .filter_map(Value::as_str)
            .map(|s| s.to_string())
            .collect(),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_probe_takes_first_non_null_of_the_four_candidates() {
        let raw = json!({"RequestId": "r-2", "_id": "r-3"});
        assert_eq!(normalize_request(&raw).unwrap().id, "r-2");

        let raw = json!({"Request_ID": "r-1", "RequestId": "r-2"});
        assert_eq!(normalize_request(&raw).unwrap().id, "r-1");

        let raw = json!({"requestId": "r-4"});
        assert_eq!(normalize_request(&raw).unwrap().id, "r-4");
    }

    #[test]
    fn request_without_any_id_is_rejected() {
        let raw = json!({"Status": "Approved"});
        assert!(matches!(
            normalize_request(&raw),
            Err(NormalizeError::MissingId)
        ));
    }

    #[test]
    fn actor_ids_are_found_nested_under_sub_objects() {
        let raw = json!({
            "_id": "r-9",
            "coordinator": {"_id": "c-7", "name": "A. Coordinator"},
            "stakeholder": {"id": "s-3"}
        });
        let request = normalize_request(&raw).unwrap();
        assert_eq!(request.coordinator_id.as_deref(), Some("c-7"));
        assert_eq!(request.stakeholder_id.as_deref(), Some("s-3"));
    }

    #[test]
    fn flat_actor_ids_win_over_nested_ones() {
        let raw = json!({
            "_id": "r-9",
            "coordinator_id": "c-1",
            "coordinator": {"_id": "c-2"}
        });
        let request = normalize_request(&raw).unwrap();
        assert_eq!(request.coordinator_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn timestamps_decode_from_all_three_wire_shapes() {
        let iso = json!({"startDate": "2026-03-01T09:30:00Z"});
        let millis = json!({"startDate": 1772357400000i64});
        let wrapped = json!({"startDate": {"$date": 1772357400000i64}});

        let a = normalize_event(&iso).starts_at.unwrap();
        let b = normalize_event(&millis).starts_at.unwrap();
        let c = normalize_event(&wrapped).starts_at.unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn empty_original_data_is_not_an_edit() {
        let raw = json!({"_id": "r-1", "originalData": {}});
        assert!(!normalize_request(&raw).unwrap().is_edit);

        let raw = json!({"_id": "r-1", "originalData": {"title": "old"}});
        assert!(normalize_request(&raw).unwrap().is_edit);
    }

    #[test]
    fn grants_are_collected_from_request_and_nested_event() {
        let raw = json!({
            "_id": "r-1",
            "canAdminAction": true,
            "event": {"allowedActions": ["accept", "reject"], "canDelete": false}
        });
        let grants = normalize_request(&raw).unwrap().grants;
        assert_eq!(grants.actions.as_deref(), Some(&["accept".to_string(), "reject".to_string()][..]));
        assert_eq!(grants.can_cancel, Some(true));
        assert_eq!(grants.can_delete, Some(false));
    }

    #[test]
    fn list_items_are_found_under_any_known_envelope() {
        let enveloped = json!({"data": [{"_id": "a"}], "statusCounts": {}});
        assert_eq!(request_items(&enveloped).len(), 1);

        let bare = json!([{"_id": "a"}, {"_id": "b"}]);
        assert_eq!(request_items(&bare).len(), 2);

        let unknown = json!({"payload": []});
        assert!(request_items(&unknown).is_empty());
    }
}
