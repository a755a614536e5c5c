// src/workflow/actions.rs
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// The full vocabulary of per-request operations the dashboard can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AllowedAction {
    View,
    Accept,
    Reject,
    Reschedule,
    Confirm,
    Decline,
    Cancel,
    Delete,
    ManageStaff,
}

pub const ALL_ACTIONS: [AllowedAction; 9] = [
    AllowedAction::View,
    AllowedAction::Accept,
    AllowedAction::Reject,
    AllowedAction::Reschedule,
    AllowedAction::Confirm,
    AllowedAction::Decline,
    AllowedAction::Cancel,
    AllowedAction::Delete,
    AllowedAction::ManageStaff,
];

impl AllowedAction {
    /// Parse a wire action name, folding the known synonyms
    /// (`approve` means accept, anything starting with `resched` means
    /// reschedule). Unknown names return `None` rather than erroring so a
    /// backend that grows new actions does not break the dashboard.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        if lowered.starts_with("resched") {
            return Some(Self::Reschedule);
        }
        match lowered.as_str() {
            "view" => Some(Self::View),
            "accept" | "approve" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            "confirm" => Some(Self::Confirm),
            "decline" => Some(Self::Decline),
            "cancel" => Some(Self::Cancel),
            "delete" => Some(Self::Delete),
            "manage-staff" | "manage_staff" | "managestaff" => Some(Self::ManageStaff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Reschedule => "reschedule",
            Self::Confirm => "confirm",
            Self::Decline => "decline",
            Self::Cancel => "cancel",
            Self::Delete => "delete",
            Self::ManageStaff => "manage-staff",
        }
    }
}

/// Set of actions currently permitted on one request for one viewer.
///
/// All lookups go through the synonym fold in [`AllowedAction::parse`], so
/// `allows("approve")` and `allows("accept")` agree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet(BTreeSet<AllowedAction>);

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action: AllowedAction) {
        self.0.insert(action);
    }

    /// Insert a raw wire name; unknown names are ignored.
    pub fn insert_raw(&mut self, raw: &str) {
        if let Some(action) = AllowedAction::parse(raw) {
            self.0.insert(action);
        }
    }

    pub fn remove(&mut self, action: AllowedAction) {
        self.0.remove(&action);
    }

    pub fn contains(&self, action: AllowedAction) -> bool {
        self.0.contains(&action)
    }

    /// `hasAllowedAction` style lookup by wire name, synonym-tolerant.
    pub fn allows(&self, raw: &str) -> bool {
        AllowedAction::parse(raw)
            .map(|action| self.0.contains(&action))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AllowedAction> + '_ {
        self.0.iter().copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(AllowedAction::as_str).collect()
    }
}

impl FromIterator<AllowedAction> for ActionSet {
    fn from_iter<I: IntoIterator<Item = AllowedAction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for ActionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}
