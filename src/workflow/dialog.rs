// src/workflow/dialog.rs
//
// Ephemeral confirmation-dialog state, one board per viewer session. Each
// request card tracks its dialogs independently: opening one never closes
// another, and a successful submission closes only its own dialog (the
// delete flow additionally pops a transient success dialog).

use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DialogKind {
    Accept,
    Reject,
    Reschedule,
    Confirm,
    Decline,
    Cancel,
    Delete,
    DeleteSuccess,
}

impl DialogKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "accept" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            "reschedule" => Some(Self::Reschedule),
            "confirm" => Some(Self::Confirm),
            "decline" => Some(Self::Decline),
            "cancel" => Some(Self::Cancel),
            "delete" => Some(Self::Delete),
            "delete-success" => Some(Self::DeleteSuccess),
            _ => None,
        }
    }
}

/// Dialog flags for a single request card.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct CardDialogs {
    open: BTreeSet<DialogKind>,
}

impl CardDialogs {
    pub fn open(&mut self, kind: DialogKind) {
        self.open.insert(kind);
    }

    pub fn close(&mut self, kind: DialogKind) {
        self.open.remove(&kind);
    }

    pub fn is_open(&self, kind: DialogKind) -> bool {
        self.open.contains(&kind)
    }

    pub fn open_dialogs(&self) -> Vec<DialogKind> {
        self.open.iter().copied().collect()
    }

    /// Applied when the matching action submission succeeds: only the
    /// submitting dialog closes, and a completed delete pops the transient
    /// success dialog.
    pub fn submission_succeeded(&mut self, kind: DialogKind) {
        self.open.remove(&kind);
        if kind == DialogKind::Delete {
            self.open.insert(DialogKind::DeleteSuccess);
        }
    }
}

/// All card dialog state for one viewer.
#[derive(Debug, Default)]
pub struct DialogBoard {
    cards: HashMap<String, CardDialogs>,
}

impl DialogBoard {
    pub fn card_mut(&mut self, request_id: &str) -> &mut CardDialogs {
        self.cards.entry(request_id.to_string()).or_default()
    }

    pub fn card(&self, request_id: &str) -> Option<&CardDialogs> {
        self.cards.get(request_id)
    }
}

/// ✅ **Per-viewer session store** (TTL-evicted, same `moka` pattern as the
/// response cache). Keyed by viewer id, or by token when no id is known.
#[derive(Clone)]
pub struct SessionStore {
    boards: Cache<String, Arc<Mutex<DialogBoard>>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            boards: Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub fn board(&self, session_key: &str) -> Arc<Mutex<DialogBoard>> {
        self.boards
            .get_with(session_key.to_string(), || Arc::new(Mutex::new(DialogBoard::default())))
    }

    /// Run `f` against the viewer's board under its lock.
    pub fn with_board<R>(&self, session_key: &str, f: impl FnOnce(&mut DialogBoard) -> R) -> R {
        let board = self.board(session_key);
        let mut guard = board.lock().expect("dialog board lock poisoned");
        f(&mut guard)
    }
}
