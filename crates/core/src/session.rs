//! Session State: the connected account, its role, pending form input, the last fetched
//! record collection and the actions currently in flight.
//!
//! State lives in a `tokio::sync::watch` channel. The presentation side calls
//! [`Session::subscribe`] and redraws whenever the receiver reports a change; every
//! mutation below notifies subscribers only if it actually changed something.

use crate::connection::Role;
use crate::record::Record;
use hcr_types::{Address, SubjectId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::watch;
use uuid::Uuid;

/// The user-triggered actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fetch,
    AddRecord,
    AuthorizeProvider,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Fetch => "fetch records",
            ActionKind::AddRecord => "add record",
            ActionKind::AuthorizeProvider => "authorize provider",
        })
    }
}

/// Lifecycle of a single action invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPhase {
    Idle,
    Validating,
    Submitting,
    AwaitingConfirmation,
    Succeeded,
    Failed,
}

impl ActionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionPhase::Succeeded | ActionPhase::Failed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ActionStatus {
    pub kind: ActionKind,
    pub phase: ActionPhase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-visible notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Raw form fields. Never validated or cleared here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PendingInput {
    pub subject_id: String,
    pub diagnosis: String,
    pub treatment: String,
    pub provider_address: String,
}

/// Records of the last successfully fetched subject.
///
/// Replaced wholesale on every successful fetch. Editing the subject input afterwards
/// does not invalidate it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecordCollection {
    pub subject: Option<SubjectId>,
    pub records: Vec<Record>,
}

/// A point-in-time copy of the session for rendering.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SessionSnapshot {
    pub identity: Option<Address>,
    pub role: Option<Role>,
    pub input: PendingInput,
    pub records: RecordCollection,
    pub in_flight: BTreeMap<Uuid, ActionStatus>,
    pub last_notice: Option<Notice>,
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_owner(&self) -> bool {
        self.role.is_some_and(Role::is_privileged)
    }
}

pub struct Session {
    state: watch::Sender<SessionSnapshot>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(SessionSnapshot::default()),
        }
    }

    /// Observe changes. The receiver starts with the current state marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    fn set_input(&self, value: String, field: impl FnOnce(&mut PendingInput) -> &mut String) {
        self.state.send_if_modified(|state| {
            let slot = field(&mut state.input);
            if *slot == value {
                return false;
            }
            *slot = value;
            true
        });
    }

    pub fn set_subject_id(&self, value: impl Into<String>) {
        self.set_input(value.into(), |input| &mut input.subject_id);
    }

    pub fn set_diagnosis(&self, value: impl Into<String>) {
        self.set_input(value.into(), |input| &mut input.diagnosis);
    }

    pub fn set_treatment(&self, value: impl Into<String>) {
        self.set_input(value.into(), |input| &mut input.treatment);
    }

    pub fn set_provider_address(&self, value: impl Into<String>) {
        self.set_input(value.into(), |input| &mut input.provider_address);
    }

    pub(crate) fn set_connection(&self, identity: Address, role: Role) {
        self.state.send_modify(|state| {
            state.identity = Some(identity);
            state.role = Some(role);
        });
    }

    pub(crate) fn replace_records(&self, subject: SubjectId, records: Vec<Record>) {
        self.state.send_modify(|state| {
            state.records = RecordCollection {
                subject: Some(subject),
                records,
            };
        });
    }

    pub(crate) fn begin_action(&self, kind: ActionKind) -> Uuid {
        let id = Uuid::new_v4();
        self.state.send_modify(|state| {
            state.in_flight.insert(
                id,
                ActionStatus {
                    kind,
                    phase: ActionPhase::Idle,
                },
            );
        });
        id
    }

    pub(crate) fn set_phase(&self, id: Uuid, phase: ActionPhase) {
        self.state.send_if_modified(|state| match state.in_flight.get_mut(&id) {
            Some(status) if status.phase != phase => {
                status.phase = phase;
                true
            }
            _ => false,
        });
    }

    /// Drop the action from the in-flight set and, if given, publish its notice.
    pub(crate) fn finish_action(&self, id: Uuid, notice: Option<Notice>) {
        self.state.send_if_modified(|state| {
            let removed = state.in_flight.remove(&id).is_some();
            match notice {
                Some(notice) => {
                    state.last_notice = Some(notice);
                    true
                }
                None => removed,
            }
        });
    }
}
