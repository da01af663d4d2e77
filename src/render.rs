//! Text rendering of a session snapshot.

use hcr_core::{ActionPhase, NoticeLevel, SessionSnapshot};
use std::fmt::Write;

fn phase_label(phase: ActionPhase) -> &'static str {
    match phase {
        ActionPhase::Idle => "queued",
        ActionPhase::Validating => "validating",
        ActionPhase::Submitting => "submitting",
        ActionPhase::AwaitingConfirmation => "awaiting confirmation",
        ActionPhase::Succeeded => "done",
        ActionPhase::Failed => "failed",
    }
}

pub fn render(snapshot: &SessionSnapshot) -> String {
    let mut out = String::from("== HealthCare Application ==\n");

    if let Some(identity) = snapshot.identity {
        let _ = writeln!(out, "Connected Account: {identity}");
    }
    if snapshot.is_owner() {
        out.push_str("You are the contract owner\n");
    }

    for status in snapshot.in_flight.values() {
        let _ = writeln!(out, "[{}: {}]", status.kind, phase_label(status.phase));
    }

    if let Some(subject) = &snapshot.records.subject {
        let _ = writeln!(out, "\nPatient Records ({subject}):");
        if snapshot.records.records.is_empty() {
            out.push_str("  (none)\n");
        }
        for record in &snapshot.records.records {
            for line in record.to_string().lines() {
                let _ = writeln!(out, "  {line}");
            }
            out.push('\n');
        }
    }

    if let Some(notice) = &snapshot.last_notice {
        let marker = match notice.level {
            NoticeLevel::Info => "*",
            NoticeLevel::Error => "!",
        };
        let _ = writeln!(out, "{marker} {}", notice.message);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcr_core::{ActionKind, ActionStatus, Notice, Record, RecordCollection, Role};
    use hcr_types::{Address, SubjectId};

    fn owner() -> Address {
        "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4".parse().unwrap()
    }

    #[test]
    fn unconnected_session_shows_only_the_title() {
        let out = render(&SessionSnapshot::default());
        assert_eq!(out, "== HealthCare Application ==\n");
    }

    #[test]
    fn banners_follow_identity_and_role() {
        let mut snapshot = SessionSnapshot {
            identity: Some(owner()),
            role: Some(Role::Standard),
            ..Default::default()
        };
        let out = render(&snapshot);
        assert!(out.contains("Connected Account: 0x5b38da6a701c568545dcfcb03fcb875f56beddc4"));
        assert!(!out.contains("contract owner"));

        snapshot.role = Some(Role::Owner);
        assert!(render(&snapshot).contains("You are the contract owner"));
    }

    #[test]
    fn records_and_notice_are_listed() {
        let snapshot = SessionSnapshot {
            identity: Some(owner()),
            role: Some(Role::Owner),
            records: RecordCollection {
                subject: Some(SubjectId::parse("42").unwrap()),
                records: vec![Record {
                    record_id: 1,
                    subject_name: "Alice".into(),
                    diagnosis: "Flu".into(),
                    treatment: "Rest".into(),
                    timestamp: 1_700_000_000,
                }],
            },
            last_notice: Some(Notice::info("Record added successfully!")),
            ..Default::default()
        };

        let out = render(&snapshot);
        assert!(out.contains("Patient Records (42):"));
        assert!(out.contains("  Record ID: 1\n"));
        assert!(out.contains("  Diagnosis: Flu\n"));
        assert!(out.contains("  Treatment: Rest\n"));
        assert!(out.ends_with("* Record added successfully!\n"));
    }

    #[test]
    fn empty_collection_is_marked() {
        let snapshot = SessionSnapshot {
            records: RecordCollection {
                subject: Some(SubjectId::parse("7").unwrap()),
                records: Vec::new(),
            },
            ..Default::default()
        };
        assert!(render(&snapshot).contains("Patient Records (7):\n  (none)\n"));
    }

    #[test]
    fn in_flight_actions_show_their_phase() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.in_flight.insert(
            uuid::Uuid::nil(),
            ActionStatus {
                kind: ActionKind::AddRecord,
                phase: ActionPhase::AwaitingConfirmation,
            },
        );
        snapshot.last_notice = Some(Notice::error("Please fill in all fields."));

        let out = render(&snapshot);
        assert!(out.contains("[add record: awaiting confirmation]"));
        assert!(out.contains("! Please fill in all fields."));
    }
}
