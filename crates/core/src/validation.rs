//! Local pre-checks for each action.
//!
//! These run against a session snapshot before any remote call is made. A failure is
//! terminal for that invocation.

use crate::error::ValidationError;
use crate::session::SessionSnapshot;
use hcr_types::{Address, NonEmptyText, SubjectId, SubjectIdError};

/// Validated arguments of an add-record action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddRecordInput {
    pub subject: SubjectId,
    pub diagnosis: NonEmptyText,
    pub treatment: NonEmptyText,
}

fn require_connection(snapshot: &SessionSnapshot) -> Result<(), ValidationError> {
    if snapshot.is_connected() {
        Ok(())
    } else {
        Err(ValidationError::NotConnected)
    }
}

fn subject(raw: &str) -> Result<SubjectId, ValidationError> {
    SubjectId::parse(raw).map_err(|e| match e {
        SubjectIdError::Empty => ValidationError::MissingSubjectId,
        other => ValidationError::InvalidSubjectId(other),
    })
}

/// The subject to fetch records for.
///
/// Without a connection there is nothing to fetch from, which is reported the same
/// way as a missing subject id.
pub fn validate_fetch(snapshot: &SessionSnapshot) -> Result<SubjectId, ValidationError> {
    if !snapshot.is_connected() {
        return Err(ValidationError::MissingSubjectId);
    }
    subject(&snapshot.input.subject_id)
}

/// All three fields must be non-blank and the subject id a positive integer.
pub fn validate_add_record(snapshot: &SessionSnapshot) -> Result<AddRecordInput, ValidationError> {
    require_connection(snapshot)?;

    let input = &snapshot.input;
    let (Ok(diagnosis), Ok(treatment)) = (
        NonEmptyText::new(&input.diagnosis),
        NonEmptyText::new(&input.treatment),
    ) else {
        return Err(ValidationError::MissingFields);
    };
    if input.subject_id.trim().is_empty() {
        return Err(ValidationError::MissingFields);
    }

    Ok(AddRecordInput {
        subject: subject(&input.subject_id)?,
        diagnosis,
        treatment,
    })
}

/// The role check comes first, so a standard account is rejected whatever it typed.
/// An unconnected session has no role and fails the same check.
pub fn validate_authorize(snapshot: &SessionSnapshot) -> Result<Address, ValidationError> {
    if !snapshot.is_owner() {
        return Err(ValidationError::NotOwner);
    }

    let raw = snapshot.input.provider_address.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingProviderAddress);
    }
    raw.parse()
        .map_err(ValidationError::InvalidProviderAddress)
}
