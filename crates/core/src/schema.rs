//! The fixed operation schema of the healthcare records service.
//!
//! Each remote operation is identified on the wire by the first four bytes of the
//! Keccak-256 hash of its canonical signature. Selectors are derived once, when a
//! binding is built, and never looked up by name afterwards.

use sha3::{Digest, Keccak256};

/// Whether an operation changes remote state (and so needs confirmation).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    NonPayable,
    View,
}

/// One callable operation of the service.
#[derive(Clone, Copy, Debug)]
pub struct OperationSpec {
    pub name: &'static str,
    pub signature: &'static str,
    pub mutability: Mutability,
}

impl OperationSpec {
    pub fn selector(&self) -> [u8; 4] {
        selector(self.signature)
    }
}

pub const ADD_RECORD: OperationSpec = OperationSpec {
    name: "addRecord",
    signature: "addRecord(uint256,string,string,string)",
    mutability: Mutability::NonPayable,
};

pub const AUTHORIZE_PROVIDER: OperationSpec = OperationSpec {
    name: "authorizeProvider",
    signature: "authorizeProvider(address)",
    mutability: Mutability::NonPayable,
};

pub const GET_OWNER: OperationSpec = OperationSpec {
    name: "getOwner",
    signature: "getOwner()",
    mutability: Mutability::View,
};

pub const GET_PATIENT_RECORDS: OperationSpec = OperationSpec {
    name: "getPatientRecords",
    signature: "getPatientRecords(uint256)",
    mutability: Mutability::View,
};

pub const OPERATIONS: [OperationSpec; 4] =
    [ADD_RECORD, AUTHORIZE_PROVIDER, GET_OWNER, GET_PATIENT_RECORDS];

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// Selectors for every operation, derived once per binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selectors {
    pub add_record: [u8; 4],
    pub authorize_provider: [u8; 4],
    pub get_owner: [u8; 4],
    pub get_patient_records: [u8; 4],
}

impl Selectors {
    pub fn derive() -> Self {
        Self {
            add_record: ADD_RECORD.selector(),
            authorize_provider: AUTHORIZE_PROVIDER.selector(),
            get_owner: GET_OWNER.selector(),
            get_patient_records: GET_PATIENT_RECORDS.selector(),
        }
    }
}
