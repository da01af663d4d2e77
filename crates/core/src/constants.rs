//! Constants used throughout the healthcare records core crate.
//!
//! This module keeps the fixed service binding, configuration defaults and the
//! user-facing notification texts in one place.

/// Address of the deployed healthcare records service.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x15a3a036654e09c251783ef6db20b291c2f1f4ae";

/// Subject name sent with every `addRecord` call when none is configured.
pub const DEFAULT_SUBJECT_NAME: &str = "Alice";

/// Interval between transaction receipt polls while awaiting confirmation.
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;

/// Environment variable holding the wallet agent's JSON-RPC endpoint.
pub const ENV_RPC_URL: &str = "HCR_RPC_URL";
/// Environment variable overriding the service address.
pub const ENV_CONTRACT_ADDRESS: &str = "HCR_CONTRACT_ADDRESS";
/// Environment variable overriding the subject name sent with new records.
pub const ENV_SUBJECT_NAME: &str = "HCR_SUBJECT_NAME";
/// Environment variable overriding the receipt poll interval, in milliseconds.
pub const ENV_RECEIPT_POLL_MS: &str = "HCR_RECEIPT_POLL_MS";
/// Environment variable enabling a confirmation timeout, in milliseconds.
pub const ENV_CONFIRMATION_TIMEOUT_MS: &str = "HCR_CONFIRMATION_TIMEOUT_MS";

/// JSON-RPC error code for an unsupported method.
pub const RPC_METHOD_NOT_FOUND: i64 = -32601;

pub const MSG_ENTER_SUBJECT_ID: &str = "Please enter a Patient ID";
pub const MSG_NOT_CONNECTED: &str = "Contract is not loaded";
pub const MSG_MISSING_FIELDS: &str = "Please fill in all fields.";
pub const MSG_INVALID_SUBJECT_ID: &str = "Please enter a valid Patient ID (positive number).";
pub const MSG_NOT_OWNER: &str = "Only contract owner can call this function";
pub const MSG_ENTER_PROVIDER: &str = "Please enter a Provider Address";
pub const MSG_INVALID_PROVIDER: &str = "Please enter a valid Provider Address";
pub const MSG_RECORD_ADDED: &str = "Record added successfully!";
pub const MSG_FETCH_FAILED: &str =
    "Error fetching patient records. Please check the console for details.";
pub const MSG_ADD_FAILED: &str = "Error adding record. Please check the console for details.";
pub const MSG_AUTHORIZE_FAILED: &str =
    "Error authorizing provider. Please check the console for details.";
