use crate::constants::{
    MSG_ADD_FAILED, MSG_AUTHORIZE_FAILED, MSG_ENTER_PROVIDER, MSG_ENTER_SUBJECT_ID,
    MSG_FETCH_FAILED, MSG_INVALID_PROVIDER, MSG_INVALID_SUBJECT_ID, MSG_MISSING_FIELDS,
    MSG_NOT_CONNECTED, MSG_NOT_OWNER,
};
use crate::session::ActionKind;
use hcr_types::{AddressError, SubjectIdError, TxHash};
use std::time::Duration;

/// Failures talking to the wallet agent or ledger node over JSON-RPC.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {0} without a JSON-RPC error")]
    Status(u16),
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed JSON-RPC response: {0}")]
    Decode(String),
}

/// Failures of a single remote operation on the records service.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to encode call: {0}")]
    Encoding(String),
    #[error("failed to decode return data: {0}")]
    Decoding(String),
    #[error("transaction {hash} was reverted")]
    Reverted { hash: TxHash },
    #[error("transaction {hash} not confirmed within {waited:?}")]
    ConfirmationTimeout { hash: TxHash, waited: Duration },
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Reasons the one-time wallet connection did not produce a session.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("no wallet agent is available")]
    AgentUnavailable,
    #[error("account access request failed: {0}")]
    AccessDenied(#[source] TransportError),
    #[error("wallet agent returned no accounts")]
    NoAccounts,
    #[error("failed to read service owner: {0}")]
    OwnerLookup(#[source] LedgerError),
    #[error("connection was already attempted for this session")]
    AlreadyAttempted,
}

/// Local pre-check failures. These never reach the remote service.
///
/// The `Display` text is the notification shown to the user.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{}", MSG_NOT_CONNECTED)]
    NotConnected,
    #[error("{}", MSG_ENTER_SUBJECT_ID)]
    MissingSubjectId,
    #[error("{}", MSG_MISSING_FIELDS)]
    MissingFields,
    #[error("{}", MSG_INVALID_SUBJECT_ID)]
    InvalidSubjectId(#[source] SubjectIdError),
    #[error("{}", MSG_NOT_OWNER)]
    NotOwner,
    #[error("{}", MSG_ENTER_PROVIDER)]
    MissingProviderAddress,
    #[error("{}", MSG_INVALID_PROVIDER)]
    InvalidProviderAddress(#[source] AddressError),
}

/// Terminal failure of a user-triggered action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{kind} call failed: {source}")]
    RemoteCall {
        kind: ActionKind,
        #[source]
        source: LedgerError,
    },
    #[error("{kind} was not confirmed: {source}")]
    Confirmation {
        kind: ActionKind,
        #[source]
        source: LedgerError,
    },
}

impl ActionError {
    /// Text for the user-visible notification.
    ///
    /// Remote failures get a generic message; the detail goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            ActionError::Validation(err) => err.to_string(),
            ActionError::RemoteCall { kind, .. } | ActionError::Confirmation { kind, .. } => {
                match kind {
                    ActionKind::Fetch => MSG_FETCH_FAILED,
                    ActionKind::AddRecord => MSG_ADD_FAILED,
                    ActionKind::AuthorizeProvider => MSG_AUTHORIZE_FAILED,
                }
                .to_string()
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ActionError::Validation(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
