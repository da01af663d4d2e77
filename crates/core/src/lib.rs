//! # HCR Core
//!
//! Interaction layer of the healthcare records client.
//!
//! This crate holds everything between user input and the remote records service:
//! - Wallet connection and role derivation (`connection`)
//! - The typed service binding, its ABI codec and JSON-RPC transport (`ledger`, `abi`, `rpc`)
//! - Observable session state (`session`)
//! - Per-action validation and orchestration (`validation`, `orchestrator`)
//!
//! **No presentation concerns**: rendering and input collection belong in the binaries.

pub mod abi;
pub mod config;
pub mod connection;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod record;
pub mod rpc;
pub mod schema;
pub mod session;
pub mod validation;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use config::{load_from_env, CoreConfig};
pub use connection::{Connection, ConnectionManager, Role};
pub use error::{
    ActionError, ConfigError, ConfigResult, ConnectionError, LedgerError, LedgerResult,
    TransportError, ValidationError,
};
pub use ledger::{ContractBinding, RecordsLedger, TransactionHandle};
pub use orchestrator::{ActionHandle, ActionOutcome, Orchestrator};
pub use record::Record;
pub use rpc::{detect_agent, JsonRpcClient};
pub use session::{
    ActionKind, ActionPhase, ActionStatus, Notice, NoticeLevel, PendingInput, RecordCollection,
    Session, SessionSnapshot,
};
pub use wallet::{
    CallRequest, LedgerTransport, TransactionReceipt, TransactionRequest, WalletAgent,
    WalletProvider,
};
