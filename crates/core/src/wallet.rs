//! Capabilities the client needs from the external wallet agent.
//!
//! The agent is treated as an opaque provider: it grants account access, signs and
//! submits transactions, and answers read-only ledger queries. [`WalletProvider`] is
//! the combined capability that the connection manager and the contract binding use.

use crate::error::TransportError;
use async_trait::async_trait;
use hcr_types::{Address, TxHash};

/// A state-changing call to be signed and submitted by the agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
}

/// A read-only call evaluated against the latest ledger state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Vec<u8>,
}

/// Outcome of a finalized transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub succeeded: bool,
}

/// Account access and signing.
#[async_trait]
pub trait WalletAgent: Send + Sync {
    /// Ask the agent for account access. The first account is the active one.
    async fn request_accounts(&self) -> Result<Vec<Address>, TransportError>;

    /// Sign and submit a transaction, returning its hash once accepted.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, TransportError>;
}

/// Read access to the ledger.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, TransportError>;

    /// `None` while the transaction is still pending.
    async fn transaction_receipt(
        &self,
        hash: &TxHash,
    ) -> Result<Option<TransactionReceipt>, TransportError>;
}

/// The full capability injected into the client.
pub trait WalletProvider: WalletAgent + LedgerTransport {}

impl<T: WalletAgent + LedgerTransport> WalletProvider for T {}
