//! In-memory fakes of the wallet agent and the records service.
//!
//! Every fake records the calls it receives so tests can assert that local
//! validation failures never reached the remote side.

use crate::abi::fixtures;
use crate::config::CoreConfig;
use crate::constants::DEFAULT_CONTRACT_ADDRESS;
use crate::error::{LedgerError, LedgerResult, TransportError};
use crate::ledger::{RecordsLedger, TransactionHandle};
use crate::record::Record;
use crate::schema::Selectors;
use crate::wallet::{
    CallRequest, LedgerTransport, TransactionReceipt, TransactionRequest, WalletAgent,
};
use async_trait::async_trait;
use hcr_types::{Address, NonEmptyText, SubjectId, TxHash};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const SERVICE: &str = DEFAULT_CONTRACT_ADDRESS;
pub(crate) const OWNER: &str = "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4";
pub(crate) const OTHER: &str = "0xAb8483F64d9C6d1EcF9b849Ae677dD3315835cb2";

const FIRST_TIMESTAMP: u64 = 1_700_000_000;

pub(crate) fn addr(value: &str) -> Address {
    value.parse().expect("test address should parse")
}

pub(crate) fn test_cfg() -> CoreConfig {
    CoreConfig::new(
        None,
        addr(SERVICE),
        NonEmptyText::new("Alice").unwrap(),
        Duration::from_millis(10),
        None,
    )
    .expect("test config should be valid")
}

pub(crate) fn record(record_id: u64, diagnosis: &str, treatment: &str, timestamp: u64) -> Record {
    Record {
        record_id,
        subject_name: "Alice".into(),
        diagnosis: diagnosis.into(),
        treatment: treatment.into(),
        timestamp,
    }
}

fn hash_for(counter: u64) -> TxHash {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&counter.to_be_bytes());
    TxHash::from_bytes(bytes)
}

// ============================================================================
// WALLET PROVIDER FAKE
// ============================================================================

struct PendingTx {
    request: TransactionRequest,
    revert: bool,
}

struct ProviderState {
    accounts: Vec<Address>,
    reject_access: bool,
    owner: Address,
    records: HashMap<String, Vec<Record>>,
    calls: Vec<CallRequest>,
    sent: Vec<TransactionRequest>,
    pending: HashMap<TxHash, PendingTx>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    polls_before_mining: u32,
    receipt_polls: u32,
    revert_next: bool,
    fail_calls: bool,
    next_tx: u64,
    block: u64,
    clock: u64,
}

/// A wallet-capable node that holds the service state in memory.
///
/// Transactions are mined when their receipt is polled, after
/// `polls_before_mining` empty polls.
pub(crate) struct FakeProvider {
    state: Mutex<ProviderState>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ProviderState {
                accounts: vec![addr(OWNER)],
                reject_access: false,
                owner: addr(OWNER),
                records: HashMap::new(),
                calls: Vec::new(),
                sent: Vec::new(),
                pending: HashMap::new(),
                receipts: HashMap::new(),
                polls_before_mining: 0,
                receipt_polls: 0,
                revert_next: false,
                fail_calls: false,
                next_tx: 1,
                block: 100,
                clock: FIRST_TIMESTAMP,
            }),
        }
    }

    pub(crate) fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub(crate) fn reject_access(&self) {
        self.state.lock().unwrap().reject_access = true;
    }

    pub(crate) fn set_blocks_until_mined(&self, polls: u32) {
        self.state.lock().unwrap().polls_before_mining = polls;
    }

    pub(crate) fn revert_next(&self) {
        self.state.lock().unwrap().revert_next = true;
    }

    pub(crate) fn fail_calls(&self) {
        self.state.lock().unwrap().fail_calls = true;
    }

    pub(crate) fn calls(&self) -> Vec<CallRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub(crate) fn receipt_polls(&self) -> u32 {
        self.state.lock().unwrap().receipt_polls
    }
}

impl ProviderState {
    fn mine(&mut self, hash: TxHash) -> Option<TransactionReceipt> {
        let pending = self.pending.remove(&hash)?;
        self.block += 1;

        if !pending.revert {
            let selectors = Selectors::derive();
            let data = &pending.request.data;
            if data.starts_with(&selectors.add_record) {
                let (subject, name, diagnosis, treatment) = fixtures::add_record_args(data);
                self.clock += 15;
                let records = self.records.entry(subject).or_default();
                records.push(Record {
                    record_id: records.len() as u64 + 1,
                    subject_name: name,
                    diagnosis,
                    treatment,
                    timestamp: self.clock,
                });
            }
        }

        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(self.block),
            succeeded: !pending.revert,
        };
        self.receipts.insert(hash, receipt.clone());
        Some(receipt)
    }
}

#[async_trait]
impl WalletAgent for FakeProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, TransportError> {
        let state = self.state.lock().unwrap();
        if state.reject_access {
            return Err(TransportError::Rpc {
                code: 4001,
                message: "User rejected the request.".into(),
            });
        }
        Ok(state.accounts.clone())
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, TransportError> {
        let mut state = self.state.lock().unwrap();
        let hash = hash_for(state.next_tx);
        state.next_tx += 1;
        let revert = std::mem::take(&mut state.revert_next);
        state.sent.push(tx.clone());
        state.pending.insert(
            hash,
            PendingTx {
                request: tx.clone(),
                revert,
            },
        );
        Ok(hash)
    }
}

#[async_trait]
impl LedgerTransport for FakeProvider {
    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        if state.fail_calls {
            return Err(TransportError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            });
        }

        let selectors = Selectors::derive();
        if call.data.starts_with(&selectors.get_owner) {
            return Ok(fixtures::address(&state.owner));
        }
        if call.data.starts_with(&selectors.get_patient_records) {
            let subject = fixtures::uint_arg(&call.data, 0);
            let records = state.records.get(&subject).cloned().unwrap_or_default();
            return Ok(fixtures::records(&records));
        }
        Err(TransportError::Rpc {
            code: -32000,
            message: "unknown selector".into(),
        })
    }

    async fn transaction_receipt(
        &self,
        hash: &TxHash,
    ) -> Result<Option<TransactionReceipt>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.receipt_polls += 1;
        if let Some(receipt) = state.receipts.get(hash) {
            return Ok(Some(receipt.clone()));
        }
        if state.polls_before_mining > 0 {
            state.polls_before_mining -= 1;
            return Ok(None);
        }
        Ok(state.mine(*hash))
    }
}

// ============================================================================
// RECORDS LEDGER FAKE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LedgerCall {
    AddRecord {
        subject: String,
        name: String,
        diagnosis: String,
        treatment: String,
    },
    AuthorizeProvider(Address),
    GetOwner,
    GetPatientRecords(String),
}

#[derive(Default)]
struct LedgerState {
    records: HashMap<String, Vec<Record>>,
    authorized: Vec<Address>,
    calls: Vec<LedgerCall>,
    fail_reads: bool,
    fail_submissions: bool,
    revert_writes: bool,
    hang_confirmations: bool,
    next_tx: u64,
    clock: u64,
}

/// The records service at the typed-binding level.
///
/// Writes take effect only when their handle is awaited, mirroring confirmation.
#[derive(Clone)]
pub(crate) struct FakeLedger {
    owner: Address,
    state: Arc<Mutex<LedgerState>>,
}

impl FakeLedger {
    pub(crate) fn new(owner: Address) -> Self {
        Self {
            owner,
            state: Arc::new(Mutex::new(LedgerState {
                clock: FIRST_TIMESTAMP,
                ..Default::default()
            })),
        }
    }

    pub(crate) fn with_records(self, subject: &str, records: Vec<Record>) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .insert(subject.to_string(), records);
        self
    }

    pub(crate) fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub(crate) fn authorized(&self) -> Vec<Address> {
        self.state.lock().unwrap().authorized.clone()
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub(crate) fn fail_submissions(&self) {
        self.state.lock().unwrap().fail_submissions = true;
    }

    pub(crate) fn revert_writes(&self) {
        self.state.lock().unwrap().revert_writes = true;
    }

    pub(crate) fn hang_confirmations(&self) {
        self.state.lock().unwrap().hang_confirmations = true;
    }

    fn rpc_failure() -> LedgerError {
        LedgerError::Transport(TransportError::Rpc {
            code: -32000,
            message: "internal error".into(),
        })
    }

    /// Record the call and build a handle whose confirmation applies `effect`.
    fn submit(
        &self,
        call: LedgerCall,
        effect: impl FnOnce(&mut LedgerState) + Send + 'static,
    ) -> LedgerResult<TransactionHandle> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.fail_submissions {
            return Err(Self::rpc_failure());
        }

        state.next_tx += 1;
        let hash = hash_for(state.next_tx);
        let shared = self.state.clone();

        Ok(TransactionHandle::new(hash, async move {
            let (hang, revert) = {
                let state = shared.lock().unwrap();
                (state.hang_confirmations, state.revert_writes)
            };
            if hang {
                return std::future::pending::<LedgerResult<TransactionReceipt>>().await;
            }
            if revert {
                return Err(LedgerError::Reverted { hash });
            }
            effect(&mut shared.lock().unwrap());
            Ok(TransactionReceipt {
                transaction_hash: hash,
                block_number: Some(1),
                succeeded: true,
            })
        }))
    }
}

#[async_trait]
impl RecordsLedger for FakeLedger {
    async fn add_record(
        &self,
        subject: &SubjectId,
        name: &NonEmptyText,
        diagnosis: &NonEmptyText,
        treatment: &NonEmptyText,
    ) -> LedgerResult<TransactionHandle> {
        let key = subject.as_decimal().to_string();
        let call = LedgerCall::AddRecord {
            subject: key.clone(),
            name: name.to_string(),
            diagnosis: diagnosis.to_string(),
            treatment: treatment.to_string(),
        };
        let (name, diagnosis, treatment) =
            (name.to_string(), diagnosis.to_string(), treatment.to_string());

        self.submit(call, move |state| {
            state.clock += 60;
            let timestamp = state.clock;
            let records = state.records.entry(key).or_default();
            records.push(Record {
                record_id: records.len() as u64 + 1,
                subject_name: name,
                diagnosis,
                treatment,
                timestamp,
            });
        })
    }

    async fn authorize_provider(&self, provider: &Address) -> LedgerResult<TransactionHandle> {
        let provider = *provider;
        self.submit(LedgerCall::AuthorizeProvider(provider), move |state| {
            state.authorized.push(provider)
        })
    }

    async fn get_owner(&self) -> LedgerResult<Address> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(LedgerCall::GetOwner);
        if state.fail_reads {
            return Err(Self::rpc_failure());
        }
        Ok(self.owner)
    }

    async fn get_patient_records(&self, subject: &SubjectId) -> LedgerResult<Vec<Record>> {
        let mut state = self.state.lock().unwrap();
        let key = subject.as_decimal().to_string();
        state.calls.push(LedgerCall::GetPatientRecords(key.clone()));
        if state.fail_reads {
            return Err(Self::rpc_failure());
        }
        Ok(state.records.get(&key).cloned().unwrap_or_default())
    }
}
