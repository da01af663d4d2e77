//! Typed binding to the remote healthcare records service.
//!
//! [`RecordsLedger`] has one method per remote operation with a fixed signature.
//! [`ContractBinding`] implements it over a [`WalletProvider`], encoding calls with the
//! selectors derived once from the operation schema.
//!
//! State-changing operations return a [`TransactionHandle`]; their effect is only
//! observable after [`TransactionHandle::wait`] resolves successfully.

use crate::abi::{self, Token};
use crate::config::CoreConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::record::Record;
use crate::schema::Selectors;
use crate::wallet::{CallRequest, TransactionReceipt, TransactionRequest, WalletProvider};
use async_trait::async_trait;
use hcr_types::{Address, NonEmptyText, SubjectId, TxHash};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

type Confirmation = Pin<Box<dyn Future<Output = LedgerResult<TransactionReceipt>> + Send>>;

/// A submitted state change awaiting finalization.
pub struct TransactionHandle {
    hash: TxHash,
    confirmation: Confirmation,
}

impl TransactionHandle {
    pub fn new<F>(hash: TxHash, confirmation: F) -> Self
    where
        F: Future<Output = LedgerResult<TransactionReceipt>> + Send + 'static,
    {
        Self {
            hash,
            confirmation: Box::pin(confirmation),
        }
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// Suspend until the service finalizes the change or reports failure.
    pub async fn wait(self) -> LedgerResult<TransactionReceipt> {
        self.confirmation.await
    }
}

impl std::fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// The four operations of the records service.
#[async_trait]
pub trait RecordsLedger: Send + Sync {
    async fn add_record(
        &self,
        subject: &SubjectId,
        name: &NonEmptyText,
        diagnosis: &NonEmptyText,
        treatment: &NonEmptyText,
    ) -> LedgerResult<TransactionHandle>;

    /// Only the service owner may call this; the service enforces it.
    async fn authorize_provider(&self, provider: &Address) -> LedgerResult<TransactionHandle>;

    async fn get_owner(&self) -> LedgerResult<Address>;

    async fn get_patient_records(&self, subject: &SubjectId) -> LedgerResult<Vec<Record>>;
}

/// [`RecordsLedger`] over a wallet provider, signing as the connected account.
pub struct ContractBinding {
    address: Address,
    signer: Address,
    provider: Arc<dyn WalletProvider>,
    selectors: Selectors,
    poll_interval: Duration,
    confirmation_timeout: Option<Duration>,
}

impl ContractBinding {
    pub fn new(cfg: &CoreConfig, provider: Arc<dyn WalletProvider>, signer: Address) -> Self {
        Self {
            address: cfg.contract_address(),
            signer,
            provider,
            selectors: Selectors::derive(),
            poll_interval: cfg.receipt_poll_interval(),
            confirmation_timeout: cfg.confirmation_timeout(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    async fn read(&self, data: Vec<u8>) -> LedgerResult<Vec<u8>> {
        let call = CallRequest {
            from: Some(self.signer),
            to: self.address,
            data,
        };
        Ok(self.provider.call(&call).await?)
    }

    async fn submit(&self, data: Vec<u8>) -> LedgerResult<TransactionHandle> {
        let tx = TransactionRequest {
            from: self.signer,
            to: self.address,
            data,
        };
        let hash = self.provider.send_transaction(&tx).await?;
        tracing::debug!("submitted transaction {}", hash);

        let provider = self.provider.clone();
        let poll = self.poll_interval;
        let confirmation: Confirmation = match self.confirmation_timeout {
            None => Box::pin(await_receipt(provider, hash, poll)),
            Some(limit) => Box::pin(async move {
                tokio::time::timeout(limit, await_receipt(provider, hash, poll))
                    .await
                    .map_err(|_| LedgerError::ConfirmationTimeout {
                        hash,
                        waited: limit,
                    })?
            }),
        };

        Ok(TransactionHandle { hash, confirmation })
    }
}

/// Poll for the receipt until the transaction is finalized.
async fn await_receipt(
    provider: Arc<dyn WalletProvider>,
    hash: TxHash,
    poll: Duration,
) -> LedgerResult<TransactionReceipt> {
    loop {
        if let Some(receipt) = provider.transaction_receipt(&hash).await? {
            if !receipt.succeeded {
                return Err(LedgerError::Reverted { hash });
            }
            tracing::debug!(
                "transaction {} confirmed in block {:?}",
                hash,
                receipt.block_number
            );
            return Ok(receipt);
        }
        tokio::time::sleep(poll).await;
    }
}

#[async_trait]
impl RecordsLedger for ContractBinding {
    async fn add_record(
        &self,
        subject: &SubjectId,
        name: &NonEmptyText,
        diagnosis: &NonEmptyText,
        treatment: &NonEmptyText,
    ) -> LedgerResult<TransactionHandle> {
        let data = abi::encode_call(
            self.selectors.add_record,
            &[
                Token::Uint(abi::subject_to_uint(subject)?),
                Token::String(name.as_str()),
                Token::String(diagnosis.as_str()),
                Token::String(treatment.as_str()),
            ],
        );
        self.submit(data).await
    }

    async fn authorize_provider(&self, provider: &Address) -> LedgerResult<TransactionHandle> {
        let data = abi::encode_call(
            self.selectors.authorize_provider,
            &[Token::Address(*provider)],
        );
        self.submit(data).await
    }

    async fn get_owner(&self) -> LedgerResult<Address> {
        let data = abi::encode_call(self.selectors.get_owner, &[]);
        abi::decode_address(&self.read(data).await?)
    }

    async fn get_patient_records(&self, subject: &SubjectId) -> LedgerResult<Vec<Record>> {
        let data = abi::encode_call(
            self.selectors.get_patient_records,
            &[Token::Uint(abi::subject_to_uint(subject)?)],
        );
        abi::decode_records(&self.read(data).await?)
    }
}
