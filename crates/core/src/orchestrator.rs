//! Operation Orchestrator.
//!
//! Runs each user-triggered action through validation, submission and (for writes)
//! confirmation, then updates the [`Session`] or reports the failure. Every failure is
//! turned into a user-visible [`Notice`] plus a log entry here; nothing escapes as a
//! panic and the session stays usable after any single failure.
//!
//! Actions are independent: there is no mutual exclusion, so two concurrent adds both
//! proceed and the record collection reflects whichever refresh lands last.

use crate::config::CoreConfig;
use crate::connection::{Connection, ConnectionManager};
use crate::constants::MSG_RECORD_ADDED;
use crate::error::{ActionError, ConnectionError, ValidationError};
use crate::ledger::RecordsLedger;
use crate::session::{ActionKind, ActionPhase, Notice, RecordCollection, Session};
use crate::validation::{validate_add_record, validate_authorize, validate_fetch};
use crate::wallet::TransactionReceipt;
use hcr_types::{Address, SubjectId};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// What a successful action produced.
#[derive(Clone, Debug)]
pub enum ActionOutcome {
    Fetched(RecordCollection),
    RecordAdded(TransactionReceipt),
    ProviderAuthorized {
        provider: Address,
        receipt: TransactionReceipt,
    },
}

/// A spawned action with a bound lifetime.
///
/// Dropping the handle detaches the task; [`ActionHandle::abort`] cancels it.
pub struct ActionHandle {
    kind: ActionKind,
    task: JoinHandle<Result<ActionOutcome, ActionError>>,
}

impl ActionHandle {
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the action at its next suspension point. Its in-flight entry is removed.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the action to end. `None` if it was aborted first.
    pub async fn join(self) -> Option<Result<ActionOutcome, ActionError>> {
        match self.task.await {
            Ok(result) => Some(result),
            Err(e) if e.is_cancelled() => None,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

/// Tracks one action in the session and publishes its outcome.
///
/// If the action is dropped before [`ActionScope::finish`], its in-flight entry is
/// still removed.
struct ActionScope {
    session: Arc<Session>,
    id: Uuid,
    kind: ActionKind,
    done: bool,
}

impl ActionScope {
    fn enter(&self, phase: ActionPhase) {
        tracing::debug!(action = %self.id, "{} -> {:?}", self.kind, phase);
        self.session.set_phase(self.id, phase);
    }

    fn finish<T>(
        mut self,
        result: Result<T, ActionError>,
        on_success: impl FnOnce(&T) -> Option<Notice>,
    ) -> Result<T, ActionError> {
        self.done = true;

        let notice = match &result {
            Ok(value) => {
                tracing::info!(action = %self.id, "{} succeeded", self.kind);
                on_success(value)
            }
            Err(err) if err.is_validation() => {
                tracing::warn!(action = %self.id, "{} rejected: {}", self.kind, err);
                Some(Notice::error(err.user_message()))
            }
            Err(err) => {
                tracing::error!(action = %self.id, "{}", err);
                Some(Notice::error(err.user_message()))
            }
        };
        let phase = if result.is_ok() {
            ActionPhase::Succeeded
        } else {
            ActionPhase::Failed
        };
        tracing::debug!(action = %self.id, "{} -> {:?}", self.kind, phase);

        self.session.finish_action(self.id, notice);
        result
    }
}

impl Drop for ActionScope {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!(action = %self.id, "{} cancelled", self.kind);
            self.session.finish_action(self.id, None);
        }
    }
}

/// Owns the session and the bound service for the lifetime of the process.
#[derive(Clone)]
pub struct Orchestrator {
    cfg: Arc<CoreConfig>,
    session: Arc<Session>,
    ledger: Arc<OnceLock<Arc<dyn RecordsLedger>>>,
    attempted: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(cfg: Arc<CoreConfig>, session: Arc<Session>) -> Self {
        Self {
            cfg,
            session,
            ledger: Arc::new(OnceLock::new()),
            attempted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Make the single connection attempt allowed per session.
    pub async fn connect(
        &self,
        manager: &ConnectionManager,
    ) -> Result<Connection, ConnectionError> {
        self.establish(manager.connect()).await
    }

    async fn establish<F>(&self, attempt: F) -> Result<Connection, ConnectionError>
    where
        F: Future<Output = Result<Connection, ConnectionError>>,
    {
        if self.attempted.swap(true, Ordering::SeqCst) {
            return Err(ConnectionError::AlreadyAttempted);
        }

        match attempt.await {
            Ok(connection) => {
                if self.ledger.set(connection.ledger()).is_err() {
                    return Err(ConnectionError::AlreadyAttempted);
                }
                self.session
                    .set_connection(connection.identity(), connection.role());
                tracing::info!(
                    "connected as {} ({:?})",
                    connection.identity(),
                    connection.role()
                );
                Ok(connection)
            }
            Err(e) => {
                tracing::error!("wallet connection failed: {}", e);
                Err(e)
            }
        }
    }

    fn ledger(&self) -> Result<Arc<dyn RecordsLedger>, ValidationError> {
        self.ledger
            .get()
            .cloned()
            .ok_or(ValidationError::NotConnected)
    }

    fn begin(&self, kind: ActionKind) -> ActionScope {
        let id = self.session.begin_action(kind);
        tracing::debug!(action = %id, "{} started", kind);
        ActionScope {
            session: self.session.clone(),
            id,
            kind,
            done: false,
        }
    }

    /// Fetch records for the subject currently in the input.
    pub async fn fetch_records(&self) -> Result<RecordCollection, ActionError> {
        let scope = self.begin(ActionKind::Fetch);
        let result = self.fetch_from_input(&scope).await;
        scope.finish(result, |_| None)
    }

    async fn fetch_from_input(&self, scope: &ActionScope) -> Result<RecordCollection, ActionError> {
        scope.enter(ActionPhase::Validating);
        let subject = validate_fetch(&self.session.snapshot())?;
        self.load_records(scope, subject).await
    }

    /// Fetch for a subject that was already validated by another action.
    async fn refresh(&self, subject: SubjectId) -> Result<RecordCollection, ActionError> {
        let scope = self.begin(ActionKind::Fetch);
        let result = self.load_records(&scope, subject).await;
        scope.finish(result, |_| None)
    }

    async fn load_records(
        &self,
        scope: &ActionScope,
        subject: SubjectId,
    ) -> Result<RecordCollection, ActionError> {
        let ledger = self.ledger()?;

        scope.enter(ActionPhase::Submitting);
        let records = ledger
            .get_patient_records(&subject)
            .await
            .map_err(|source| ActionError::RemoteCall {
                kind: scope.kind,
                source,
            })?;

        tracing::debug!("fetched {} records for subject {}", records.len(), subject);
        self.session.replace_records(subject.clone(), records.clone());
        Ok(RecordCollection {
            subject: Some(subject),
            records,
        })
    }

    /// Append a record, wait for confirmation, then refresh the same subject once.
    ///
    /// A failed refresh is reported on its own and does not fail the add.
    pub async fn add_record(&self) -> Result<TransactionReceipt, ActionError> {
        let scope = self.begin(ActionKind::AddRecord);
        let result = self.submit_record(&scope).await;
        let (subject, receipt) =
            scope.finish(result, |_| Some(Notice::info(MSG_RECORD_ADDED)))?;

        if let Err(e) = self.refresh(subject).await {
            tracing::debug!("refresh after add failed: {}", e);
        }
        Ok(receipt)
    }

    async fn submit_record(
        &self,
        scope: &ActionScope,
    ) -> Result<(SubjectId, TransactionReceipt), ActionError> {
        scope.enter(ActionPhase::Validating);
        let input = validate_add_record(&self.session.snapshot())?;
        let ledger = self.ledger()?;

        scope.enter(ActionPhase::Submitting);
        let handle = ledger
            .add_record(
                &input.subject,
                self.cfg.subject_name(),
                &input.diagnosis,
                &input.treatment,
            )
            .await
            .map_err(|source| ActionError::RemoteCall {
                kind: scope.kind,
                source,
            })?;

        scope.enter(ActionPhase::AwaitingConfirmation);
        let receipt = handle
            .wait()
            .await
            .map_err(|source| ActionError::Confirmation {
                kind: scope.kind,
                source,
            })?;

        Ok((input.subject, receipt))
    }

    /// Grant record-writing rights to the address in the provider input. Owner only.
    pub async fn authorize_provider(&self) -> Result<(Address, TransactionReceipt), ActionError> {
        let scope = self.begin(ActionKind::AuthorizeProvider);
        let result = self.submit_authorization(&scope).await;
        scope.finish(result, |(provider, _)| {
            Some(Notice::info(format!(
                "Provider {provider} authorized successfully"
            )))
        })
    }

    async fn submit_authorization(
        &self,
        scope: &ActionScope,
    ) -> Result<(Address, TransactionReceipt), ActionError> {
        scope.enter(ActionPhase::Validating);
        let provider = validate_authorize(&self.session.snapshot())?;
        let ledger = self.ledger()?;

        scope.enter(ActionPhase::Submitting);
        let handle = ledger
            .authorize_provider(&provider)
            .await
            .map_err(|source| ActionError::RemoteCall {
                kind: scope.kind,
                source,
            })?;

        scope.enter(ActionPhase::AwaitingConfirmation);
        let receipt = handle
            .wait()
            .await
            .map_err(|source| ActionError::Confirmation {
                kind: scope.kind,
                source,
            })?;

        Ok((provider, receipt))
    }

    /// Run an action as an independent task.
    pub fn spawn(&self, kind: ActionKind) -> ActionHandle {
        let this = self.clone();
        let task = tokio::spawn(async move {
            match kind {
                ActionKind::Fetch => this.fetch_records().await.map(ActionOutcome::Fetched),
                ActionKind::AddRecord => this.add_record().await.map(ActionOutcome::RecordAdded),
                ActionKind::AuthorizeProvider => this
                    .authorize_provider()
                    .await
                    .map(|(provider, receipt)| ActionOutcome::ProviderAuthorized {
                        provider,
                        receipt,
                    }),
            }
        });
        ActionHandle { kind, task }
    }
}
