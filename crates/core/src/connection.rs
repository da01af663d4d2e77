//! One-time connection to the wallet agent.
//!
//! A successful connection yields the account identity, its [`Role`] and a bound
//! [`RecordsLedger`] signing as that account. Any failure leaves nothing set.

use crate::config::CoreConfig;
use crate::error::ConnectionError;
use crate::ledger::{ContractBinding, RecordsLedger};
use crate::wallet::WalletProvider;
use hcr_types::Address;
use serde::Serialize;
use std::sync::Arc;

/// Privilege of the connected account, derived once at connection time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The account the service reports as its owner.
    Owner,
    Standard,
}

impl Role {
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Owner)
    }
}

/// An established session with the records service.
#[derive(Clone)]
pub struct Connection {
    identity: Address,
    role: Role,
    ledger: Arc<dyn RecordsLedger>,
}

impl Connection {
    /// Look up the service owner and derive the role of `identity`.
    ///
    /// Address comparison is byte-wise, so it ignores the hex letter case the agent and
    /// the service happen to use.
    pub async fn establish(
        identity: Address,
        ledger: Arc<dyn RecordsLedger>,
    ) -> Result<Self, ConnectionError> {
        let owner = ledger
            .get_owner()
            .await
            .map_err(ConnectionError::OwnerLookup)?;

        let role = if owner == identity {
            Role::Owner
        } else {
            Role::Standard
        };

        Ok(Self {
            identity,
            role,
            ledger,
        })
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn ledger(&self) -> Arc<dyn RecordsLedger> {
        self.ledger.clone()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("identity", &self.identity)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Connects to the injected wallet agent.
#[derive(Clone)]
pub struct ConnectionManager {
    cfg: Arc<CoreConfig>,
    agent: Option<Arc<dyn WalletProvider>>,
}

impl ConnectionManager {
    /// `agent` of `None` models a missing wallet capability.
    pub fn new(cfg: Arc<CoreConfig>, agent: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { cfg, agent }
    }

    /// Request account access and bind the service for the first account.
    pub async fn connect(&self) -> Result<Connection, ConnectionError> {
        let agent = self
            .agent
            .clone()
            .ok_or(ConnectionError::AgentUnavailable)?;

        let accounts = agent
            .request_accounts()
            .await
            .map_err(ConnectionError::AccessDenied)?;
        let identity = accounts
            .first()
            .copied()
            .ok_or(ConnectionError::NoAccounts)?;

        let binding = ContractBinding::new(&self.cfg, agent, identity);
        tracing::debug!(
            "bound records service {} for account {}",
            binding.address(),
            identity
        );

        Connection::establish(identity, Arc::new(binding)).await
    }
}
