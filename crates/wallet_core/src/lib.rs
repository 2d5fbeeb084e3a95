//! Wallet connection lifecycle for a client application: availability
//! detection, connect/disconnect, active-network tracking, and transaction
//! signing mediation, reconciled against the wallet on a fixed cadence.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{RequiredNetwork, TransactionEnvelope},
    protocol::ConnectOutcome,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(10);
const GENERIC_CONNECT_FAILURE: &str = "failed to connect";

/// Capability set of the browser wallet extension the session depends on.
///
/// `address` and `network` are defined only while the wallet reports itself
/// connected; callers must check `is_connected` first.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    async fn is_installed(&self) -> Result<bool>;
    async fn is_connected(&self) -> Result<bool>;
    async fn address(&self) -> Result<String>;
    async fn network(&self) -> Result<String>;
    async fn set_network(&self, passphrase: &str) -> Result<()>;
    async fn connect(&self) -> Result<ConnectOutcome>;
    async fn disconnect(&self) -> Result<()>;
    async fn sign_transaction(&self, envelope: &TransactionEnvelope)
        -> Result<TransactionEnvelope>;
}

pub struct MissingWalletGateway;

#[async_trait]
impl WalletGateway for MissingWalletGateway {
    async fn is_installed(&self) -> Result<bool> {
        Err(anyhow!("wallet gateway is unavailable"))
    }

    async fn is_connected(&self) -> Result<bool> {
        Err(anyhow!("wallet gateway is unavailable"))
    }

    async fn address(&self) -> Result<String> {
        Err(anyhow!("wallet gateway is unavailable"))
    }

    async fn network(&self) -> Result<String> {
        Err(anyhow!("wallet gateway is unavailable"))
    }

    async fn set_network(&self, _passphrase: &str) -> Result<()> {
        Err(anyhow!("wallet gateway is unavailable"))
    }

    async fn connect(&self) -> Result<ConnectOutcome> {
        Err(anyhow!("wallet gateway is unavailable"))
    }

    async fn disconnect(&self) -> Result<()> {
        Err(anyhow!("wallet gateway is unavailable"))
    }

    async fn sign_transaction(
        &self,
        _envelope: &TransactionEnvelope,
    ) -> Result<TransactionEnvelope> {
        Err(anyhow!("wallet gateway is unavailable"))
    }
}

/// Observable state of the wallet connection, read by consumers on every
/// render and broadcast on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub address: Option<String>,
    pub is_connected: bool,
    pub is_connecting: bool,
    pub is_disconnecting: bool,
    pub error: Option<String>,
    pub is_wallet_available: bool,
    pub network: Option<String>,
    pub is_wrong_network: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignRequestError {
    #[error("wallet is not connected")]
    NotConnected,
    #[error("wallet is on the wrong network; switch to {label}")]
    WrongNetwork { label: String },
    #[error("wallet rejected the signing request: {0}")]
    Gateway(String),
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub reconcile_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
        }
    }
}

struct GatewayView {
    is_installed: bool,
    is_connected: bool,
    address: Option<String>,
    network: Option<String>,
}

pub struct WalletSession {
    gateway: Arc<dyn WalletGateway>,
    required: RequiredNetwork,
    inner: Mutex<ConnectionSnapshot>,
    changes: broadcast::Sender<ConnectionSnapshot>,
    reconcile_task: Mutex<Option<JoinHandle<()>>>,
}

impl WalletSession {
    /// Builds a session without the reconciliation timer. Callers drive
    /// `refresh` themselves; `start` is the usual entry point.
    pub fn new(gateway: Arc<dyn WalletGateway>, required: RequiredNetwork) -> Arc<Self> {
        let (changes, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Arc::new(Self {
            gateway,
            required,
            inner: Mutex::new(ConnectionSnapshot::default()),
            changes,
            reconcile_task: Mutex::new(None),
        })
    }

    /// Builds a session, refreshes once from the wallet, then reconciles on a
    /// fixed cadence until `shutdown`.
    pub async fn start(
        gateway: Arc<dyn WalletGateway>,
        required: RequiredNetwork,
        options: SessionOptions,
    ) -> Arc<Self> {
        let session = Self::new(gateway, required);
        session.refresh().await;

        let task = {
            let session = Arc::clone(&session);
            let interval = options.reconcile_interval;
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(interval).await;
                    session.refresh().await;
                }
            })
        };
        *session.reconcile_task.lock().await = Some(task);

        session
    }

    /// Stops the reconciliation timer. In-flight operations are not
    /// cancelled; whatever they resolve to still lands in the snapshot.
    pub async fn shutdown(&self) {
        if let Some(task) = self.reconcile_task.lock().await.take() {
            task.abort();
        }
    }

    pub async fn snapshot(&self) -> ConnectionSnapshot {
        self.inner.lock().await.clone()
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<ConnectionSnapshot> {
        self.changes.subscribe()
    }

    pub fn required_network(&self) -> &RequiredNetwork {
        &self.required
    }

    /// Re-reads ground truth from the wallet and replaces the connection
    /// fields of the snapshot. On a gateway failure nothing is replaced;
    /// only `error` is set. The pending flags are never touched here.
    pub async fn refresh(&self) {
        match self.query_gateway_state().await {
            Ok(view) => {
                let is_wrong_network = view.is_connected
                    && view
                        .network
                        .as_deref()
                        .is_some_and(|network| !self.required.matches(network));
                self.mutate(|snapshot| {
                    snapshot.is_wallet_available = view.is_installed;
                    snapshot.is_connected = view.is_connected;
                    snapshot.address = view.address;
                    snapshot.network = view.network;
                    snapshot.is_wrong_network = is_wrong_network;
                    snapshot.error = None;
                })
                .await;
            }
            Err(err) => {
                warn!("wallet: refresh failed: {err}");
                let message = err.to_string();
                self.mutate(|snapshot| snapshot.error = Some(message)).await;
            }
        }
    }

    pub async fn connect(&self) {
        self.mutate(|snapshot| {
            snapshot.is_connecting = true;
            snapshot.error = None;
        })
        .await;

        match self.gateway.connect().await {
            Ok(outcome)
                if outcome.success
                    && outcome
                        .address
                        .as_deref()
                        .is_some_and(|address| !address.is_empty()) =>
            {
                let address = outcome.address.unwrap_or_default();
                // The final snapshot comes from a fresh gateway read, not
                // from the connect result.
                self.refresh().await;
                self.mutate(|snapshot| snapshot.is_connecting = false).await;
                info!(address = %address, "wallet: connect granted");
            }
            Ok(outcome) => {
                let reason = outcome
                    .error
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| GENERIC_CONNECT_FAILURE.to_string());
                warn!("wallet: connect refused: {reason}");
                self.mutate(|snapshot| {
                    snapshot.is_connecting = false;
                    snapshot.error = Some(reason);
                })
                .await;
            }
            Err(err) => {
                let message = err.to_string();
                warn!("wallet: connect failed: {message}");
                self.mutate(|snapshot| {
                    snapshot.is_connecting = false;
                    snapshot.error = Some(message);
                })
                .await;
            }
        }
    }

    pub async fn disconnect(&self) {
        self.mutate(|snapshot| {
            snapshot.is_disconnecting = true;
            snapshot.error = None;
        })
        .await;

        match self.gateway.disconnect().await {
            Ok(()) => {
                self.mutate(|snapshot| {
                    // Availability is an environment fact, not a connection
                    // fact; it survives the reset.
                    let is_wallet_available = snapshot.is_wallet_available;
                    *snapshot = ConnectionSnapshot::default();
                    snapshot.is_wallet_available = is_wallet_available;
                })
                .await;
                info!("wallet: disconnected");
            }
            Err(err) => {
                let message = err.to_string();
                warn!("wallet: disconnect failed: {message}");
                self.mutate(|snapshot| {
                    snapshot.is_disconnecting = false;
                    snapshot.error = Some(message);
                })
                .await;
            }
        }
    }

    pub async fn switch_network(&self) {
        self.mutate(|snapshot| snapshot.error = None).await;

        match self.gateway.set_network(&self.required.passphrase).await {
            Ok(()) => {
                info!(network = %self.required.label, "wallet: network switch accepted");
                // Never assume the switch landed on the expected network;
                // re-derive everything from ground truth.
                self.refresh().await;
            }
            Err(err) => {
                let message = err.to_string();
                warn!("wallet: network switch failed: {message}");
                self.mutate(|snapshot| snapshot.error = Some(message)).await;
            }
        }
    }

    /// Signs through the wallet after checking the connection preconditions.
    /// A gateway failure is recorded on the snapshot and also returned:
    /// callers need a definitive answer before proceeding with whatever
    /// depends on the signature.
    pub async fn sign_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> std::result::Result<TransactionEnvelope, SignRequestError> {
        {
            let snapshot = self.inner.lock().await;
            if !snapshot.is_connected {
                return Err(SignRequestError::NotConnected);
            }
            if snapshot.is_wrong_network {
                return Err(SignRequestError::WrongNetwork {
                    label: self.required.label.clone(),
                });
            }
        }

        match self.gateway.sign_transaction(envelope).await {
            Ok(signed) => Ok(signed),
            Err(err) => {
                let message = err.to_string();
                warn!("wallet: signing failed: {message}");
                self.mutate(|snapshot| snapshot.error = Some(message.clone()))
                    .await;
                Err(SignRequestError::Gateway(message))
            }
        }
    }

    // All gateway reads happen without the snapshot lock held; the caller
    // then applies a single locked write. Interleaved refreshes resolve by
    // last-write-wins.
    async fn query_gateway_state(&self) -> Result<GatewayView> {
        let is_installed = self.gateway.is_installed().await?;
        let is_connected = self.gateway.is_connected().await?;

        if !is_connected {
            return Ok(GatewayView {
                is_installed,
                is_connected,
                address: None,
                network: None,
            });
        }

        let address = self.gateway.address().await?;
        let network = self.gateway.network().await?;
        Ok(GatewayView {
            is_installed,
            is_connected,
            address: Some(address),
            network: Some(network),
        })
    }

    async fn mutate(&self, apply: impl FnOnce(&mut ConnectionSnapshot)) {
        let next = {
            let mut guard = self.inner.lock().await;
            apply(&mut guard);
            guard.clone()
        };
        let _ = self.changes.send(next);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
