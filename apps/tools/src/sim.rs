use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{domain::TransactionEnvelope, protocol::ConnectOutcome};
use tokio::sync::Mutex;
use wallet_core::WalletGateway;

const SIM_ADDRESS: &str = "GSIMULATEDWALLETACCOUNT";

pub struct SimulatedWalletOptions {
    pub installed: bool,
    pub network: String,
    pub refuse_connect: bool,
    pub refuse_sign: bool,
}

/// In-process wallet extension stand-in. Lets operators reproduce reported
/// connection states without a browser present.
pub struct SimulatedWallet {
    installed: bool,
    refuse_connect: bool,
    refuse_sign: bool,
    state: Mutex<SimState>,
}

struct SimState {
    connected: bool,
    network: String,
}

impl SimulatedWallet {
    pub fn new(options: SimulatedWalletOptions) -> Self {
        Self {
            installed: options.installed,
            refuse_connect: options.refuse_connect,
            refuse_sign: options.refuse_sign,
            state: Mutex::new(SimState {
                connected: false,
                network: options.network,
            }),
        }
    }

    /// Out-of-band network change, as if the user flipped it inside the
    /// wallet itself.
    pub async fn set_active_network(&self, network: &str) {
        self.state.lock().await.network = network.to_string();
    }
}

#[async_trait]
impl WalletGateway for SimulatedWallet {
    async fn is_installed(&self) -> Result<bool> {
        Ok(self.installed)
    }

    async fn is_connected(&self) -> Result<bool> {
        if !self.installed {
            return Ok(false);
        }
        Ok(self.state.lock().await.connected)
    }

    async fn address(&self) -> Result<String> {
        let state = self.state.lock().await;
        if !state.connected {
            return Err(anyhow!("wallet is not connected"));
        }
        Ok(SIM_ADDRESS.to_string())
    }

    async fn network(&self) -> Result<String> {
        let state = self.state.lock().await;
        if !state.connected {
            return Err(anyhow!("wallet is not connected"));
        }
        Ok(state.network.clone())
    }

    async fn set_network(&self, passphrase: &str) -> Result<()> {
        self.state.lock().await.network = passphrase.to_string();
        Ok(())
    }

    async fn connect(&self) -> Result<ConnectOutcome> {
        if !self.installed {
            return Err(anyhow!("no wallet extension present"));
        }
        if self.refuse_connect {
            return Ok(ConnectOutcome::refused("User rejected"));
        }
        self.state.lock().await.connected = true;
        Ok(ConnectOutcome::granted(SIM_ADDRESS))
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.lock().await.connected = false;
        Ok(())
    }

    async fn sign_transaction(&self, envelope: &TransactionEnvelope) -> Result<TransactionEnvelope> {
        if self.refuse_sign {
            return Err(anyhow!("user declined the signing request"));
        }
        let state = self.state.lock().await;
        if !state.connected {
            return Err(anyhow!("wallet is not connected"));
        }
        Ok(TransactionEnvelope(format!(
            "{}+sim-signature:{}",
            envelope.0, SIM_ADDRESS
        )))
    }
}
