use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::{
    RequiredNetwork, TransactionEnvelope, PUBLIC_NETWORK_PASSPHRASE, TEST_NETWORK_PASSPHRASE,
};
use tracing::info;
use wallet_core::{ConnectionSnapshot, SessionOptions, WalletSession};

mod config;
mod sim;

use config::load_settings;
use sim::{SimulatedWallet, SimulatedWalletOptions};

#[derive(Parser, Debug)]
struct Cli {
    /// Network the simulated wallet starts on; defaults to the required one.
    #[arg(long)]
    wallet_network: Option<String>,
    /// Pretend no wallet extension is present.
    #[arg(long)]
    not_installed: bool,
    /// Make the simulated wallet refuse the connect prompt.
    #[arg(long)]
    refuse_connect: bool,
    /// Make the simulated wallet decline signing requests.
    #[arg(long)]
    refuse_sign: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive a full session lifecycle and print each snapshot.
    Lifecycle,
    /// Run a short-interval session while the wallet drifts to another
    /// network out-of-band, printing every broadcast snapshot.
    Watch {
        #[arg(long, default_value_t = 8)]
        changes: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let settings = load_settings();
    let required = RequiredNetwork::new(&settings.network_label, &settings.network_passphrase);

    let wallet = Arc::new(SimulatedWallet::new(SimulatedWalletOptions {
        installed: !cli.not_installed,
        network: cli
            .wallet_network
            .clone()
            .unwrap_or_else(|| required.passphrase.clone()),
        refuse_connect: cli.refuse_connect,
        refuse_sign: cli.refuse_sign,
    }));

    match cli.command {
        Command::Lifecycle => {
            run_lifecycle(wallet, required, settings.reconcile_interval()).await
        }
        Command::Watch { changes } => run_watch(wallet, required, changes).await,
    }
}

async fn run_lifecycle(
    wallet: Arc<SimulatedWallet>,
    required: RequiredNetwork,
    reconcile_interval: Duration,
) -> Result<()> {
    let session = WalletSession::start(
        wallet,
        required,
        SessionOptions { reconcile_interval },
    )
    .await;

    print_snapshot("startup", &session.snapshot().await)?;

    session.connect().await;
    print_snapshot("after connect", &session.snapshot().await)?;

    if session.snapshot().await.is_wrong_network {
        session.switch_network().await;
        print_snapshot("after switch_network", &session.snapshot().await)?;
    }

    match session
        .sign_transaction(&TransactionEnvelope("demo-envelope".to_string()))
        .await
    {
        Ok(signed) => println!("signed envelope: {}", signed.0),
        Err(err) => println!("signing rejected: {err}"),
    }

    session.disconnect().await;
    print_snapshot("after disconnect", &session.snapshot().await)?;

    session.shutdown().await;
    Ok(())
}

async fn run_watch(
    wallet: Arc<SimulatedWallet>,
    required: RequiredNetwork,
    changes_to_print: u32,
) -> Result<()> {
    let gateway: Arc<dyn wallet_core::WalletGateway> = wallet.clone();
    let session = WalletSession::start(
        gateway,
        required.clone(),
        SessionOptions {
            reconcile_interval: Duration::from_secs(1),
        },
    )
    .await;
    let mut changes = session.subscribe_changes();

    session.connect().await;

    let drift = {
        let wallet = Arc::clone(&wallet);
        let network = other_network(&required).to_string();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            info!(network = %network, "sim: wallet switched network out-of-band");
            wallet.set_active_network(&network).await;
        })
    };

    for _ in 0..changes_to_print {
        match changes.recv().await {
            Ok(snapshot) => print_snapshot("change", &snapshot)?,
            Err(_) => break,
        }
    }

    drift.abort();
    session.shutdown().await;
    Ok(())
}

fn other_network(required: &RequiredNetwork) -> &'static str {
    if required.matches(TEST_NETWORK_PASSPHRASE) {
        PUBLIC_NETWORK_PASSPHRASE
    } else {
        TEST_NETWORK_PASSPHRASE
    }
}

fn print_snapshot(label: &str, snapshot: &ConnectionSnapshot) -> Result<()> {
    println!("{label}: {}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}
