use serde::{Deserialize, Serialize};

pub const PUBLIC_NETWORK_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
pub const TEST_NETWORK_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// The network the application requires the wallet to be on: a human-readable
/// label for user-facing messages and the canonical passphrase compared
/// against whatever the wallet reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredNetwork {
    pub label: String,
    pub passphrase: String,
}

impl RequiredNetwork {
    pub fn new(label: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            passphrase: passphrase.into(),
        }
    }

    pub fn public() -> Self {
        Self::new("Mainnet", PUBLIC_NETWORK_PASSPHRASE)
    }

    pub fn testnet() -> Self {
        Self::new("Testnet", TEST_NETWORK_PASSPHRASE)
    }

    /// Passphrases are opaque identifiers: compared byte-for-byte, never parsed.
    pub fn matches(&self, passphrase: &str) -> bool {
        self.passphrase == passphrase
    }
}

/// Opaque transaction payload. The session hands it to the wallet verbatim and
/// returns whatever the wallet produced, without inspecting either side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionEnvelope(pub String);
