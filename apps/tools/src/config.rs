use std::{fs, time::Duration};

use shared::domain::TEST_NETWORK_PASSPHRASE;

#[derive(Debug)]
pub struct Settings {
    pub network_label: String,
    pub network_passphrase: String,
    pub reconcile_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network_label: "Testnet".into(),
            network_passphrase: TEST_NETWORK_PASSPHRASE.into(),
            reconcile_interval_secs: 10,
        }
    }
}

impl Settings {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs.max(1))
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("wallet.toml") {
        if let Ok(file_cfg) = raw.parse::<toml::Value>() {
            if let Some(v) = file_cfg.get("network_label").and_then(|v| v.as_str()) {
                settings.network_label = v.to_string();
            }
            if let Some(v) = file_cfg.get("network_passphrase").and_then(|v| v.as_str()) {
                settings.network_passphrase = v.to_string();
            }
            if let Some(v) = file_cfg
                .get("reconcile_interval_secs")
                .and_then(|v| v.as_integer())
            {
                if v > 0 {
                    settings.reconcile_interval_secs = v as u64;
                }
            }
        }
    }

    if let Ok(v) = std::env::var("WALLET_NETWORK_LABEL") {
        settings.network_label = v;
    }
    if let Ok(v) = std::env::var("WALLET_NETWORK_PASSPHRASE") {
        settings.network_passphrase = v;
    }
    if let Ok(v) = std::env::var("WALLET_RECONCILE_INTERVAL_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.reconcile_interval_secs = parsed;
        }
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_test_network() {
        let settings = Settings::default();
        assert_eq!(settings.network_label, "Testnet");
        assert_eq!(settings.network_passphrase, TEST_NETWORK_PASSPHRASE);
        assert_eq!(settings.reconcile_interval_secs, 10);
    }

    #[test]
    fn reconcile_interval_has_a_floor() {
        let settings = Settings {
            reconcile_interval_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.reconcile_interval(), Duration::from_secs(1));
    }
}
