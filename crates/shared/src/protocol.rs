use serde::{Deserialize, Serialize};

/// Result payload of a wallet connect request.
///
/// `success = true` with an empty or missing address is treated by callers as
/// a failed connect: the wallet approved the prompt but never exposed an
/// account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectOutcome {
    pub fn granted(address: impl Into<String>) -> Self {
        Self {
            success: true,
            address: Some(address.into()),
            error: None,
        }
    }

    pub fn refused(error: impl Into<String>) -> Self {
        Self {
            success: false,
            address: None,
            error: Some(error.into()),
        }
    }
}
