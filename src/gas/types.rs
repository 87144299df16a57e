use serde::{Deserialize, Serialize};

/// Latest fee quote as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPriceInfo {
    pub fee_wei: String,
    /// Two-decimal fixed point.
    pub fee_gwei: String,
    /// Empty until the first successful fetch.
    pub last_updated: String,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl GasPriceInfo {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for GasPriceInfo {
    fn default() -> Self {
        Self {
            fee_wei: "0".to_string(),
            fee_gwei: "0".to_string(),
            last_updated: String::new(),
            is_loading: false,
            error: None,
        }
    }
}
