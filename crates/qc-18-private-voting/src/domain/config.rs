//! Election configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use qc_18_private_voting::domain::ElectionConfig;
//!
//! let config = ElectionConfig::from_env();
//! config.validate().expect("Valid config");
//! ```

use super::errors::ElectionError;
use super::value_objects::{Address, U256};
use serde::{Deserialize, Serialize};
use std::env;

/// One fee unit: 0.005 ether, in wei.
pub const DEFAULT_FEE_WEI: u64 = 5_000_000_000_000_000;

/// Verifier precompile address.
pub const DEFAULT_VERIFIER: Address = Address::new([
    168, 178, 124, 96, 75, 85, 83, 81, 210, 209, 180, 146, 95, 104, 203, 67, 41, 196, 176, 242,
]);

/// Election-wide configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Bond paid at deployment and at each confirmation, returned on refund.
    pub fee: U256,
    /// Identity of the proof verifier.
    pub verifier: Address,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            fee: U256::from(DEFAULT_FEE_WEI),
            verifier: DEFAULT_VERIFIER,
        }
    }
}

impl ElectionConfig {
    /// Create a new configuration with validation
    pub fn new(fee: U256, verifier: Address) -> Result<Self, ElectionError> {
        let config = Self { fee, verifier };
        config.validate()?;
        Ok(config)
    }

    /// Reject a zero fee or a zero verifier identity.
    pub fn validate(&self) -> Result<(), ElectionError> {
        if self.fee.is_zero() {
            return Err(ElectionError::InvalidConfig(
                "fee cannot be 0".to_string(),
            ));
        }

        if self.verifier.is_zero() {
            return Err(ElectionError::InvalidConfig(
                "verifier address cannot be zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_ELECTION_FEE_WEI`: Fee unit in wei, decimal (default: 0.005 ether)
    /// - `QC_ELECTION_VERIFIER`: Verifier address in hex (default: precompile address)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            fee: env::var("QC_ELECTION_FEE_WEI")
                .ok()
                .and_then(|v| U256::from_dec_str(v.trim()).ok())
                .unwrap_or(defaults.fee),

            verifier: env::var("QC_ELECTION_VERIFIER")
                .ok()
                .and_then(|v| Address::from_hex(v.trim()).ok())
                .unwrap_or(defaults.verifier),
        }
    }

    /// Load and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ElectionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ElectionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ElectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fee, U256::from(5_000_000_000_000_000u64));
    }

    #[test]
    fn test_zero_fee_rejected() {
        let result = ElectionConfig::new(U256::zero(), DEFAULT_VERIFIER);
        assert!(matches!(result, Err(ElectionError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_verifier_rejected() {
        let result = ElectionConfig::new(U256::one(), Address::ZERO);
        assert!(matches!(result, Err(ElectionError::InvalidConfig(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ElectionConfig::new(U256::from(42u64), Address::new([3u8; 20])).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let loaded = ElectionConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    // Single test so no other test observes the variables mid-flight.
    #[test]
    fn test_from_env_parses_and_falls_back() {
        env::set_var("QC_ELECTION_FEE_WEI", " 1000 ");
        env::set_var("QC_ELECTION_VERIFIER", "0x0303030303030303030303030303030303030303");
        let config = ElectionConfig::from_env();
        assert_eq!(config.fee, U256::from(1000u64));
        assert_eq!(config.verifier, Address::new([3u8; 20]));

        env::set_var("QC_ELECTION_FEE_WEI", "not-a-number");
        env::set_var("QC_ELECTION_VERIFIER", "0x1234");
        assert_eq!(ElectionConfig::from_env(), ElectionConfig::default());

        env::remove_var("QC_ELECTION_FEE_WEI");
        env::remove_var("QC_ELECTION_VERIFIER");
        let config = ElectionConfig::from_env();
        assert_eq!(config, ElectionConfig::default());
        assert_eq!(config.verifier, DEFAULT_VERIFIER);
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(ElectionConfig::from_json("{\"fee\": 1}").is_err());
    }
}
