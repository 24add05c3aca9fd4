//! Network definitions for the chains the terminal accepts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal shown when the wallet sits on an unsupported chain
pub const CHANGE_NETWORK_MESSAGE: &str =
    "Change network to the Holesky Testnet or Ethereum Mainnet";

/// Chains with a deployed Rose contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet
    Mainnet,
    /// Holesky public testnet
    Holesky,
}

impl Network {
    /// EIP-155 chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Holesky => 17000,
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Network::Mainnet),
            17000 => Some(Network::Holesky),
            _ => None,
        }
    }

    /// Get the full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Network::Mainnet => "Ethereum Mainnet",
            Network::Holesky => "Holesky Testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "ethereum" | "1" => Ok(Network::Mainnet),
            "holesky" | "17000" => Ok(Network::Holesky),
            _ => Err(format!("Unknown network: {}", s)),
        }
    }
}

/// The pair of chain ids dispatch is allowed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedNetworks {
    pub primary: u64,
    pub test_secondary: u64,
}

impl SupportedNetworks {
    pub fn new(primary: u64, test_secondary: u64) -> Self {
        Self {
            primary,
            test_secondary,
        }
    }

    pub fn allows(&self, chain_id: u64) -> bool {
        chain_id == self.primary || chain_id == self.test_secondary
    }
}

impl Default for SupportedNetworks {
    fn default() -> Self {
        Self::new(Network::Mainnet.chain_id(), Network::Holesky.chain_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_networks() {
        let networks = SupportedNetworks::default();
        assert!(networks.allows(1));
        assert!(networks.allows(17000));
        assert!(!networks.allows(11155111));
    }

    #[test]
    fn test_parse_network() {
        assert_eq!("Holesky".parse::<Network>().unwrap(), Network::Holesky);
        assert_eq!(Network::from_chain_id(1), Some(Network::Mainnet));
        assert!("sepolia".parse::<Network>().is_err());
    }
}
