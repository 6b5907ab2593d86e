//! Chain helpers for the networks the Morpho API serves market data for.

use alloy_chains::NamedChain;

/// Chains with Morpho Blue markets indexed by the API.
pub const SUPPORTED_CHAINS: &[NamedChain] = &[
    NamedChain::Mainnet,
    NamedChain::Base,
    NamedChain::Polygon,
    NamedChain::Arbitrum,
    NamedChain::Optimism,
    NamedChain::World,
    NamedChain::Fraxtal,
    NamedChain::Scroll,
    NamedChain::Ink,
    NamedChain::Unichain,
    NamedChain::Sonic,
    NamedChain::Mode,
    NamedChain::Corn,
    NamedChain::Katana,
    NamedChain::Etherlink,
    NamedChain::Lisk,
    NamedChain::Hyperliquid,
    NamedChain::Sei,
    NamedChain::Linea,
    NamedChain::Monad,
    NamedChain::StableMainnet,
    NamedChain::Cronos,
    NamedChain::Celo,
    NamedChain::Abstract,
    NamedChain::Sepolia,
];

/// Try to create a NamedChain from a chain ID.
pub fn chain_from_id(id: i64) -> Option<NamedChain> {
    u64::try_from(id)
        .ok()
        .and_then(|id| NamedChain::try_from(id).ok())
}

/// Chain ID as the GraphQL `Int` the API expects.
pub fn chain_id(chain: NamedChain) -> i64 {
    u64::from(chain) as i64
}

/// Whether market data for `chain` can be fetched.
pub fn is_supported(chain: NamedChain) -> bool {
    SUPPORTED_CHAINS.contains(&chain)
}

/// Serde helper module for (de)serializing NamedChain as its numeric chain ID.
pub mod chain_serde {
    use alloy_chains::NamedChain;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(chain: &NamedChain, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(super::chain_id(*chain))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NamedChain, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = i64::deserialize(deserializer)?;
        super::chain_from_id(id)
            .ok_or_else(|| serde::de::Error::custom(format!("Unknown chain ID: {}", id)))
    }
}
