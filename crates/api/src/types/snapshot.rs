//! Market snapshots fetched from the Morpho API.
//!
//! A [`MarketSnapshot`] holds the target market, every sibling market the
//! public allocator can draw from, and the vaults that supply them. It is
//! converted into a [`SimulationState`] with every market accrued to the
//! most recent timestamp reported by the API, so the engine never has to
//! accrue interest itself.

use std::collections::HashMap;

use alloy_chains::NamedChain;
use alloy_primitives::{Address, B256, U256};
use morpho_liquidity_sim::{
    Market, MarketParams, PublicAllocatorConfig, PublicAllocatorMarketConfig, SimError,
    SimulationState, Vault, VaultMarketConfig,
};
use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::chain::chain_serde;
use super::scalars::{fraction_to_wad, parse_address, parse_market_id};
use crate::queries::market::get_market_snapshot::{
    AssetFields, MarketFields, SharedVault, SnapshotMarket,
};

/// Market state data needed for simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStateForSim {
    /// Market unique identifier (32-byte hash).
    pub id: B256,
    /// Market parameters. `None` for idle markets without collateral.
    pub params: Option<MarketParams>,
    pub total_supply_assets: U256,
    pub total_borrow_assets: U256,
    pub total_supply_shares: U256,
    pub total_borrow_shares: U256,
    /// Timestamp of last interest accrual.
    pub last_update: u64,
    /// Protocol fee (WAD-scaled, e.g., 0.1 WAD = 10%).
    pub fee: U256,
    /// Rate at target utilization for Adaptive Curve IRM (None for other IRMs).
    pub rate_at_target: Option<U256>,
    /// Oracle price (collateral/loan, scaled by 1e36). None if unavailable.
    pub price: Option<U256>,
}

impl MarketStateForSim {
    /// Convert GraphQL market fields. Returns `None` without a parsable id or state.
    pub fn from_gql(fields: &MarketFields) -> Option<Self> {
        let id = parse_market_id(&fields.unique_key)?;
        let state = fields.state.as_ref()?;

        let params = fields.collateral_asset.as_ref().and_then(|collateral| {
            Some(MarketParams {
                loan_token: parse_address(&fields.loan_asset.address)?,
                collateral_token: parse_address(&collateral.address)?,
                oracle: fields.oracle_address.unwrap_or(Address::ZERO),
                irm: fields.irm_address.unwrap_or(Address::ZERO),
                lltv: fields.lltv,
            })
        });

        Some(Self {
            id,
            params,
            total_supply_assets: state.supply_assets,
            total_borrow_assets: state.borrow_assets,
            total_supply_shares: state.supply_shares,
            total_borrow_shares: state.borrow_shares,
            last_update: state.timestamp.saturating_to::<u64>(),
            fee: fraction_to_wad(state.fee),
            rate_at_target: state.rate_at_target,
            price: state.price,
        })
    }

    /// Convert to a simulation [`Market`].
    pub fn to_sim_market(&self) -> Market {
        let mut market = Market::new(
            self.id,
            self.total_supply_assets,
            self.total_borrow_assets,
            self.total_supply_shares,
            self.total_borrow_shares,
            self.last_update,
            self.fee,
            self.rate_at_target,
        );
        if let Some(params) = self.params {
            market = market.with_params(params);
        }
        if let Some(price) = self.price {
            market = market.with_price(price);
        }
        market
    }
}

/// Vault allocation with queue index and public allocator flow caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultAllocationForSim {
    pub market_id: B256,
    /// Current supply to this market from the vault.
    pub supply_assets: U256,
    pub supply_cap: U256,
    pub enabled: bool,
    /// Position in the withdraw queue (None if not reported).
    pub withdraw_queue_index: Option<i64>,
    pub max_in: Option<U256>,
    pub max_out: Option<U256>,
}

/// A MetaMorpho vault as seen by the public allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultForSim {
    pub address: Address,
    pub name: String,
    /// Public allocator fee; `None` when the vault has no public allocator.
    pub public_allocator_fee: Option<U256>,
    pub allocations: Vec<VaultAllocationForSim>,
}

impl VaultForSim {
    fn from_gql(vault: &SharedVault) -> Option<Self> {
        let address = parse_address(&vault.address)?;
        let flow_caps: HashMap<B256, (U256, U256)> = vault
            .public_allocator_config
            .iter()
            .flat_map(|config| config.flow_caps.iter())
            .filter_map(|cap| {
                Some((
                    parse_market_id(&cap.market.unique_key)?,
                    (cap.max_in, cap.max_out),
                ))
            })
            .collect();

        let allocations = vault
            .state
            .iter()
            .flat_map(|state| state.allocation.iter())
            .filter_map(|allocation| {
                let market_id = parse_market_id(&allocation.market.unique_key)?;
                let caps = flow_caps.get(&market_id);
                Some(VaultAllocationForSim {
                    market_id,
                    supply_assets: allocation.supply_assets,
                    supply_cap: allocation.supply_cap,
                    enabled: allocation.enabled,
                    withdraw_queue_index: allocation.withdraw_queue_index,
                    max_in: caps.map(|(max_in, _)| *max_in),
                    max_out: caps.map(|(_, max_out)| *max_out),
                })
            })
            .collect();

        Some(Self {
            address,
            name: vault.name.clone(),
            public_allocator_fee: vault.public_allocator_config.as_ref().map(|c| c.fee),
            allocations,
        })
    }

    /// Get ordered withdraw queue (sorted by withdraw_queue_index).
    ///
    /// Falls back to the reported allocation order when no index is known.
    pub fn withdraw_queue(&self) -> Vec<B256> {
        let mut indexed: Vec<_> = self
            .allocations
            .iter()
            .filter_map(|a| a.withdraw_queue_index.map(|idx| (idx, a.market_id)))
            .collect();
        if indexed.is_empty() {
            return self.allocations.iter().map(|a| a.market_id).collect();
        }
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, id)| id).collect()
    }

    /// Convert to a simulation [`Vault`].
    pub fn to_sim_vault(&self) -> Vault {
        let allocations = self
            .allocations
            .iter()
            .map(|alloc| {
                let public_allocator_config = match (alloc.max_in, alloc.max_out) {
                    (Some(max_in), Some(max_out)) => {
                        Some(PublicAllocatorMarketConfig { max_in, max_out })
                    }
                    _ => None,
                };
                (
                    alloc.market_id,
                    VaultMarketConfig {
                        market_id: alloc.market_id,
                        cap: alloc.supply_cap,
                        supply_assets: alloc.supply_assets,
                        enabled: alloc.enabled,
                        public_allocator_config,
                    },
                )
            })
            .collect();

        Vault {
            address: self.address,
            withdraw_queue: self.withdraw_queue(),
            allocations,
            public_allocator_config: self.public_allocator_fee.map(|fee| PublicAllocatorConfig {
                fee,
                accrued_fee: U256::ZERO,
            }),
        }
    }
}

/// Liquidity a vault shares with the target market through the public allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedLiquidity {
    pub assets: U256,
    pub vault: Address,
    pub vault_name: String,
    pub market_id: B256,
    pub collateral_symbol: Option<String>,
    pub target_withdraw_utilization: Option<U256>,
}

/// Everything fetched about one target market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    #[serde(with = "chain_serde")]
    pub chain: NamedChain,
    pub target: MarketStateForSim,
    pub loan_asset: Asset,
    pub collateral_asset: Option<Asset>,
    /// Idle liquidity reported by the API.
    pub liquidity: U256,
    /// Utilization reported by the API (WAD-scaled).
    pub utilization: U256,
    /// Reallocatable liquidity reported by the API.
    pub reallocatable_liquidity: U256,
    pub shared_liquidity: Vec<SharedLiquidity>,
    /// Sibling markets, in order of first appearance.
    pub sources: Vec<MarketStateForSim>,
    /// Vaults sharing liquidity, in order of first appearance.
    pub vaults: Vec<VaultForSim>,
}

fn asset_from_gql(fields: &AssetFields) -> Option<Asset> {
    Asset::from_gql(
        &fields.address,
        fields.symbol.clone(),
        fields.name.clone(),
        fields.decimals,
        fields.price_usd,
    )
}

impl MarketSnapshot {
    /// Convert a `marketByUniqueKey` response.
    ///
    /// Returns `None` when the target market itself cannot be parsed.
    /// Unparsable sibling markets and vaults are skipped.
    pub fn from_gql(market: SnapshotMarket, chain: NamedChain) -> Option<Self> {
        let target = MarketStateForSim::from_gql(&market.market)?;
        let loan_asset = asset_from_gql(&market.market.loan_asset)?;
        let collateral_asset = market
            .market
            .collateral_asset
            .as_ref()
            .and_then(asset_from_gql);
        let state = market.market.state.as_ref()?;
        let liquidity = state.liquidity_assets.unwrap_or_else(|| {
            state.supply_assets.saturating_sub(state.borrow_assets)
        });
        let utilization = fraction_to_wad(state.utilization);

        let mut shared_liquidity = Vec::new();
        let mut sources: Vec<MarketStateForSim> = Vec::new();
        let mut vaults: Vec<VaultForSim> = Vec::new();

        for entry in market.public_allocator_shared_liquidity.unwrap_or_default() {
            let Some(source) = MarketStateForSim::from_gql(&entry.allocation_market.market) else {
                tracing::debug!(
                    market = %entry.allocation_market.market.unique_key,
                    "skipping shared liquidity from unparsable market"
                );
                continue;
            };
            let Some(vault) = VaultForSim::from_gql(&entry.vault) else {
                tracing::debug!(vault = %entry.vault.address, "skipping unparsable vault");
                continue;
            };

            shared_liquidity.push(SharedLiquidity {
                assets: entry.assets,
                vault: vault.address,
                vault_name: vault.name.clone(),
                market_id: source.id,
                collateral_symbol: entry
                    .allocation_market
                    .market
                    .collateral_asset
                    .as_ref()
                    .map(|asset| asset.symbol.clone()),
                target_withdraw_utilization: entry.allocation_market.target_withdraw_utilization,
            });

            if source.id != target.id && !sources.iter().any(|m| m.id == source.id) {
                sources.push(source);
            }
            if !vaults.iter().any(|v| v.address == vault.address) {
                vaults.push(vault);
            }
        }

        Some(Self {
            chain,
            target,
            loan_asset,
            collateral_asset,
            liquidity,
            utilization,
            reallocatable_liquidity: market.reallocatable_liquidity_assets.unwrap_or_default(),
            shared_liquidity,
            sources,
            vaults,
        })
    }

    /// Target market id.
    pub fn market_id(&self) -> B256 {
        self.target.id
    }

    /// Latest accrual timestamp among the fetched markets.
    pub fn timestamp(&self) -> u64 {
        self.sources
            .iter()
            .map(|market| market.last_update)
            .fold(self.target.last_update, u64::max)
    }

    /// Build a [`SimulationState`] with every market accrued to [`Self::timestamp`].
    pub fn to_simulation_state(&self) -> Result<SimulationState, SimError> {
        let timestamp = self.timestamp();
        let mut state = SimulationState::new(timestamp)
            .with_market(self.target.to_sim_market().accrue_interest(timestamp)?);

        for source in &self.sources {
            state = state.with_market(source.to_sim_market().accrue_interest(timestamp)?);
        }
        for vault in &self.vaults {
            state = state.with_vault(vault.to_sim_vault());
        }

        Ok(state)
    }
}
