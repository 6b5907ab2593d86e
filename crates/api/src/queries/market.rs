//! Market snapshot query.
//!
//! Fetches the target market together with every (vault, market) pair the
//! public allocator could pull liquidity from, including the vaults' flow
//! caps and supply queues.

use graphql_client::{GraphQLQuery, QueryBody};

pub const OPERATION_NAME: &str = "GetMarketSnapshot";

pub const QUERY: &str = r#"
query GetMarketSnapshot($uniqueKey: String!, $chainId: Int!) {
  marketByUniqueKey(uniqueKey: $uniqueKey, chainId: $chainId) {
    ...SnapshotMarket
    reallocatableLiquidityAssets
    publicAllocatorSharedLiquidity {
      assets
      vault {
        address
        name
        publicAllocatorConfig {
          fee
          flowCaps {
            market { uniqueKey }
            maxIn
            maxOut
          }
        }
        state {
          allocation {
            market { uniqueKey }
            supplyAssets
            supplyCap
            enabled
            withdrawQueueIndex
          }
        }
      }
      allocationMarket {
        ...SnapshotMarket
        targetBorrowUtilization
        targetWithdrawUtilization
      }
    }
  }
}

fragment SnapshotMarket on Market {
  uniqueKey
  lltv
  oracleAddress
  irmAddress
  loanAsset { address symbol name decimals priceUsd }
  collateralAsset { address symbol name decimals priceUsd }
  state {
    supplyAssets
    borrowAssets
    supplyShares
    borrowShares
    liquidityAssets
    utilization
    fee
    rateAtTarget
    price
    timestamp
  }
}
"#;

/// Query for a market and its public allocator shared liquidity.
pub struct GetMarketSnapshot;

impl GraphQLQuery for GetMarketSnapshot {
    type Variables = get_market_snapshot::Variables;
    type ResponseData = get_market_snapshot::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: QUERY,
            operation_name: OPERATION_NAME,
        }
    }
}

pub mod get_market_snapshot {
    use alloy_primitives::{Address, U256};
    use serde::{Deserialize, Serialize};

    use crate::types::scalars::{
        deserialize_bigint, deserialize_optional_address, deserialize_optional_bigint,
    };

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub unique_key: String,
        pub chain_id: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub market_by_unique_key: Option<SnapshotMarket>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SnapshotMarket {
        #[serde(flatten)]
        pub market: MarketFields,
        #[serde(default, deserialize_with = "deserialize_optional_bigint")]
        pub reallocatable_liquidity_assets: Option<U256>,
        #[serde(default)]
        pub public_allocator_shared_liquidity: Option<Vec<SharedLiquidity>>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MarketFields {
        pub unique_key: String,
        #[serde(deserialize_with = "deserialize_bigint")]
        pub lltv: U256,
        #[serde(default, deserialize_with = "deserialize_optional_address")]
        pub oracle_address: Option<Address>,
        #[serde(default, deserialize_with = "deserialize_optional_address")]
        pub irm_address: Option<Address>,
        pub loan_asset: AssetFields,
        #[serde(default)]
        pub collateral_asset: Option<AssetFields>,
        #[serde(default)]
        pub state: Option<MarketState>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AssetFields {
        pub address: String,
        pub symbol: String,
        #[serde(default)]
        pub name: Option<String>,
        pub decimals: f64,
        #[serde(default)]
        pub price_usd: Option<f64>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MarketState {
        #[serde(deserialize_with = "deserialize_bigint")]
        pub supply_assets: U256,
        #[serde(deserialize_with = "deserialize_bigint")]
        pub borrow_assets: U256,
        #[serde(deserialize_with = "deserialize_bigint")]
        pub supply_shares: U256,
        #[serde(deserialize_with = "deserialize_bigint")]
        pub borrow_shares: U256,
        #[serde(default, deserialize_with = "deserialize_optional_bigint")]
        pub liquidity_assets: Option<U256>,
        #[serde(default)]
        pub utilization: f64,
        #[serde(default)]
        pub fee: f64,
        #[serde(default, deserialize_with = "deserialize_optional_bigint")]
        pub rate_at_target: Option<U256>,
        #[serde(default, deserialize_with = "deserialize_optional_bigint")]
        pub price: Option<U256>,
        #[serde(deserialize_with = "deserialize_bigint")]
        pub timestamp: U256,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SharedLiquidity {
        #[serde(deserialize_with = "deserialize_bigint")]
        pub assets: U256,
        pub vault: SharedVault,
        pub allocation_market: AllocationMarket,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SharedVault {
        pub address: String,
        pub name: String,
        #[serde(default)]
        pub public_allocator_config: Option<PublicAllocatorConfig>,
        #[serde(default)]
        pub state: Option<VaultState>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PublicAllocatorConfig {
        #[serde(deserialize_with = "deserialize_bigint")]
        pub fee: U256,
        #[serde(default)]
        pub flow_caps: Vec<FlowCap>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FlowCap {
        pub market: MarketKey,
        #[serde(deserialize_with = "deserialize_bigint")]
        pub max_in: U256,
        #[serde(deserialize_with = "deserialize_bigint")]
        pub max_out: U256,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MarketKey {
        pub unique_key: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VaultState {
        #[serde(default)]
        pub allocation: Vec<Allocation>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Allocation {
        pub market: MarketKey,
        #[serde(deserialize_with = "deserialize_bigint")]
        pub supply_assets: U256,
        #[serde(deserialize_with = "deserialize_bigint")]
        pub supply_cap: U256,
        #[serde(default = "enabled_by_default")]
        pub enabled: bool,
        #[serde(default)]
        pub withdraw_queue_index: Option<i64>,
    }

    fn enabled_by_default() -> bool {
        true
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AllocationMarket {
        #[serde(flatten)]
        pub market: MarketFields,
        #[serde(default, deserialize_with = "deserialize_optional_bigint")]
        pub target_borrow_utilization: Option<U256>,
        #[serde(default, deserialize_with = "deserialize_optional_bigint")]
        pub target_withdraw_utilization: Option<U256>,
    }
}
