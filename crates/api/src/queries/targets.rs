//! Public allocator policy query: per-market utilization targets and the
//! whitelisted vaults of a chain.

use graphql_client::{GraphQLQuery, QueryBody};

pub const OPERATION_NAME: &str = "GetMarketTargets";

pub const QUERY: &str = r#"
query GetMarketTargets($chainId: Int!) {
  markets(where: { chainId_in: [$chainId] }, first: 1000) {
    items {
      uniqueKey
      targetBorrowUtilization
      targetWithdrawUtilization
    }
  }
  vaults(where: { chainId_in: [$chainId], whitelisted: true }, first: 1000) {
    items {
      address
      publicAllocatorConfig { fee }
    }
  }
}
"#;

/// Query for the utilization targets of every market on a chain.
pub struct GetMarketTargets;

impl GraphQLQuery for GetMarketTargets {
    type Variables = get_market_targets::Variables;
    type ResponseData = get_market_targets::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: QUERY,
            operation_name: OPERATION_NAME,
        }
    }
}

pub mod get_market_targets {
    use alloy_primitives::U256;
    use serde::{Deserialize, Serialize};

    use crate::types::scalars::deserialize_optional_bigint;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub chain_id: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub markets: Page<MarketTargetItem>,
        pub vaults: Page<VaultItem>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(bound(deserialize = "T: Deserialize<'de>"))]
    pub struct Page<T> {
        #[serde(default)]
        pub items: Option<Vec<T>>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MarketTargetItem {
        pub unique_key: String,
        #[serde(default, deserialize_with = "deserialize_optional_bigint")]
        pub target_borrow_utilization: Option<U256>,
        #[serde(default, deserialize_with = "deserialize_optional_bigint")]
        pub target_withdraw_utilization: Option<U256>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VaultItem {
        pub address: String,
        #[serde(default)]
        pub public_allocator_config: Option<VaultPublicAllocator>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VaultPublicAllocator {
        #[serde(default, deserialize_with = "deserialize_optional_bigint")]
        pub fee: Option<U256>,
    }
}
