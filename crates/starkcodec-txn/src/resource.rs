//! Fee-market members shared by V3 transactions.

use serde::{Deserialize, Serialize};
use starkcodec_core::Felt;

/// Upper bounds a V3 transaction is willing to pay for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBounds {
    pub max_amount: Felt,
    pub max_price_per_unit: Felt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBoundsMapping {
    pub l1_gas: ResourceBounds,
    pub l2_gas: ResourceBounds,
}

/// Where the nonce or fee of a V3 transaction is made available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataAvailabilityMode {
    #[default]
    L1,
    L2,
}
