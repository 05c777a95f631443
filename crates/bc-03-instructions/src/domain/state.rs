//! # Beacon State
//!
//! The slice of beacon best-state the pipeline reads and mutates, the
//! producer's per-block accumulator, and the read-only view handed to the
//! producer.

use super::errors::{PipelineError, StoreError};
use super::keys;
use super::payloads::{SaleData, SellingParams};
use crate::ports::ParamsStore;
use serde::{Deserialize, Serialize};
use shared_types::BeaconHeight;
use std::collections::BTreeMap;

/// Mutable beacon state touched by instructions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconState {
    /// Height of the best beacon block.
    pub height: BeaconHeight,
    /// GOV fund balance.
    pub gov_fund: u64,
    /// Fund split among token holders when a dividend round completes.
    pub dividend_fund: u64,
    /// Live oracle prices by asset.
    pub oracle_prices: BTreeMap<String, u64>,
    /// Bond selling pool.
    pub selling_bonds: Option<SellingParams>,
    /// GOV token selling pool.
    pub selling_gov_tokens: Option<SellingParams>,
    /// Reserve available for issuing, by currency.
    pub raise_reserve: BTreeMap<String, u64>,
    /// Reserve available for contracting, by currency.
    pub spend_reserve: BTreeMap<String, u64>,
}

/// Values consumed by earlier instructions of the block being produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulativeValues {
    /// Bonds sold.
    pub bonds_sold: u64,
    /// GOV tokens sold.
    pub gov_tokens_sold: u64,
    /// Paid for bonds.
    pub income_from_bonds: u64,
    /// Paid for GOV tokens.
    pub income_from_gov_tokens: u64,
    /// GOV fund promised to buy-backs.
    pub buy_back_coins: u64,
    /// Sales as depleted by this block so far.
    pub sales: BTreeMap<String, SaleData>,
}

/// Read-only view for the producer.
pub struct BeaconStateView<'a> {
    state: &'a BeaconState,
    params: &'a dyn ParamsStore,
}

impl<'a> BeaconStateView<'a> {
    /// View over committed state.
    pub fn new(state: &'a BeaconState, params: &'a dyn ParamsStore) -> Self {
        Self { state, params }
    }

    /// Committed state.
    pub fn state(&self) -> &BeaconState {
        self.state
    }

    /// Height of the block being produced.
    pub fn next_height(&self) -> BeaconHeight {
        self.state.height.saturating_add(1)
    }

    /// Oracle price of an asset.
    pub fn oracle_price(&self, asset: &str) -> Option<u64> {
        self.state.oracle_prices.get(asset).copied()
    }

    /// Committed sale data.
    pub fn sale(&self, sale_id: &str) -> Result<Option<SaleData>, PipelineError> {
        load_json(self.params, &keys::sale(sale_id))
    }
}

/// Read and decode a JSON value from the params store.
pub(crate) fn load_json<T: serde::de::DeserializeOwned>(
    params: &dyn ParamsStore,
    key: &str,
) -> Result<Option<T>, PipelineError> {
    match params.get(key)? {
        None => Ok(None),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| {
                StoreError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
                .into()
            }),
    }
}
