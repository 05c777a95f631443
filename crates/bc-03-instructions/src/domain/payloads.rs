//! # Instruction Payloads
//!
//! JSON bodies carried in instructions. Purchase actions travel as
//! base64-encoded JSON, everything else as plain JSON.

use super::errors::PipelineError;
use super::metadata::MetadataType;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{BeaconHeight, ShardId};
use std::collections::BTreeMap;

/// Encode a payload as plain JSON.
pub fn encode_json<T: Serialize>(meta: MetadataType, value: &T) -> Result<String, PipelineError> {
    serde_json::to_string(value).map_err(|e| PipelineError::payload(meta, e))
}

/// Decode a plain JSON payload.
pub fn decode_json<T: DeserializeOwned>(meta: MetadataType, raw: &str) -> Result<T, PipelineError> {
    serde_json::from_str(raw).map_err(|e| PipelineError::payload(meta, e))
}

/// Encode a payload as base64 JSON.
pub fn encode_content<T: Serialize>(
    meta: MetadataType,
    value: &T,
) -> Result<String, PipelineError> {
    let json = serde_json::to_vec(value).map_err(|e| PipelineError::payload(meta, e))?;
    Ok(STANDARD.encode(json))
}

/// Decode a base64 JSON payload.
pub fn decode_content<T: DeserializeOwned>(
    meta: MetadataType,
    raw: &str,
) -> Result<T, PipelineError> {
    let bytes = STANDARD
        .decode(raw)
        .map_err(|e| PipelineError::payload(meta, e))?;
    serde_json::from_slice(&bytes).map_err(|e| PipelineError::payload(meta, e))
}

// =============================================================================
// Crowdsale
// =============================================================================

/// Crowdsale state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaleStatus {
    /// Units remain.
    Open,
    /// Remaining amount reached zero.
    Depleted,
}

/// A crowdsale as stored in the params store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleData {
    /// Sale identifier.
    pub sale_id: String,
    /// Last height accepting requests.
    pub end_block: BeaconHeight,
    /// Asset sold (or bought back) by the sale.
    pub bond_id: String,
    /// Fallback price when the oracle has none.
    pub price: u64,
    /// Remaining units.
    pub amount: u64,
    /// True when the sale buys bonds instead of selling them.
    pub buy: bool,
}

impl SaleData {
    /// Depletion is implicit: there is no explicit close.
    pub fn status(&self) -> SaleStatus {
        if self.amount == 0 {
            SaleStatus::Depleted
        } else {
            SaleStatus::Open
        }
    }

    /// True when `height` is past the end of the sale.
    pub fn has_ended(&self, height: BeaconHeight) -> bool {
        height > self.end_block
    }
}

/// Shard request to take part in a crowdsale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdsaleRequest {
    /// Sale identifier.
    pub sale_id: String,
    /// Paying address.
    pub payer: String,
    /// Amount paid in.
    pub payment_amount: u64,
}

/// Beacon decision on a crowdsale request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdsalePayment {
    /// Sale identifier.
    pub sale_id: String,
    /// Paying address.
    pub payer: String,
    /// Units traded. Zero for a refund.
    pub amount: u64,
    /// Amount paid in.
    pub sent_amount: u64,
    /// Whether the processor depletes the sale.
    pub update_sale: bool,
}

impl CrowdsalePayment {
    /// Units taken from the sale.
    pub fn units_for(&self, sale: &SaleData) -> u64 {
        if sale.buy {
            self.sent_amount
        } else {
            self.amount
        }
    }
}

// =============================================================================
// GOV selling pools
// =============================================================================

/// A GOV selling pool (bonds or GOV tokens).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellingParams {
    /// Asset sold.
    pub id: String,
    /// First height of the window.
    pub start_selling_at: BeaconHeight,
    /// Window length in blocks.
    pub selling_within: u64,
    /// Units still for sale.
    pub to_sell: u64,
}

impl SellingParams {
    /// Whether `height` is inside the selling window.
    pub fn is_selling_at(&self, height: BeaconHeight) -> bool {
        height >= self.start_selling_at
            && height <= self.start_selling_at.saturating_add(self.selling_within)
    }
}

/// Purchase from a GOV selling pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuySellRequest {
    /// Paying address.
    pub payer: String,
    /// Units requested.
    pub amount: u64,
    /// Price per unit.
    pub buy_price: u64,
}

/// Purchase action as forwarded from a shard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuySellAction {
    /// Original request.
    pub meta: BuySellRequest,
    /// Shard the request came from.
    pub shard_id: ShardId,
    /// Transaction carrying the request.
    pub requested_tx_id: String,
}

impl BuySellAction {
    /// Price paid for the whole request.
    pub fn total_price(&self) -> Option<u64> {
        self.meta.amount.checked_mul(self.meta.buy_price)
    }
}

/// Request to sell matured bonds back to GOV.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBackRequest {
    /// Paying address.
    pub payer: String,
    /// Units requested.
    pub amount: u64,
    /// Price per bond paid by GOV.
    pub buy_back_price: u64,
    /// First height of the window.
    pub start_selling_at: BeaconHeight,
    /// Blocks until the bonds mature.
    pub maturity: u64,
}

impl BuyBackRequest {
    /// Whether the bonds have matured by `height`.
    pub fn is_matured_at(&self, height: BeaconHeight) -> bool {
        self.start_selling_at.saturating_add(self.maturity) <= height
    }
}

/// Accepted buy-back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBackInfo {
    /// Paying address.
    pub payer: String,
    /// Bonds bought back.
    pub value: u64,
    /// Price per bond paid by GOV.
    pub buy_back_price: u64,
}

// =============================================================================
// Reserve
// =============================================================================

/// Accepted issuing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuingInfo {
    /// Reserve currency.
    pub currency_type: String,
    /// Units requested.
    pub amount: u64,
}

/// Accepted contracting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractingInfo {
    /// Reserve currency.
    pub currency_type: String,
    /// Units burned.
    pub burned_amount: u64,
}

// =============================================================================
// Loans and dividends
// =============================================================================

/// Request for a loan from the reserve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    /// Loan identifier.
    pub loan_id: String,
    /// Address receiving the loan.
    pub receiver: String,
    /// Units requested.
    pub amount: u64,
}

/// Board member answer to a loan request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanResponse {
    /// Loan identifier.
    pub loan_id: String,
    /// Board member answering.
    pub responder: String,
    /// Whether the responder approved.
    pub accepted: bool,
}

/// Token holder total reported by one shard for a dividend round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendSubmission {
    /// Dividend round.
    pub dividend_id: u64,
    /// Token paying the dividend.
    pub token_id: String,
    /// Shard the request came from.
    pub shard_id: ShardId,
    /// Tokens held on the shard.
    pub token_amount: u64,
}

/// Submissions collected so far for one dividend round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendAggregation {
    /// Token amount by submitting shard.
    pub per_shard: BTreeMap<ShardId, u64>,
}

impl DividendAggregation {
    /// Total tokens across submitted shards.
    pub fn total_tokens(&self) -> u64 {
        self.per_shard
            .values()
            .fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

/// Payout computed once every shard has submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendPayout {
    /// Dividend round.
    pub dividend_id: u64,
    /// Token paying the dividend.
    pub token_id: String,
    /// Tokens across all shards.
    pub total_tokens: u64,
    /// Dividend fund at payout.
    pub fund: u64,
    /// Zero when nobody holds the token.
    pub amount_per_token: u64,
}
