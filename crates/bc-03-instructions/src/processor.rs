//! Instruction processor.
//!
//! Applies beacon instructions in order to a staged copy of the state and
//! a staged overlay of the params store. Only when every instruction
//! succeeds is the params batch written and the state replaced.

use crate::domain::state::load_json;
use crate::domain::*;
use crate::ports::{ParamsBatch, ParamsStore};
use serde::Serialize;
use shared_types::{RawInstruction, MAX_SHARD_NUMBER};
use tracing::{debug, info, warn};

/// What one block did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Instructions with an effect.
    pub applied: usize,
    /// Refund instructions.
    pub refunds: usize,
    /// Reserved, bridge and unrecognised instructions.
    pub skipped: usize,
    /// Params keys written.
    pub writes: usize,
    /// Dividend rounds completed by this block.
    pub payouts: Vec<DividendPayout>,
}

/// A block run to completion but not yet written.
#[derive(Clone, Debug)]
pub struct StagedBlock {
    state: BeaconState,
    writes: ParamsBatch,
    summary: ProcessSummary,
}

impl StagedBlock {
    /// Effects the block will have once committed.
    pub fn summary(&self) -> &ProcessSummary {
        &self.summary
    }

    /// Params writes waiting for commit.
    pub fn writes(&self) -> &ParamsBatch {
        &self.writes
    }
}

/// Params overlay: reads see staged writes first.
struct StagedParams<'a> {
    store: &'a dyn ParamsStore,
    writes: ParamsBatch,
}

impl<'a> StagedParams<'a> {
    fn new(store: &'a dyn ParamsStore) -> Self {
        Self {
            store,
            writes: ParamsBatch::new(),
        }
    }

    fn load<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PipelineError> {
        match self.writes.get(key) {
            Some(bytes) => serde_json::from_slice(bytes).map(Some).map_err(|e| {
                StoreError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
                .into()
            }),
            None => load_json(self.store, key),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, PipelineError> {
        if self.writes.contains_key(key) {
            return Ok(true);
        }
        Ok(self.store.get(key)?.is_some())
    }

    fn put<T: Serialize>(&mut self, key: String, value: &T) -> Result<(), PipelineError> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Corrupt {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.writes.insert(key, bytes);
        Ok(())
    }
}

/// Applies beacon instructions to beacon state.
#[derive(Debug, Default)]
pub struct InstructionProcessor;

impl InstructionProcessor {
    /// Create a processor.
    pub fn new() -> Self {
        Self
    }

    /// Apply a block's instructions atomically.
    ///
    /// On error neither `state` nor `store` is modified.
    pub fn process_block(
        &self,
        instructions: &[RawInstruction],
        state: &mut BeaconState,
        store: &dyn ParamsStore,
    ) -> Result<ProcessSummary, PipelineError> {
        let staged = self.stage(instructions, state, store)?;
        self.commit(staged, state, store)
    }

    /// Run every instruction against copies of `state` and the params store.
    ///
    /// Reads go to `store`; nothing is written.
    pub fn stage(
        &self,
        instructions: &[RawInstruction],
        state: &BeaconState,
        store: &dyn ParamsStore,
    ) -> Result<StagedBlock, PipelineError> {
        let mut staged_state = state.clone();
        let mut params = StagedParams::new(store);
        let mut summary = ProcessSummary::default();

        for (index, raw) in instructions.iter().enumerate() {
            let result = BeaconInstruction::parse(raw)
                .and_then(|parsed| apply(parsed, &mut staged_state, &mut params, &mut summary));
            if let Err(err) = result {
                warn!(index, error = %err, "Beacon instruction rejected, block not applied");
                return Err(err);
            }
        }

        summary.writes = params.writes.len();
        Ok(StagedBlock {
            state: staged_state,
            writes: params.writes,
            summary,
        })
    }

    /// Write a staged block's params batch, then replace `state`.
    ///
    /// `state` is untouched when the write fails.
    pub fn commit(
        &self,
        staged: StagedBlock,
        state: &mut BeaconState,
        store: &dyn ParamsStore,
    ) -> Result<ProcessSummary, PipelineError> {
        if !staged.writes.is_empty() {
            store.write_batch(staged.writes)?;
        }
        *state = staged.state;

        let summary = staged.summary;
        debug!(
            applied = summary.applied,
            refunds = summary.refunds,
            skipped = summary.skipped,
            writes = summary.writes,
            "Beacon instructions applied"
        );
        Ok(summary)
    }
}

fn apply(
    inst: BeaconInstruction,
    state: &mut BeaconState,
    params: &mut StagedParams<'_>,
    summary: &mut ProcessSummary,
) -> Result<(), PipelineError> {
    match inst {
        BeaconInstruction::Reserved(_)
        | BeaconInstruction::Bridge { .. }
        | BeaconInstruction::Unrecognized(_) => {
            summary.skipped += 1;
            return Ok(());
        }
        BeaconInstruction::Refund { .. } => {
            summary.refunds += 1;
            return Ok(());
        }
        BeaconInstruction::CrowdsalePayment(payment) => crowdsale_payment(payment, params)?,
        BeaconInstruction::BuyFromGov(action) => {
            if let Some(selling) = state.selling_bonds.as_mut() {
                take_from_pool(selling, "bonds", action.meta.amount)?;
                params.put(keys::sold_bonds(&selling.id), &*selling)?;
                credit_fund(&mut state.gov_fund, &action)?;
            }
        }
        BeaconInstruction::BuyGovTokens(action) => {
            if let Some(selling) = state.selling_gov_tokens.as_mut() {
                take_from_pool(selling, "gov tokens", action.meta.amount)?;
                credit_fund(&mut state.gov_fund, &action)?;
            }
        }
        BeaconInstruction::BuyBack(info) => {
            let cost = info
                .value
                .checked_mul(info.buy_back_price)
                .ok_or(PipelineError::Overflow("buy-back value"))?;
            if state.gov_fund < cost {
                return Err(PipelineError::InsufficientFund {
                    available: state.gov_fund,
                    requested: cost,
                });
            }
            state.gov_fund -= cost;
        }
        BeaconInstruction::Issuing(info) => {
            if let Some(reserve) = state.raise_reserve.get_mut(&info.currency_type) {
                *reserve = reserve.saturating_sub(info.amount);
            }
        }
        BeaconInstruction::Contracting(info) => {
            if let Some(reserve) = state.spend_reserve.get_mut(&info.currency_type) {
                *reserve = reserve.saturating_sub(info.burned_amount);
            }
        }
        BeaconInstruction::LoanRequest(request) => {
            let key = keys::loan_request(&request.loan_id);
            if params.exists(&key)? {
                return Err(PipelineError::DuplicateLoan(request.loan_id));
            }
            params.put(key, &request)?;
        }
        BeaconInstruction::LoanResponse(response) => {
            if !params.exists(&keys::loan_request(&response.loan_id))? {
                return Err(PipelineError::UnknownLoan(response.loan_id));
            }
            let key = keys::loan_responses(&response.loan_id);
            let mut responses: Vec<LoanResponse> = params.load(&key)?.unwrap_or_default();
            if responses.iter().any(|r| r.responder == response.responder) {
                return Err(PipelineError::DuplicateLoanResponse {
                    loan_id: response.loan_id,
                    responder: response.responder,
                });
            }
            responses.push(response);
            params.put(key, &responses)?;
        }
        BeaconInstruction::DividendSubmit(submission) => {
            if let Some(payout) = submit_dividend(submission, state, params)? {
                summary.payouts.push(payout);
            }
        }
    }
    summary.applied += 1;
    Ok(())
}

fn crowdsale_payment(
    payment: CrowdsalePayment,
    params: &mut StagedParams<'_>,
) -> Result<(), PipelineError> {
    if !payment.update_sale {
        return Ok(());
    }
    let key = keys::sale(&payment.sale_id);
    let mut sale: SaleData = params
        .load(&key)?
        .ok_or_else(|| PipelineError::SaleNotFound(payment.sale_id.clone()))?;

    let units = payment.units_for(&sale);
    if sale.amount < units {
        return Err(PipelineError::SaleExhausted {
            sale_id: payment.sale_id,
            remaining: sale.amount,
            requested: units,
        });
    }
    sale.amount -= units;
    params.put(key, &sale)
}

fn take_from_pool(
    selling: &mut SellingParams,
    pool: &'static str,
    amount: u64,
) -> Result<(), PipelineError> {
    if selling.to_sell < amount {
        return Err(PipelineError::InsufficientSupply {
            pool,
            available: selling.to_sell,
            requested: amount,
        });
    }
    selling.to_sell -= amount;
    Ok(())
}

fn credit_fund(fund: &mut u64, action: &BuySellAction) -> Result<(), PipelineError> {
    let income = action
        .total_price()
        .ok_or(PipelineError::Overflow("purchase price"))?;
    *fund = fund
        .checked_add(income)
        .ok_or(PipelineError::Overflow("gov fund"))?;
    Ok(())
}

/// Record one shard's submission; pay out once every shard has reported.
fn submit_dividend(
    submission: DividendSubmission,
    state: &mut BeaconState,
    params: &mut StagedParams<'_>,
) -> Result<Option<DividendPayout>, PipelineError> {
    let key = keys::dividend_aggregation(submission.dividend_id, &submission.token_id);
    let mut aggregation: DividendAggregation = params.load(&key)?.unwrap_or_default();
    if aggregation.per_shard.contains_key(&submission.shard_id) {
        return Err(PipelineError::DuplicateDividendSubmission {
            dividend_id: submission.dividend_id,
            shard_id: submission.shard_id,
        });
    }
    aggregation
        .per_shard
        .insert(submission.shard_id, submission.token_amount);
    params.put(key, &aggregation)?;

    if aggregation.per_shard.len() < MAX_SHARD_NUMBER {
        return Ok(None);
    }

    let total_tokens = aggregation.total_tokens();
    let fund = state.dividend_fund;
    let amount_per_token = if total_tokens == 0 {
        0
    } else {
        fund / total_tokens
    };
    state.dividend_fund = fund - amount_per_token * total_tokens;

    let payout = DividendPayout {
        dividend_id: submission.dividend_id,
        token_id: submission.token_id,
        total_tokens,
        fund,
        amount_per_token,
    };
    params.put(
        keys::dividend_payout(payout.dividend_id, &payout.token_id),
        &payout,
    )?;
    info!(
        dividend_id = payout.dividend_id,
        token_id = %payout.token_id,
        total_tokens,
        amount_per_token,
        "Dividend round complete"
    );
    Ok(Some(payout))
}
