//! Instruction producer.
//!
//! Turns shard-block instructions into beacon instructions. Output is a
//! pure function of the inputs and the accumulator, so followers replay it
//! verbatim. Requests are evaluated in input order against the accumulator,
//! which carries what earlier requests of the same block already consumed.

use crate::domain::*;
use parking_lot::Mutex;
use shared_types::{RawInstruction, ShardId};
use tracing::{debug, warn};

/// Producer counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Accepted instructions emitted.
    pub accepted: u64,
    /// Refund instructions emitted.
    pub refunded: u64,
    /// Instructions dropped because they could not be parsed.
    pub malformed: u64,
    /// Instructions of types the pipeline does not handle.
    pub unrecognized: u64,
}

/// Builds beacon instructions from shard-block instructions.
#[derive(Default)]
pub struct InstructionProducer {
    stats: Mutex<ProducerStats>,
}

enum Decision {
    Emit(RawInstruction, InstructionStatus),
    Skip,
}

impl InstructionProducer {
    /// Create a producer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters since start.
    pub fn stats(&self) -> ProducerStats {
        self.stats.lock().clone()
    }

    /// Beacon instructions for one shard block.
    ///
    /// Malformed instructions are logged and skipped; they never fail the
    /// block.
    pub fn build_instructions(
        &self,
        shard_id: ShardId,
        shard_instructions: &[RawInstruction],
        view: &BeaconStateView<'_>,
        acc: &mut AccumulativeValues,
    ) -> Vec<RawInstruction> {
        let mut out = Vec::new();
        let mut stats = ProducerStats::default();

        for (index, raw) in shard_instructions.iter().enumerate() {
            let parsed = match ShardInstruction::parse(raw) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(shard_id, index, error = %err, "Skipping malformed shard instruction");
                    stats.malformed += 1;
                    continue;
                }
            };

            match self.decide(shard_id, parsed, view, acc) {
                Ok(Decision::Emit(inst, status)) => {
                    match status {
                        InstructionStatus::Accepted => stats.accepted += 1,
                        InstructionStatus::Refund => stats.refunded += 1,
                    }
                    out.push(inst);
                }
                Ok(Decision::Skip) => stats.unrecognized += 1,
                Err(err) => {
                    warn!(shard_id, index, error = %err, "Skipping shard instruction");
                    stats.malformed += 1;
                }
            }
        }

        debug!(
            shard_id,
            produced = out.len(),
            refunded = stats.refunded,
            malformed = stats.malformed,
            "Shard instructions converted"
        );
        let mut total = self.stats.lock();
        total.accepted += stats.accepted;
        total.refunded += stats.refunded;
        total.malformed += stats.malformed;
        total.unrecognized += stats.unrecognized;
        out
    }

    fn decide(
        &self,
        shard_id: ShardId,
        parsed: ShardInstruction,
        view: &BeaconStateView<'_>,
        acc: &mut AccumulativeValues,
    ) -> Result<Decision, PipelineError> {
        Ok(match parsed {
            ShardInstruction::Reserved(_) | ShardInstruction::Unrecognized(_) => Decision::Skip,
            ShardInstruction::Crowdsale(req) => crowdsale(shard_id, req, view, acc)?,
            ShardInstruction::BuyFromGov { action, content } => {
                let selling = view.state().selling_bonds.as_ref();
                let accepted = sell_from_pool(
                    selling,
                    &action,
                    view,
                    &mut acc.bonds_sold,
                    &mut acc.income_from_bonds,
                );
                emit_status(MetadataType::BuyFromGovRequest, shard_id, accepted, content)
            }
            ShardInstruction::BuyGovTokens { action, content } => {
                let selling = view.state().selling_gov_tokens.as_ref();
                let accepted = sell_from_pool(
                    selling,
                    &action,
                    view,
                    &mut acc.gov_tokens_sold,
                    &mut acc.income_from_gov_tokens,
                );
                emit_status(MetadataType::BuyGovTokenRequest, shard_id, accepted, content)
            }
            ShardInstruction::BuyBack(req) => buy_back(shard_id, req, view, acc)?,
            ShardInstruction::BurningRequest { content } => {
                let mut inst = beacon_instruction(
                    MetadataType::BurningConfirm,
                    shard_id,
                    InstructionStatus::Accepted,
                    content,
                );
                inst.push(view.next_height().to_string());
                Decision::Emit(inst, InstructionStatus::Accepted)
            }
            ShardInstruction::PassThrough { meta, content } => {
                emit_status(meta, shard_id, true, content)
            }
        })
    }
}

fn emit_status(meta: MetadataType, shard_id: ShardId, accepted: bool, payload: String) -> Decision {
    let status = if accepted {
        InstructionStatus::Accepted
    } else {
        InstructionStatus::Refund
    };
    Decision::Emit(beacon_instruction(meta, shard_id, status, payload), status)
}

fn crowdsale(
    shard_id: ShardId,
    req: CrowdsaleRequest,
    view: &BeaconStateView<'_>,
    acc: &mut AccumulativeValues,
) -> Result<Decision, PipelineError> {
    let meta = MetadataType::CrowdsalePayment;
    let refund = |req: CrowdsaleRequest| -> Result<Decision, PipelineError> {
        let payment = CrowdsalePayment {
            sale_id: req.sale_id,
            payer: req.payer,
            amount: 0,
            sent_amount: req.payment_amount,
            update_sale: false,
        };
        Ok(emit_status(meta, shard_id, false, encode_json(meta, &payment)?))
    };

    let sale = match acc.sales.get(&req.sale_id) {
        Some(sale) => sale.clone(),
        None => match view.sale(&req.sale_id)? {
            Some(sale) => sale,
            None => {
                debug!(sale_id = %req.sale_id, "Crowdsale request for unknown sale");
                return refund(req);
            }
        },
    };
    if sale.has_ended(view.next_height()) {
        return refund(req);
    }

    let price = view.oracle_price(&sale.bond_id).unwrap_or(sale.price);
    if price == 0 {
        return refund(req);
    }
    let amount = req.payment_amount / price;
    let payment = CrowdsalePayment {
        sale_id: req.sale_id.clone(),
        payer: req.payer.clone(),
        amount,
        sent_amount: req.payment_amount,
        update_sale: true,
    };
    let units = payment.units_for(&sale);
    if units > sale.amount {
        return refund(req);
    }

    let mut depleted = sale;
    depleted.amount -= units;
    acc.sales.insert(depleted.sale_id.clone(), depleted);
    Ok(emit_status(meta, shard_id, true, encode_json(meta, &payment)?))
}

/// Window and supply check shared by bond and GOV token purchases.
fn sell_from_pool(
    selling: Option<&SellingParams>,
    action: &BuySellAction,
    view: &BeaconStateView<'_>,
    sold: &mut u64,
    income: &mut u64,
) -> bool {
    let Some(params) = selling else {
        return false;
    };
    if !params.is_selling_at(view.next_height()) {
        return false;
    }
    let Some(total_sold) = sold.checked_add(action.meta.amount) else {
        return false;
    };
    if total_sold > params.to_sell {
        return false;
    }
    let Some(price) = action.total_price() else {
        return false;
    };
    let Some(total_income) = income.checked_add(price) else {
        return false;
    };
    *sold = total_sold;
    *income = total_income;
    true
}

fn buy_back(
    shard_id: ShardId,
    req: BuyBackRequest,
    view: &BeaconStateView<'_>,
    acc: &mut AccumulativeValues,
) -> Result<Decision, PipelineError> {
    let meta = MetadataType::BuyBackRequest;
    let value = req.amount.checked_mul(req.buy_back_price);
    let committed = value.and_then(|v| acc.buy_back_coins.checked_add(v));

    match committed {
        Some(total) if req.is_matured_at(view.next_height()) && total <= view.state().gov_fund => {
            acc.buy_back_coins = total;
            let info = BuyBackInfo {
                payer: req.payer,
                value: req.amount,
                buy_back_price: req.buy_back_price,
            };
            Ok(emit_status(meta, shard_id, true, encode_json(meta, &info)?))
        }
        _ => Ok(emit_status(meta, shard_id, false, encode_json(meta, &req)?)),
    }
}
