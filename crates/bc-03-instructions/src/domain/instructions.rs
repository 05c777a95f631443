//! # Parsed Instructions
//!
//! Shard-block instructions enter the producer as `[meta, content, ..]`.
//! Beacon instructions leave it as `[meta, shard_id, status, payload, ..]`.
//! Both parse into closed enums so dispatch is a single `match`.

use super::errors::PipelineError;
use super::metadata::{InstructionStatus, MetadataType};
use super::payloads::*;
use shared_types::{is_reserved_action, InstructionError, RawInstruction, ShardId};

/// Producer input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShardInstruction {
    /// `stake`, `swap`, `random` or `assign`.
    Reserved(String),
    Crowdsale(CrowdsaleRequest),
    BuyFromGov {
        action: BuySellAction,
        /// Encoded action, forwarded verbatim.
        content: String,
    },
    BuyGovTokens {
        action: BuySellAction,
        /// Encoded action, forwarded verbatim.
        content: String,
    },
    BuyBack(BuyBackRequest),
    /// Burn to be confirmed at the current beacon height.
    BurningRequest { content: String },
    /// Forwarded unchanged as accepted.
    PassThrough { meta: MetadataType, content: String },
    /// Numeric type this pipeline does not handle.
    Unrecognized(String),
}

fn metadata_tag(raw: &[String]) -> Result<Result<MetadataType, String>, PipelineError> {
    let tag = raw.first().ok_or(InstructionError::Empty)?;
    let code: u16 = tag.parse().map_err(|_| {
        InstructionError::InvalidPayload(format!("non-numeric metadata type {:?}", tag))
    })?;
    Ok(MetadataType::from_code(code).ok_or_else(|| tag.clone()))
}

fn field<'a>(raw: &'a [String], meta: MetadataType, index: usize) -> Result<&'a str, PipelineError> {
    raw.get(index)
        .map(String::as_str)
        .ok_or(PipelineError::MissingField { meta, index })
}

impl ShardInstruction {
    /// Parse a shard-block instruction.
    pub fn parse(raw: &[String]) -> Result<Self, PipelineError> {
        if let Some(tag) = raw.first() {
            if is_reserved_action(tag) {
                return Ok(ShardInstruction::Reserved(tag.clone()));
            }
        }
        let meta = match metadata_tag(raw)? {
            Ok(meta) => meta,
            Err(tag) => return Ok(ShardInstruction::Unrecognized(tag)),
        };
        let content = field(raw, meta, 1)?;

        Ok(match meta {
            MetadataType::CrowdsaleRequest => {
                ShardInstruction::Crowdsale(decode_json(meta, content)?)
            }
            MetadataType::BuyFromGovRequest => ShardInstruction::BuyFromGov {
                action: decode_content(meta, content)?,
                content: content.to_string(),
            },
            MetadataType::BuyGovTokenRequest => ShardInstruction::BuyGovTokens {
                action: decode_content(meta, content)?,
                content: content.to_string(),
            },
            MetadataType::BuyBackRequest => ShardInstruction::BuyBack(decode_json(meta, content)?),
            MetadataType::BurningRequest => ShardInstruction::BurningRequest {
                content: content.to_string(),
            },
            MetadataType::IssuingRequest
            | MetadataType::ContractingRequest
            | MetadataType::BurningConfirm
            | MetadataType::IssuingEthRequest
            | MetadataType::LoanRequest
            | MetadataType::LoanResponse
            | MetadataType::DividendSubmit => ShardInstruction::PassThrough {
                meta,
                content: content.to_string(),
            },
            MetadataType::CrowdsalePayment => ShardInstruction::Unrecognized(meta.tag()),
        })
    }
}

/// Processor input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BeaconInstruction {
    /// `stake`, `swap`, `random` or `assign`.
    Reserved(String),
    /// Rejected request. The payload is not interpreted.
    Refund { meta: MetadataType, shard_id: ShardId },
    CrowdsalePayment(CrowdsalePayment),
    BuyFromGov(BuySellAction),
    BuyGovTokens(BuySellAction),
    BuyBack(BuyBackInfo),
    Issuing(IssuingInfo),
    Contracting(ContractingInfo),
    LoanRequest(LoanRequest),
    LoanResponse(LoanResponse),
    DividendSubmit(DividendSubmission),
    /// Bridge instruction with no effect on beacon state.
    Bridge { meta: MetadataType },
    /// Numeric type this pipeline does not handle.
    Unrecognized(String),
}

impl BeaconInstruction {
    /// Parse a beacon instruction.
    pub fn parse(raw: &[String]) -> Result<Self, PipelineError> {
        if let Some(tag) = raw.first() {
            if is_reserved_action(tag) {
                return Ok(BeaconInstruction::Reserved(tag.clone()));
            }
        }
        let meta = match metadata_tag(raw)? {
            Ok(meta) => meta,
            Err(tag) => return Ok(BeaconInstruction::Unrecognized(tag)),
        };

        let shard_field = field(raw, meta, 1)?;
        let shard_id: ShardId = shard_field
            .parse()
            .map_err(|_| InstructionError::InvalidShardId(shard_field.to_string()))?;
        let status_field = field(raw, meta, 2)?;
        let status = InstructionStatus::parse(status_field)
            .ok_or_else(|| PipelineError::UnknownStatus(status_field.to_string()))?;
        let payload = field(raw, meta, 3)?;

        if status == InstructionStatus::Refund {
            return Ok(BeaconInstruction::Refund { meta, shard_id });
        }

        Ok(match meta {
            MetadataType::CrowdsalePayment => {
                BeaconInstruction::CrowdsalePayment(decode_json(meta, payload)?)
            }
            MetadataType::BuyFromGovRequest => {
                BeaconInstruction::BuyFromGov(decode_content(meta, payload)?)
            }
            MetadataType::BuyGovTokenRequest => {
                BeaconInstruction::BuyGovTokens(decode_content(meta, payload)?)
            }
            MetadataType::BuyBackRequest => BeaconInstruction::BuyBack(decode_json(meta, payload)?),
            MetadataType::IssuingRequest => BeaconInstruction::Issuing(decode_json(meta, payload)?),
            MetadataType::ContractingRequest => {
                BeaconInstruction::Contracting(decode_json(meta, payload)?)
            }
            MetadataType::LoanRequest => BeaconInstruction::LoanRequest(decode_json(meta, payload)?),
            MetadataType::LoanResponse => {
                BeaconInstruction::LoanResponse(decode_json(meta, payload)?)
            }
            MetadataType::DividendSubmit => {
                BeaconInstruction::DividendSubmit(decode_json(meta, payload)?)
            }
            MetadataType::BurningRequest
            | MetadataType::BurningConfirm
            | MetadataType::IssuingEthRequest => BeaconInstruction::Bridge { meta },
            MetadataType::CrowdsaleRequest => BeaconInstruction::Unrecognized(meta.tag()),
        })
    }
}

/// Build `[meta, shard_id, status, payload]`.
pub fn beacon_instruction(
    meta: MetadataType,
    shard_id: ShardId,
    status: InstructionStatus,
    payload: String,
) -> RawInstruction {
    vec![
        meta.tag(),
        shard_id.to_string(),
        status.as_str().to_string(),
        payload,
    ]
}
