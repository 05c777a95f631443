//! # Metadata Types
//!
//! Position 0 of a non-reserved instruction is the decimal code of one of
//! these types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known instruction metadata types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum MetadataType {
    /// Crowdsale purchase request from a shard.
    CrowdsaleRequest = 10,
    /// Beacon decision on a crowdsale request.
    CrowdsalePayment = 11,
    /// Bond purchase from the GOV selling pool.
    BuyFromGovRequest = 12,
    /// GOV token purchase.
    BuyGovTokenRequest = 13,
    /// Matured bond buy-back.
    BuyBackRequest = 14,
    /// New loan.
    LoanRequest = 20,
    /// Loan approval from a board member.
    LoanResponse = 21,
    /// Asset issuing.
    IssuingRequest = 24,
    /// Asset contracting.
    ContractingRequest = 26,
    /// Bridge token burn.
    BurningRequest = 27,
    /// Per-shard dividend token count.
    DividendSubmit = 30,
    /// Beacon confirmation of a bridge burn.
    BurningConfirm = 72,
    /// Issuing backed by an external chain deposit.
    IssuingEthRequest = 80,
}

impl MetadataType {
    const ALL: [MetadataType; 13] = [
        MetadataType::CrowdsaleRequest,
        MetadataType::CrowdsalePayment,
        MetadataType::BuyFromGovRequest,
        MetadataType::BuyGovTokenRequest,
        MetadataType::BuyBackRequest,
        MetadataType::LoanRequest,
        MetadataType::LoanResponse,
        MetadataType::IssuingRequest,
        MetadataType::ContractingRequest,
        MetadataType::BurningRequest,
        MetadataType::DividendSubmit,
        MetadataType::BurningConfirm,
        MetadataType::IssuingEthRequest,
    ];

    /// Numeric code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Type for a numeric code.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Code as carried in position 0.
    pub fn tag(self) -> String {
        self.code().to_string()
    }
}

impl fmt::Display for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Outcome recorded by the producer in position 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionStatus {
    /// Request honoured.
    Accepted,
    /// Request rejected; the payer is refunded.
    Refund,
}

impl InstructionStatus {
    /// Wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            InstructionStatus::Accepted => "accepted",
            InstructionStatus::Refund => "refund",
        }
    }

    /// Parse the wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accepted" => Some(InstructionStatus::Accepted),
            "refund" => Some(InstructionStatus::Refund),
            _ => None,
        }
    }
}
