//! Params store key layout.

/// Sale record.
pub fn sale(sale_id: &str) -> String {
    format!("sale/{}", sale_id)
}

/// Bond selling pool after sales.
pub fn sold_bonds(bond_id: &str) -> String {
    format!("bonds/sold/{}", bond_id)
}

/// Accepted loan request.
pub fn loan_request(loan_id: &str) -> String {
    format!("loan/request/{}", loan_id)
}

/// Responses collected for a loan.
pub fn loan_responses(loan_id: &str) -> String {
    format!("loan/responses/{}", loan_id)
}

/// Per-shard token totals of a dividend round.
pub fn dividend_aggregation(dividend_id: u64, token_id: &str) -> String {
    format!("dividend/{}/{}", dividend_id, token_id)
}

/// Completed dividend round.
pub fn dividend_payout(dividend_id: u64, token_id: &str) -> String {
    format!("dividend/{}/{}/payout", dividend_id, token_id)
}

