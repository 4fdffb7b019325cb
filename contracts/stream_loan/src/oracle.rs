//! Effective loan status.
//!
//! The stored status is only a hint for perpetual loans. A perpetual loan is
//! running exactly while the channel carries its interest to the current
//! holder, so the answer is recomputed from the live flow on every read.

use crate::coordinator;
use crate::flow::FlowController;
use crate::storage;
use crate::types::{Loan, LoanStatus};
use lendstream_errors::ContractError;
use soroban_sdk::{Address, Env};

/// Derive the status of `loan` as seen by `holder`.
pub fn derive_status(
    env: &Env,
    loan_id: u64,
    loan: &Loan,
    holder: &Address,
) -> Result<LoanStatus, ContractError> {
    if loan.status == LoanStatus::None {
        return Ok(LoanStatus::None);
    }

    if !loan.is_perpetual() {
        if loan.expiration <= env.ledger().timestamp() && loan.status != LoanStatus::PaidBack {
            return Ok(LoanStatus::Expired);
        }
        return Ok(loan.status);
    }

    if is_streaming(env, loan_id, loan, holder)? {
        return Ok(LoanStatus::Running);
    }
    if loan.status == LoanStatus::PaidBack {
        Ok(LoanStatus::PaidBack)
    } else {
        Ok(LoanStatus::Expired)
    }
}

/// True when the loan is netted into the borrower -> holder flow and that flow
/// still carries exactly its constituents.
fn is_streaming(
    env: &Env,
    loan_id: u64,
    loan: &Loan,
    holder: &Address,
) -> Result<bool, ContractError> {
    let token = &loan.asset.address;
    let constituents = storage::netting(env, token, &loan.borrower, holder);
    if !constituents.contains(loan_id) {
        return Ok(false);
    }

    let flows = FlowController::load(env)?;
    match flows.flow(token, &loan.borrower, holder) {
        Some(live) if live.timestamp == loan.stream_start() => {
            coordinator::in_sync(env, &flows, token, &loan.borrower, holder, &constituents)
        }
        _ => Ok(false),
    }
}
