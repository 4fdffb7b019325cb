//! Position token ledger.
//!
//! Every loan id has a supply of exactly one unit. Its holder is the economic
//! owner of the loan and the receiver of its interest flow. All movements run
//! the coordinator hook before the holder changes.

use crate::coordinator;
use crate::events;
use crate::storage;
use crate::types::Loan;
use lendstream_errors::ContractError;
use soroban_sdk::{Address, Env};

/// Holder that currently owns the unit of `loan_id`.
pub fn holder_of(env: &Env, loan_id: u64) -> Result<Address, ContractError> {
    storage::holder(env, loan_id).ok_or(ContractError::LoanNotFound)
}

pub fn require_holder(env: &Env, loan_id: u64, holder: &Address) -> Result<(), ContractError> {
    if holder_of(env, loan_id)? != *holder {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

pub fn balance(env: &Env, owner: &Address, loan_id: u64) -> u32 {
    match storage::holder(env, loan_id) {
        Some(holder) if holder == *owner => 1,
        _ => 0,
    }
}

/// Issue the unit of a new loan to `to`.
pub fn mint(env: &Env, loan_id: u64, loan: &mut Loan, to: &Address) -> Result<(), ContractError> {
    coordinator::on_position_transfer(env, loan_id, loan, None, Some(to))?;
    storage::set_holder(env, loan_id, Some(to));
    Ok(())
}

/// Move the unit between holders, retargeting a live interest flow.
pub fn transfer(env: &Env, loan_id: u64, from: &Address, to: &Address) -> Result<(), ContractError> {
    require_holder(env, loan_id, from)?;
    if from == to {
        return Err(ContractError::InvalidTransfer);
    }

    let mut loan = storage::load_loan(env, loan_id)?;
    coordinator::on_position_transfer(env, loan_id, &mut loan, Some(from), Some(to))?;
    storage::save_loan(env, loan_id, &loan);
    storage::set_holder(env, loan_id, Some(to));

    events::emit_position_transfer(env, loan_id, from, to);
    Ok(())
}

/// Destroy the unit held by `from`.
pub fn burn(env: &Env, loan_id: u64, loan: &mut Loan, from: &Address) -> Result<(), ContractError> {
    coordinator::on_position_transfer(env, loan_id, loan, Some(from), None)?;
    storage::set_holder(env, loan_id, None);
    Ok(())
}
