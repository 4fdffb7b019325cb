//! Position transfer coordination and flow netting.
//!
//! The channel carries at most one flow per (token, borrower, holder). When a
//! holder owns several perpetual loans of the same borrower and token, their
//! rates are netted into that single flow and the loans are recorded as its
//! constituents. The expected rate of a flow is always recomputed from the
//! constituents, never kept as a running total.
//!
//! A constituent's stream-start marker is re-stamped whenever the shared flow
//! is written, because every write moves the flow timestamp.

use crate::events;
use crate::flow::{FlowController, Reduction};
use crate::oracle;
use crate::storage;
use crate::types::{Loan, LoanStatus};
use lendstream_errors::ContractError;
use soroban_sdk::{log, Address, Env, Vec};

pub fn is_constituent(
    env: &Env,
    loan_id: u64,
    token: &Address,
    borrower: &Address,
    holder: &Address,
) -> bool {
    storage::netting(env, token, borrower, holder).contains(loan_id)
}

/// True when the (token, borrower, holder) flow carries exactly `constituents`:
/// the flow exists, it was last written when they were stamped, and its rate
/// is the sum of their rates. Constituents share one marker, so they are in
/// sync or stale together.
pub fn in_sync(
    env: &Env,
    flows: &FlowController,
    token: &Address,
    borrower: &Address,
    holder: &Address,
    constituents: &Vec<u64>,
) -> Result<bool, ContractError> {
    if constituents.is_empty() {
        return Ok(false);
    }
    let Some(live) = flows.flow(token, borrower, holder) else {
        return Ok(false);
    };

    let mut total: i128 = 0;
    for loan_id in constituents.iter() {
        let loan = storage::load_loan(env, loan_id)?;
        if loan.stream_start() != live.timestamp {
            return Ok(false);
        }
        total = total
            .checked_add(loan.interest_by_the_second)
            .ok_or(ContractError::Overflow)?;
    }
    Ok(total == live.flow_rate)
}

/// Move the stream-start marker of every constituent to now. `loan` is the
/// in-flight copy of `loan_id`, which the caller persists.
fn restamp(
    env: &Env,
    loan_id: u64,
    loan: &mut Loan,
    constituents: &Vec<u64>,
) -> Result<(), ContractError> {
    let now = env.ledger().timestamp();
    for id in constituents.iter() {
        if id == loan_id {
            loan.mark_stream_start(now);
        } else {
            let mut other = storage::load_loan(env, id)?;
            other.mark_stream_start(now);
            storage::save_loan(env, id, &other);
        }
    }
    Ok(())
}

/// Add the loan's rate to the borrower -> holder flow and record it as a
/// constituent. Returns the new live rate.
///
/// Constituents whose flow went out of sync are defaulted and are dropped
/// first. The flow is then set to exactly the new loan's rate, so a stale
/// remainder never counts towards the new stream.
pub fn join(
    env: &Env,
    loan_id: u64,
    loan: &mut Loan,
    holder: &Address,
) -> Result<i128, ContractError> {
    let token = loan.asset.address.clone();
    let borrower = loan.borrower.clone();
    let rate = loan.interest_by_the_second;

    let flows = FlowController::load(env)?;
    let mut constituents = storage::netting(env, &token, &borrower, holder);

    let live_rate = if in_sync(env, &flows, &token, &borrower, holder, &constituents)? {
        flows.increase(&token, &borrower, holder, rate)?
    } else {
        if !constituents.is_empty() {
            log!(
                env,
                "dropping {} stale loans from flow to {}",
                constituents.len(),
                holder.clone()
            );
            constituents = Vec::new(env);
        }
        flows.reset(&token, &borrower, holder, rate)?;
        rate
    };

    constituents.push_back(loan_id);
    storage::set_netting(env, &token, &borrower, holder, &constituents);

    restamp(env, loan_id, loan, &constituents)?;
    Ok(live_rate)
}

/// Drop the loan from the borrower -> holder bookkeeping. With `settle`, its
/// rate is also taken out of the live flow.
pub fn leave(
    env: &Env,
    loan_id: u64,
    loan: &mut Loan,
    holder: &Address,
    settle: bool,
) -> Result<(), ContractError> {
    let token = loan.asset.address.clone();
    let borrower = loan.borrower.clone();

    let mut constituents = storage::netting(env, &token, &borrower, holder);
    let Some(index) = constituents.first_index_of(loan_id) else {
        return Ok(());
    };
    constituents.remove(index);
    storage::set_netting(env, &token, &borrower, holder, &constituents);

    if !settle {
        return Ok(());
    }

    let flows = FlowController::load(env)?;
    match flows.reduce(&token, &borrower, holder, loan.interest_by_the_second)? {
        Reduction::Deleted => {}
        Reduction::Decreased(remaining) => {
            log!(env, "loan {} left flow to {}, remaining rate {}", loan_id, holder.clone(), remaining);
            restamp(env, loan_id, loan, &constituents)?;
        }
        Reduction::Skipped { live_rate } => report_anomaly(env, loan_id, loan, holder, live_rate),
    }
    Ok(())
}

fn report_anomaly(env: &Env, loan_id: u64, loan: &Loan, holder: &Address, live_rate: i128) {
    log!(
        env,
        "loan {} flow to {} out of sync: live {} expected {}",
        loan_id,
        holder.clone(),
        live_rate,
        loan.interest_by_the_second
    );
    events::emit_stream_anomaly(env, loan_id, holder, live_rate, loan.interest_by_the_second);
}

/// Forget the loan's netting membership without touching the channel.
pub fn detach(env: &Env, loan_id: u64, loan: &mut Loan, holder: &Address) -> Result<(), ContractError> {
    leave(env, loan_id, loan, holder, false)
}

/// Stop carrying the loan's interest to `holder`. Only a running loan takes
/// its rate out of the flow. A stale one is detached, the flow is left as is
/// and the mismatch is reported.
pub fn end(env: &Env, loan_id: u64, loan: &mut Loan, holder: &Address) -> Result<(), ContractError> {
    if oracle::derive_status(env, loan_id, loan, holder)? == LoanStatus::Running {
        return leave(env, loan_id, loan, holder, true);
    }

    detach(env, loan_id, loan, holder)?;
    let live_rate = FlowController::load(env)?
        .flow(&loan.asset.address, &loan.borrower, holder)
        .map(|f| f.flow_rate)
        .unwrap_or(0);
    report_anomaly(env, loan_id, loan, holder, live_rate);
    Ok(())
}

/// Hook run before every holder change of a position unit, including mint
/// (`from == None`) and burn (`to == None`).
///
/// Interest follows the position only while the loan is running for the
/// previous holder. A stopped or repaid loan is never revived by a transfer,
/// and no flow is opened to the borrower itself.
pub fn on_position_transfer(
    env: &Env,
    loan_id: u64,
    loan: &mut Loan,
    from: Option<&Address>,
    to: Option<&Address>,
) -> Result<(), ContractError> {
    if !loan.is_perpetual() {
        return Ok(());
    }

    let was_running = match from {
        Some(from) => oracle::derive_status(env, loan_id, loan, from)? == LoanStatus::Running,
        None => false,
    };

    if let Some(from) = from {
        leave(env, loan_id, loan, from, was_running)?;
    }

    if was_running {
        if let Some(to) = to {
            if *to != loan.borrower {
                join(env, loan_id, loan, to)?;
            }
        }
    }
    Ok(())
}
