//! Constant Flow Agreement
//!
//! A continuous-payment channel: a sender streams a token to a receiver at a
//! fixed per-second rate until the flow is updated or deleted. The lending
//! core treats this contract as an external collaborator and only creates,
//! updates, deletes and reads flows through it.
//!
//! ## Key design decisions
//!
//! - **One flow per ordered pair**: a (token, sender, receiver) triple carries
//!   at most one flow. Callers that need several logical streams between the
//!   same parties must net them into a single rate.
//! - **Timestamp = last write**: `FlowInfo.timestamp` moves on every create and
//!   update, so readers can tell a continuous flow from a recreated one.
//! - **Operator permissions**: a sender may authorize another address (usually
//!   a contract) to manage its flows for one token.
//! - **Either side may stop**: sender or receiver can delete a flow.
//!
//! Balances are not settled here; token custody stays with the token contract.

#![no_std]

mod events;
mod types;

pub use lendstream_errors::ContractError;
pub use types::FlowInfo;
use types::DataKey;

use soroban_sdk::{contract, contractimpl, Address, Env};

#[cfg(test)]
mod test_helpers;


/// Minimum ledger TTL before a bump is requested (~1 day at 5 s/ledger).
const BUMP_THRESHOLD: u32 = 17_280;
/// Target TTL after a bump (~30 days).
const BUMP_TARGET: u32 = 518_400;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn load_flow(e: &Env, token: &Address, sender: &Address, receiver: &Address) -> Option<FlowInfo> {
    e.storage()
        .persistent()
        .get(&DataKey::Flow(token.clone(), sender.clone(), receiver.clone()))
}

fn save_flow(e: &Env, token: &Address, sender: &Address, receiver: &Address, flow: &FlowInfo) {
    let key = DataKey::Flow(token.clone(), sender.clone(), receiver.clone());
    e.storage().persistent().set(&key, flow);
    e.storage()
        .persistent()
        .extend_ttl(&key, BUMP_THRESHOLD, BUMP_TARGET);
}

fn net_flow(e: &Env, token: &Address, account: &Address) -> i128 {
    e.storage()
        .persistent()
        .get(&DataKey::NetFlow(token.clone(), account.clone()))
        .unwrap_or(0)
}

fn adjust_net_flow(
    e: &Env,
    token: &Address,
    account: &Address,
    delta: i128,
) -> Result<(), ContractError> {
    let updated = net_flow(e, token, account)
        .checked_add(delta)
        .ok_or(ContractError::Overflow)?;
    let key = DataKey::NetFlow(token.clone(), account.clone());
    if updated == 0 {
        e.storage().persistent().remove(&key);
    } else {
        e.storage().persistent().set(&key, &updated);
        e.storage()
            .persistent()
            .extend_ttl(&key, BUMP_THRESHOLD, BUMP_TARGET);
    }
    Ok(())
}

/// Move `rate` of net flow from `sender` to `receiver` (negative moves it back).
fn shift_net_flow(
    e: &Env,
    token: &Address,
    sender: &Address,
    receiver: &Address,
    rate: i128,
) -> Result<(), ContractError> {
    let outgoing = rate.checked_neg().ok_or(ContractError::Overflow)?;
    adjust_net_flow(e, token, sender, outgoing)?;
    adjust_net_flow(e, token, receiver, rate)
}

fn require_operator(
    e: &Env,
    operator: &Address,
    token: &Address,
    sender: &Address,
) -> Result<(), ContractError> {
    operator.require_auth();
    let permitted: bool = e
        .storage()
        .persistent()
        .get(&DataKey::Operator(
            token.clone(),
            sender.clone(),
            operator.clone(),
        ))
        .unwrap_or(false);
    if !permitted {
        return Err(ContractError::OperatorNotAuthorized);
    }
    Ok(())
}

fn open_flow(
    e: &Env,
    token: &Address,
    sender: &Address,
    receiver: &Address,
    flow_rate: i128,
) -> Result<(), ContractError> {
    if sender == receiver {
        return Err(ContractError::SelfFlow);
    }
    if flow_rate <= 0 {
        return Err(ContractError::InvalidFlowRate);
    }
    if load_flow(e, token, sender, receiver).is_some() {
        return Err(ContractError::FlowAlreadyExists);
    }

    shift_net_flow(e, token, sender, receiver, flow_rate)?;
    let flow = FlowInfo {
        timestamp: e.ledger().timestamp(),
        flow_rate,
    };
    save_flow(e, token, sender, receiver, &flow);

    events::emit_flow_updated(e, token, sender, receiver, 0, flow_rate);
    Ok(())
}

fn change_flow(
    e: &Env,
    token: &Address,
    sender: &Address,
    receiver: &Address,
    flow_rate: i128,
) -> Result<(), ContractError> {
    if flow_rate <= 0 {
        return Err(ContractError::InvalidFlowRate);
    }
    let existing =
        load_flow(e, token, sender, receiver).ok_or(ContractError::FlowNotFound)?;

    let delta = flow_rate
        .checked_sub(existing.flow_rate)
        .ok_or(ContractError::Overflow)?;
    shift_net_flow(e, token, sender, receiver, delta)?;
    let flow = FlowInfo {
        timestamp: e.ledger().timestamp(),
        flow_rate,
    };
    save_flow(e, token, sender, receiver, &flow);

    events::emit_flow_updated(e, token, sender, receiver, existing.flow_rate, flow_rate);
    Ok(())
}

fn close_flow(
    e: &Env,
    token: &Address,
    sender: &Address,
    receiver: &Address,
) -> Result<(), ContractError> {
    let existing =
        load_flow(e, token, sender, receiver).ok_or(ContractError::FlowNotFound)?;

    let refund = existing
        .flow_rate
        .checked_neg()
        .ok_or(ContractError::Overflow)?;
    shift_net_flow(e, token, sender, receiver, refund)?;
    e.storage().persistent().remove(&DataKey::Flow(
        token.clone(),
        sender.clone(),
        receiver.clone(),
    ));

    events::emit_flow_updated(e, token, sender, receiver, existing.flow_rate, 0);
    Ok(())
}

// ─── Contract ──────────────────────────────────────────────────────────────

#[contract]
pub struct FlowAgreement;

#[contractimpl]
impl FlowAgreement {
    // ── Operator permissions ───────────────────────────────────────────────

    /// Allow `operator` to create, update and delete `sender`'s flows of `token`.
    pub fn authorize_operator(e: Env, sender: Address, token: Address, operator: Address) {
        sender.require_auth();
        let key = DataKey::Operator(token.clone(), sender.clone(), operator.clone());
        e.storage().persistent().set(&key, &true);
        e.storage()
            .persistent()
            .extend_ttl(&key, BUMP_THRESHOLD, BUMP_TARGET);
        events::emit_operator_set(&e, &token, &sender, &operator, true);
    }

    /// Withdraw a previously granted operator permission.
    pub fn revoke_operator(e: Env, sender: Address, token: Address, operator: Address) {
        sender.require_auth();
        e.storage().persistent().remove(&DataKey::Operator(
            token.clone(),
            sender.clone(),
            operator.clone(),
        ));
        events::emit_operator_set(&e, &token, &sender, &operator, false);
    }

    pub fn is_operator(e: Env, token: Address, sender: Address, operator: Address) -> bool {
        e.storage()
            .persistent()
            .get(&DataKey::Operator(token, sender, operator))
            .unwrap_or(false)
    }

    // ── Sender-driven flows ────────────────────────────────────────────────

    /// Open a flow of `flow_rate` per second from `sender` to `receiver`.
    ///
    /// # Errors
    /// * `SelfFlow` - sender and receiver are the same
    /// * `InvalidFlowRate` - `flow_rate <= 0`
    /// * `FlowAlreadyExists` - the pair already has a flow for `token`
    pub fn create_flow(
        e: Env,
        token: Address,
        sender: Address,
        receiver: Address,
        flow_rate: i128,
    ) -> Result<(), ContractError> {
        sender.require_auth();
        open_flow(&e, &token, &sender, &receiver, flow_rate)
    }

    /// Replace the rate of an existing flow. Restamps the flow timestamp.
    pub fn update_flow(
        e: Env,
        token: Address,
        sender: Address,
        receiver: Address,
        flow_rate: i128,
    ) -> Result<(), ContractError> {
        sender.require_auth();
        change_flow(&e, &token, &sender, &receiver, flow_rate)
    }

    /// Stop a flow. Either the sender or the receiver may call this.
    pub fn delete_flow(
        e: Env,
        caller: Address,
        token: Address,
        sender: Address,
        receiver: Address,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        if caller != sender && caller != receiver {
            return Err(ContractError::Unauthorized);
        }
        close_flow(&e, &token, &sender, &receiver)
    }

    // ── Operator-driven flows ──────────────────────────────────────────────

    pub fn create_flow_by_operator(
        e: Env,
        operator: Address,
        token: Address,
        sender: Address,
        receiver: Address,
        flow_rate: i128,
    ) -> Result<(), ContractError> {
        require_operator(&e, &operator, &token, &sender)?;
        open_flow(&e, &token, &sender, &receiver, flow_rate)
    }

    pub fn update_flow_by_operator(
        e: Env,
        operator: Address,
        token: Address,
        sender: Address,
        receiver: Address,
        flow_rate: i128,
    ) -> Result<(), ContractError> {
        require_operator(&e, &operator, &token, &sender)?;
        change_flow(&e, &token, &sender, &receiver, flow_rate)
    }

    pub fn delete_flow_by_operator(
        e: Env,
        operator: Address,
        token: Address,
        sender: Address,
        receiver: Address,
    ) -> Result<(), ContractError> {
        require_operator(&e, &operator, &token, &sender)?;
        close_flow(&e, &token, &sender, &receiver)
    }

    // ── Queries ────────────────────────────────────────────────────────────

    /// Returns the live flow from `sender` to `receiver`, if any.
    pub fn get_flow(e: Env, token: Address, sender: Address, receiver: Address) -> Option<FlowInfo> {
        load_flow(&e, &token, &sender, &receiver)
    }

    /// Returns inflow minus outflow rate of `account` for `token`.
    pub fn get_net_flow(e: Env, token: Address, account: Address) -> i128 {
        net_flow(&e, &token, &account)
    }
}
