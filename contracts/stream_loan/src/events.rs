use soroban_sdk::{Address, BytesN, Env, Symbol};

/// Emitted once by `initialize`.
pub fn emit_initialized(e: &Env, admin: &Address, orchestrator: &Address, flow_agreement: &Address) {
    let topics = (Symbol::new(e, "initialized"),);
    let data = (admin.clone(), orchestrator.clone(), flow_agreement.clone());
    e.events().publish(topics, data);
}

pub fn emit_orchestrator_set(e: &Env, orchestrator: &Address) {
    e.events()
        .publish((Symbol::new(e, "orchestrator_set"),), orchestrator.clone());
}

/// Emitted when a signed offer is accepted and a loan is opened.
///
/// # Topics
/// * `Symbol` - "loan_created"
/// * `u64` - The new loan id
///
/// # Data
/// * `Address` - The lender (first position holder)
/// * `BytesN<32>` - The accepted offer hash
pub fn emit_loan_created(e: &Env, loan_id: u64, lender: &Address, offer_hash: &BytesN<32>) {
    let topics = (Symbol::new(e, "loan_created"), loan_id);
    let data = (lender.clone(), offer_hash.clone());
    e.events().publish(topics, data);
}

/// Emitted when a lender withdraws an unaccepted offer.
///
/// # Topics
/// * `Symbol` - "offer_revoked"
///
/// # Data
/// * `BytesN<32>` - The revoked offer hash
pub fn emit_offer_revoked(e: &Env, offer_hash: &BytesN<32>) {
    e.events()
        .publish((Symbol::new(e, "offer_revoked"),), offer_hash.clone());
}

pub fn emit_loan_repaid(e: &Env, loan_id: u64) {
    e.events()
        .publish((Symbol::new(e, "loan_repaid"), loan_id), ());
}

pub fn emit_loan_claimed(e: &Env, loan_id: u64, holder: &Address) {
    e.events()
        .publish((Symbol::new(e, "loan_claimed"), loan_id), holder.clone());
}

pub fn emit_loan_burned(e: &Env, loan_id: u64, holder: &Address) {
    e.events()
        .publish((Symbol::new(e, "loan_burned"), loan_id), holder.clone());
}

/// Emitted on every holder-to-holder move of a position unit.
///
/// # Topics
/// * `Symbol` - "position_transfer"
/// * `u64` - The loan id
///
/// # Data
/// * `Address` - Previous holder
/// * `Address` - New holder
pub fn emit_position_transfer(e: &Env, loan_id: u64, from: &Address, to: &Address) {
    let topics = (Symbol::new(e, "position_transfer"), loan_id);
    e.events().publish(topics, (from.clone(), to.clone()));
}

pub fn emit_stream_started(e: &Env, loan_id: u64, holder: &Address, rate: i128) {
    let topics = (Symbol::new(e, "stream_started"), loan_id);
    e.events().publish(topics, (holder.clone(), rate));
}

pub fn emit_stream_ended(e: &Env, loan_id: u64, holder: &Address, rate: i128) {
    let topics = (Symbol::new(e, "stream_ended"), loan_id);
    e.events().publish(topics, (holder.clone(), rate));
}

/// Emitted when a flow that should carry a loan's interest is already below
/// the loan rate, so it is left untouched.
///
/// # Data
/// * `Address` - Holder whose incoming flow was inspected
/// * `i128` - Live rate observed
/// * `i128` - Rate the loan expected to remove
pub fn emit_stream_anomaly(e: &Env, loan_id: u64, holder: &Address, live_rate: i128, expected: i128) {
    let topics = (Symbol::new(e, "stream_anomaly"), loan_id);
    e.events()
        .publish(topics, (holder.clone(), live_rate, expected));
}
