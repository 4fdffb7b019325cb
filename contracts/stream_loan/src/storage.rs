//! Storage layout and typed accessors.
//!
//! | Key                                  | Tier           | Lifecycle        |
//! |--------------------------------------|----------------|------------------|
//! | `Admin`, `Orchestrator`, `FlowAgreement`, `LoanCounter` | `instance()` | Entire contract |
//! | `Loan(id)`, `Holder(id)`             | `persistent()` | Until burned     |
//! | `OfferRevoked(hash)`                 | `persistent()` | Forever          |
//! | `Netting(token, borrower, holder)`   | `persistent()` | While streaming  |

use crate::types::Loan;
use lendstream_errors::ContractError;
use soroban_sdk::{contracttype, Address, BytesN, Env, Vec};

/// Minimum ledger TTL before a bump is requested (~1 day at 5 s/ledger).
const BUMP_THRESHOLD: u32 = 17_280;
/// Target TTL after a bump (~30 days).
const BUMP_TARGET: u32 = 518_400;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    /// Only address allowed to drive lifecycle transitions.
    Orchestrator,
    /// Continuous-payment channel contract.
    FlowAgreement,
    /// Last allocated loan id. Ids start at 1 and are never reused.
    LoanCounter,
    Loan(u64),
    /// Current holder of the single position unit of a loan.
    Holder(u64),
    /// Offer hash -> revoked/consumed flag.
    OfferRevoked(BytesN<32>),
    /// Loans whose interest is carried by the (token, borrower, holder) flow.
    Netting(Address, Address, Address),
}

// ─── Configuration ─────────────────────────────────────────────────────────

pub fn is_initialized(e: &Env) -> bool {
    e.storage().instance().has(&DataKey::Admin)
}

pub fn admin(e: &Env) -> Result<Address, ContractError> {
    e.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(ContractError::NotInitialized)
}

pub fn orchestrator(e: &Env) -> Result<Address, ContractError> {
    e.storage()
        .instance()
        .get(&DataKey::Orchestrator)
        .ok_or(ContractError::NotInitialized)
}

pub fn flow_agreement(e: &Env) -> Result<Address, ContractError> {
    e.storage()
        .instance()
        .get(&DataKey::FlowAgreement)
        .ok_or(ContractError::NotInitialized)
}

pub fn set_config(e: &Env, admin: &Address, orchestrator: &Address, flow_agreement: &Address) {
    e.storage().instance().set(&DataKey::Admin, admin);
    e.storage().instance().set(&DataKey::Orchestrator, orchestrator);
    e.storage()
        .instance()
        .set(&DataKey::FlowAgreement, flow_agreement);
    e.storage().instance().set(&DataKey::LoanCounter, &0_u64);
}

pub fn set_orchestrator(e: &Env, orchestrator: &Address) {
    e.storage().instance().set(&DataKey::Orchestrator, orchestrator);
}

pub fn loan_count(e: &Env) -> u64 {
    e.storage()
        .instance()
        .get(&DataKey::LoanCounter)
        .unwrap_or(0)
}

pub fn next_loan_id(e: &Env) -> Result<u64, ContractError> {
    let id = loan_count(e)
        .checked_add(1)
        .ok_or(ContractError::Overflow)?;
    e.storage().instance().set(&DataKey::LoanCounter, &id);
    Ok(id)
}

// ─── Loans ─────────────────────────────────────────────────────────────────

/// Read a loan record and bump its TTL.
pub fn load_loan(e: &Env, loan_id: u64) -> Result<Loan, ContractError> {
    let key = DataKey::Loan(loan_id);
    let storage = e.storage().persistent();
    let loan: Loan = storage.get(&key).ok_or(ContractError::LoanNotFound)?;
    storage.extend_ttl(&key, BUMP_THRESHOLD, BUMP_TARGET);
    Ok(loan)
}

pub fn try_load_loan(e: &Env, loan_id: u64) -> Option<Loan> {
    e.storage().persistent().get(&DataKey::Loan(loan_id))
}

pub fn save_loan(e: &Env, loan_id: u64, loan: &Loan) {
    let key = DataKey::Loan(loan_id);
    e.storage().persistent().set(&key, loan);
    e.storage()
        .persistent()
        .extend_ttl(&key, BUMP_THRESHOLD, BUMP_TARGET);
}

pub fn remove_loan(e: &Env, loan_id: u64) {
    e.storage().persistent().remove(&DataKey::Loan(loan_id));
}

// ─── Position holders ──────────────────────────────────────────────────────

pub fn holder(e: &Env, loan_id: u64) -> Option<Address> {
    e.storage().persistent().get(&DataKey::Holder(loan_id))
}

pub fn set_holder(e: &Env, loan_id: u64, holder: Option<&Address>) {
    let key = DataKey::Holder(loan_id);
    match holder {
        Some(holder) => {
            e.storage().persistent().set(&key, holder);
            e.storage()
                .persistent()
                .extend_ttl(&key, BUMP_THRESHOLD, BUMP_TARGET);
        }
        None => e.storage().persistent().remove(&key),
    }
}

// ─── Offer hash registry ───────────────────────────────────────────────────

pub fn is_offer_revoked(e: &Env, offer_hash: &BytesN<32>) -> bool {
    e.storage()
        .persistent()
        .get(&DataKey::OfferRevoked(offer_hash.clone()))
        .unwrap_or(false)
}

pub fn mark_offer_revoked(e: &Env, offer_hash: &BytesN<32>) {
    let key = DataKey::OfferRevoked(offer_hash.clone());
    e.storage().persistent().set(&key, &true);
    e.storage()
        .persistent()
        .extend_ttl(&key, BUMP_THRESHOLD, BUMP_TARGET);
}

// ─── Netted flows ──────────────────────────────────────────────────────────

pub fn netting(e: &Env, token: &Address, borrower: &Address, holder: &Address) -> Vec<u64> {
    e.storage()
        .persistent()
        .get(&DataKey::Netting(
            token.clone(),
            borrower.clone(),
            holder.clone(),
        ))
        .unwrap_or_else(|| Vec::new(e))
}

pub fn set_netting(
    e: &Env,
    token: &Address,
    borrower: &Address,
    holder: &Address,
    loans: &Vec<u64>,
) {
    let key = DataKey::Netting(token.clone(), borrower.clone(), holder.clone());
    if loans.is_empty() {
        e.storage().persistent().remove(&key);
    } else {
        e.storage().persistent().set(&key, loans);
        e.storage()
            .persistent()
            .extend_ttl(&key, BUMP_THRESHOLD, BUMP_TARGET);
    }
}
