//! Stream Loan
//!
//! Collateralized loans opened from lender-signed offers. Fixed-duration loans
//! repay principal plus a lump-sum yield before a deadline. Perpetual loans
//! have no deadline: interest is a continuous flow from the borrower to
//! whoever holds the loan's position unit, and the loan stays alive exactly as
//! long as that flow does.
//!
//! ## Key design decisions
//!
//! - **Orchestrator-gated lifecycle**: only the configured orchestrator can
//!   open, repay, claim, burn and start or stop streams. It moves funds and
//!   collateral; this contract keeps the records and the flows.
//! - **Derived status**: the status of a perpetual loan is recomputed from the
//!   live channel on every query, so a borrower who stops paying defaults
//!   without anyone writing to this contract.
//! - **Netted flows**: several loans between the same borrower and holder in
//!   the same token share one flow whose rate is the sum of theirs.
//! - **Interest follows the position**: transferring a running position moves
//!   its share of the flow from the old holder to the new one.
//! - **Repay then end the stream**: `repay_loan` only marks the loan; the
//!   orchestrator must call `end_stream` in the same transaction.
//! - **Channel trust**: the channel lets the receiver of a flow delete it too.
//!   A holder who stops its own incoming flow makes the loan read as defaulted
//!   and can then claim the collateral. Deployments rely on the channel or the
//!   orchestrator to refuse receiver-side stops of loan flows.

#![no_std]

mod authenticator;
mod coordinator;
mod events;
mod flow;
mod oracle;
mod position;
mod storage;
mod types;

pub use authenticator::{key_holder_address, VALID_SIGNATURE_MAGIC};
pub use flow::FlowInfo;
pub use lendstream_errors::ContractError;
pub use types::{
    Asset, AssetCategory, Loan, LoanStatus, Offer, OfferSignature, PERPETUAL_EXPIRATION,
};

use soroban_sdk::{contract, contractimpl, log, Address, BytesN, Env};


#[cfg(test)]
mod test_offer;




#[cfg(test)]
mod test_events;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn require_admin(e: &Env, admin: &Address) -> Result<(), ContractError> {
    admin.require_auth();
    if *admin != storage::admin(e)? {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

fn require_orchestrator(e: &Env, caller: &Address) -> Result<(), ContractError> {
    caller.require_auth();
    if *caller != storage::orchestrator(e)? {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

/// Reject offers whose terms cannot produce a well-formed loan.
fn validate_terms(offer: &Offer, borrower: &Address) -> Result<(), ContractError> {
    let perpetual = offer.duration == 0;
    if offer.principal <= 0
        || offer.yield_amount < 0
        || (perpetual && offer.yield_amount == 0)
        || offer.collateral.amount < 0
        || *borrower == offer.lender
    {
        return Err(ContractError::InvalidOffer);
    }
    Ok(())
}

fn loan_expiration(e: &Env, duration: u64) -> Result<u64, ContractError> {
    if duration == 0 {
        return Ok(PERPETUAL_EXPIRATION);
    }
    e.ledger()
        .timestamp()
        .checked_add(duration)
        .filter(|expiration| *expiration < PERPETUAL_EXPIRATION)
        .ok_or(ContractError::Overflow)
}

// ─── Contract ──────────────────────────────────────────────────────────────

#[contract]
pub struct StreamLoan;

#[contractimpl]
impl StreamLoan {
    // ── Configuration ──────────────────────────────────────────────────────

    /// One-time setup.
    ///
    /// # Arguments
    /// * `admin` - May replace the orchestrator later
    /// * `orchestrator` - Only caller allowed to drive loan lifecycles
    /// * `flow_agreement` - Continuous-payment channel carrying interest
    pub fn initialize(
        e: Env,
        admin: Address,
        orchestrator: Address,
        flow_agreement: Address,
    ) -> Result<(), ContractError> {
        if storage::is_initialized(&e) {
            return Err(ContractError::AlreadyInitialized);
        }
        admin.require_auth();
        storage::set_config(&e, &admin, &orchestrator, &flow_agreement);
        events::emit_initialized(&e, &admin, &orchestrator, &flow_agreement);
        Ok(())
    }

    pub fn set_orchestrator(e: Env, admin: Address, orchestrator: Address) -> Result<(), ContractError> {
        require_admin(&e, &admin)?;
        storage::set_orchestrator(&e, &orchestrator);
        events::emit_orchestrator_set(&e, &orchestrator);
        Ok(())
    }

    // ── Offers ─────────────────────────────────────────────────────────────

    /// Withdraw an offer. `signature` must be `signer`'s signature over
    /// `offer_hash`.
    ///
    /// # Errors
    /// * `InvalidSignature` - the signature belongs to a different key or the
    ///   signer's account rejected it
    /// * `AlreadyRevoked` - the hash was already revoked or accepted
    ///
    /// A forged or malformed ed25519 signature from the right key traps the
    /// invocation instead of returning `InvalidSignature`.
    pub fn revoke_offer(
        e: Env,
        caller: Address,
        offer_hash: BytesN<32>,
        signature: OfferSignature,
        signer: Address,
    ) -> Result<(), ContractError> {
        require_orchestrator(&e, &caller)?;
        authenticator::revoke(&e, &offer_hash, &signature, &signer)?;
        events::emit_offer_revoked(&e, &offer_hash);
        Ok(())
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    /// Accept a lender-signed offer on behalf of `borrower` and open a loan.
    /// The position unit goes to the lender.
    ///
    /// Returns the new loan id.
    ///
    /// # Errors
    /// * `InvalidOffer` - malformed terms or borrower is the lender
    /// * `Overflow` - the fixed deadline does not fit
    /// * `InvalidSignature`, `OfferExpired`, `OfferAlreadyUsed` - authentication
    ///
    /// A forged or malformed ed25519 signature from the lender's key traps the
    /// invocation instead of returning `InvalidSignature`.
    pub fn create_loan(
        e: Env,
        caller: Address,
        offer: Offer,
        signature: OfferSignature,
        borrower: Address,
    ) -> Result<u64, ContractError> {
        require_orchestrator(&e, &caller)?;
        validate_terms(&offer, &borrower)?;
        let expiration = loan_expiration(&e, offer.duration)?;

        let offer_hash = authenticator::accept(&e, &offer, &signature)?;
        let loan_id = storage::next_loan_id(&e)?;

        let perpetual = offer.duration == 0;
        let (loan_repay_amount, interest_by_the_second) = if perpetual {
            (offer.principal, offer.yield_amount)
        } else {
            let repay = offer
                .principal
                .checked_add(offer.yield_amount)
                .ok_or(ContractError::Overflow)?;
            (repay, 0)
        };

        let mut loan = Loan {
            status: LoanStatus::Running,
            borrower,
            duration: offer.duration,
            expiration,
            collateral: offer.collateral,
            asset: Asset {
                address: offer.loan_token,
                category: AssetCategory::Fungible,
                amount: offer.principal,
                id: 0,
            },
            loan_repay_amount,
            interest_by_the_second,
        };

        position::mint(&e, loan_id, &mut loan, &offer.lender)?;
        storage::save_loan(&e, loan_id, &loan);

        log!(&e, "loan {} opened, perpetual: {}", loan_id, perpetual);
        events::emit_loan_created(&e, loan_id, &offer.lender, &offer_hash);
        Ok(loan_id)
    }

    /// Mark a running loan as paid back. Funds move outside this contract.
    pub fn repay_loan(e: Env, caller: Address, loan_id: u64, holder: Address) -> Result<(), ContractError> {
        require_orchestrator(&e, &caller)?;
        let mut loan = storage::load_loan(&e, loan_id)?;
        position::require_holder(&e, loan_id, &holder)?;

        if oracle::derive_status(&e, loan_id, &loan, &holder)? != LoanStatus::Running {
            return Err(ContractError::NotRepayable);
        }

        loan.status = LoanStatus::PaidBack;
        storage::save_loan(&e, loan_id, &loan);
        events::emit_loan_repaid(&e, loan_id);
        Ok(())
    }

    /// Close out a repaid or defaulted loan for its holder.
    pub fn claim(e: Env, caller: Address, loan_id: u64, holder: Address) -> Result<(), ContractError> {
        require_orchestrator(&e, &caller)?;
        holder.require_auth();
        let mut loan = storage::load_loan(&e, loan_id)?;

        if position::holder_of(&e, loan_id)? != holder {
            return Err(ContractError::NotClaimable);
        }
        match oracle::derive_status(&e, loan_id, &loan, &holder)? {
            LoanStatus::PaidBack | LoanStatus::Expired => {}
            _ => return Err(ContractError::NotClaimable),
        }

        coordinator::detach(&e, loan_id, &mut loan, &holder)?;
        loan.status = LoanStatus::None;
        storage::save_loan(&e, loan_id, &loan);
        events::emit_loan_claimed(&e, loan_id, &holder);
        Ok(())
    }

    /// Destroy a claimed loan and its position unit.
    pub fn burn(e: Env, caller: Address, loan_id: u64, holder: Address) -> Result<(), ContractError> {
        require_orchestrator(&e, &caller)?;
        holder.require_auth();
        let mut loan = storage::load_loan(&e, loan_id)?;

        if position::holder_of(&e, loan_id)? != holder || loan.status != LoanStatus::None {
            return Err(ContractError::NotBurnable);
        }

        position::burn(&e, loan_id, &mut loan, &holder)?;
        storage::remove_loan(&e, loan_id);
        events::emit_loan_burned(&e, loan_id, &holder);
        Ok(())
    }

    // ── Interest streams ───────────────────────────────────────────────────

    /// Start the interest flow of a running perpetual loan towards its holder.
    /// The borrower must have made this contract a flow operator on the
    /// channel for the loan token.
    ///
    /// # Errors
    /// * `Unauthorized` - `holder` does not hold the position
    /// * `NotPerpetual` - fixed-duration loans carry no stream
    /// * `LoanNotRunning` - the loan was repaid or claimed
    /// * `SelfFlow` - the borrower holds its own position
    /// * `StreamAlreadyActive` - the loan already streams to `holder`
    /// * `OperatorNotAuthorized` - the channel refused the flow write
    pub fn begin_stream(e: Env, caller: Address, loan_id: u64, holder: Address) -> Result<(), ContractError> {
        require_orchestrator(&e, &caller)?;
        let mut loan = storage::load_loan(&e, loan_id)?;
        position::require_holder(&e, loan_id, &holder)?;

        if !loan.is_perpetual() {
            return Err(ContractError::NotPerpetual);
        }
        if loan.status != LoanStatus::Running {
            return Err(ContractError::LoanNotRunning);
        }
        if holder == loan.borrower {
            return Err(ContractError::SelfFlow);
        }
        if coordinator::is_constituent(&e, loan_id, &loan.asset.address, &loan.borrower, &holder) {
            return Err(ContractError::StreamAlreadyActive);
        }

        let live_rate = coordinator::join(&e, loan_id, &mut loan, &holder)?;
        storage::save_loan(&e, loan_id, &loan);

        log!(&e, "loan {} streaming, netted rate {}", loan_id, live_rate);
        events::emit_stream_started(&e, loan_id, &holder, loan.interest_by_the_second);
        Ok(())
    }

    /// Take the loan's rate out of the flow to its holder. A loan whose flow
    /// already went out of sync is only detached; the live flow is left to the
    /// loans still running on it.
    ///
    /// # Errors
    /// * `Unauthorized` - `holder` does not hold the position
    /// * `StreamNotActive` - the loan is not netted into a flow to `holder`
    /// * `OperatorNotAuthorized` - the channel refused the flow write
    pub fn end_stream(e: Env, caller: Address, loan_id: u64, holder: Address) -> Result<(), ContractError> {
        require_orchestrator(&e, &caller)?;
        let mut loan = storage::load_loan(&e, loan_id)?;
        position::require_holder(&e, loan_id, &holder)?;

        if !coordinator::is_constituent(&e, loan_id, &loan.asset.address, &loan.borrower, &holder) {
            return Err(ContractError::StreamNotActive);
        }

        coordinator::end(&e, loan_id, &mut loan, &holder)?;
        storage::save_loan(&e, loan_id, &loan);
        events::emit_stream_ended(&e, loan_id, &holder, loan.interest_by_the_second);
        Ok(())
    }

    // ── Position token ─────────────────────────────────────────────────────

    /// Move the position unit of `loan_id`. A running interest flow follows it.
    ///
    /// # Errors
    /// * `Unauthorized` - `from` does not hold the position
    /// * `InvalidTransfer` - `from` and `to` are the same account
    /// * `OperatorNotAuthorized` - the flow could not be moved on the channel
    pub fn transfer(e: Env, from: Address, to: Address, loan_id: u64) -> Result<(), ContractError> {
        from.require_auth();
        position::transfer(&e, loan_id, &from, &to)
    }

    pub fn holder_of(e: Env, loan_id: u64) -> Result<Address, ContractError> {
        position::holder_of(&e, loan_id)
    }

    pub fn balance(e: Env, owner: Address, loan_id: u64) -> u32 {
        position::balance(&e, &owner, loan_id)
    }

    // ── Queries ────────────────────────────────────────────────────────────

    /// Effective status, recomputed from the live flow for perpetual loans.
    /// Unknown loans report `None`.
    pub fn get_status(e: Env, loan_id: u64) -> Result<LoanStatus, ContractError> {
        let Some(loan) = storage::try_load_loan(&e, loan_id) else {
            return Ok(LoanStatus::None);
        };
        let Some(holder) = storage::holder(&e, loan_id) else {
            return Ok(LoanStatus::None);
        };
        oracle::derive_status(&e, loan_id, &loan, &holder)
    }

    pub fn get_loan(e: Env, loan_id: u64) -> Result<Loan, ContractError> {
        storage::load_loan(&e, loan_id)
    }

    pub fn get_expiration(e: Env, loan_id: u64) -> Result<u64, ContractError> {
        Ok(storage::load_loan(&e, loan_id)?.expiration)
    }

    /// Raw duration field. For perpetual loans this is the stream-start marker.
    pub fn get_duration(e: Env, loan_id: u64) -> Result<u64, ContractError> {
        Ok(storage::load_loan(&e, loan_id)?.duration)
    }

    pub fn get_borrower(e: Env, loan_id: u64) -> Result<Address, ContractError> {
        Ok(storage::load_loan(&e, loan_id)?.borrower)
    }

    pub fn get_collateral(e: Env, loan_id: u64) -> Result<Asset, ContractError> {
        Ok(storage::load_loan(&e, loan_id)?.collateral)
    }

    pub fn get_asset(e: Env, loan_id: u64) -> Result<Asset, ContractError> {
        Ok(storage::load_loan(&e, loan_id)?.asset)
    }

    pub fn get_repay_amount(e: Env, loan_id: u64) -> Result<i128, ContractError> {
        Ok(storage::load_loan(&e, loan_id)?.loan_repay_amount)
    }

    pub fn is_offer_revoked(e: Env, offer_hash: BytesN<32>) -> bool {
        storage::is_offer_revoked(&e, &offer_hash)
    }

    /// Digest a lender signs to approve `offer` on this deployment.
    pub fn get_offer_hash(e: Env, offer: Offer) -> BytesN<32> {
        authenticator::offer_hash(&e, &offer)
    }

    pub fn loan_count(e: Env) -> u64 {
        storage::loan_count(&e)
    }

    pub fn get_admin(e: Env) -> Result<Address, ContractError> {
        storage::admin(&e)
    }

    pub fn get_orchestrator(e: Env) -> Result<Address, ContractError> {
        storage::orchestrator(&e)
    }

    pub fn get_flow_agreement(e: Env) -> Result<Address, ContractError> {
        storage::flow_agreement(&e)
    }
}
