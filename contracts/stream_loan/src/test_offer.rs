//! Offer authentication: signatures, replay protection, expiry and revocation.

#![cfg(test)]

use crate::test_helpers::*;
use crate::{ContractError, OfferSignature, VALID_SIGNATURE_MAGIC};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{contract, contractimpl, Address, Bytes, BytesN, Env};

/// Programmable account that approves any digest presented with the proof
/// "approve".
#[contract]
pub struct MockWallet;

#[contractimpl]
impl MockWallet {
    pub fn is_valid_signature(e: Env, _hash: BytesN<32>, signature: Bytes) -> u32 {
        if signature == Bytes::from_slice(&e, b"approve") {
            VALID_SIGNATURE_MAGIC
        } else {
            0
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// 1. Hashing
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_offer_hash_is_deterministic() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    assert_eq!(s.client.get_offer_hash(&offer), s.client.get_offer_hash(&offer));
}

#[test]
fn test_offer_hash_covers_every_term() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let base = s.client.get_offer_hash(&offer);

    let mut other = offer.clone();
    other.nonce = BytesN::from_array(&e, &[2; 32]);
    assert_ne!(s.client.get_offer_hash(&other), base);

    let mut other = offer.clone();
    other.principal = 1_001;
    assert_ne!(s.client.get_offer_hash(&other), base);

    let mut other = offer.clone();
    other.collateral.id = 43;
    assert_ne!(s.client.get_offer_hash(&other), base);

    let mut other = offer;
    other.expiration = START + ONE_DAY;
    assert_ne!(s.client.get_offer_hash(&other), base);
}

#[test]
fn test_offer_hash_is_bound_to_deployment() {
    let e = Env::default();
    let s = setup(&e);
    let second = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    assert_ne!(
        s.client.get_offer_hash(&offer),
        second.client.get_offer_hash(&offer)
    );
}

// ═══════════════════════════════════════════════════════════════════
// 2. Acceptance
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_accept_marks_offer_consumed() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let hash = s.client.get_offer_hash(&offer);

    assert!(!s.client.is_offer_revoked(&hash));
    s.open(&e, &offer);
    assert!(s.client.is_offer_revoked(&hash));
}

#[test]
fn test_offer_cannot_be_accepted_twice() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let signature = s.sign(&e, &offer);

    let first = s
        .client
        .create_loan(&s.orchestrator, &offer, &signature, &s.borrower);
    assert_eq!(first, 1);

    let other_borrower = Address::generate(&e);
    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &offer, &signature, &other_borrower),
        Err(Ok(ContractError::OfferAlreadyUsed))
    );
    assert_eq!(s.client.loan_count(), 1);
}

#[test]
fn test_offer_expiry_boundary() {
    let e = Env::default();
    let s = setup(&e);

    let mut offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    offer.expiration = START + 100;

    advance(&e, 99);
    s.open(&e, &offer);

    let mut late = offer.clone();
    late.nonce = BytesN::from_array(&e, &[9; 32]);
    advance(&e, 1);
    let signature = s.sign(&e, &late);
    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &late, &signature, &s.borrower),
        Err(Ok(ContractError::OfferExpired))
    );
}

#[test]
fn test_zero_expiration_never_expires() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    advance(&e, 10 * 365 * ONE_DAY);
    assert_eq!(s.open(&e, &offer), 1);
}

#[test]
fn test_signature_from_other_key_is_rejected() {
    let e = Env::default();
    let s = setup(&e);
    let impostor = Lender::new(&e, 99);

    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let hash = s.client.get_offer_hash(&offer);
    let forged = impostor.sign(&e, &hash);

    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &offer, &forged, &s.borrower),
        Err(Ok(ContractError::InvalidSignature))
    );
    assert!(!s.client.is_offer_revoked(&hash));
}

#[test]
#[should_panic]
fn test_tampered_offer_fails_verification() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let signature = s.sign(&e, &offer);

    let mut tampered = offer;
    tampered.principal = 1_000_000;
    s.client
        .create_loan(&s.orchestrator, &tampered, &signature, &s.borrower);
}

#[test]
fn test_programmable_account_can_approve_offer() {
    let e = Env::default();
    let s = setup(&e);
    let wallet = e.register(MockWallet, ());

    let mut offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    offer.lender = wallet.clone();
    let proof = OfferSignature::Account(Bytes::from_slice(&e, b"approve"));

    let loan_id = s
        .client
        .create_loan(&s.orchestrator, &offer, &proof, &s.borrower);
    assert_eq!(s.client.holder_of(&loan_id), wallet);
}

#[test]
fn test_programmable_account_rejection() {
    let e = Env::default();
    let s = setup(&e);
    let wallet = e.register(MockWallet, ());

    let mut offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    offer.lender = wallet;
    let proof = OfferSignature::Account(Bytes::from_slice(&e, b"nope"));

    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &offer, &proof, &s.borrower),
        Err(Ok(ContractError::InvalidSignature))
    );
}

// ═══════════════════════════════════════════════════════════════════
// 3. Terms validation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_invalid_terms_are_rejected_before_consuming_offer() {
    let e = Env::default();
    let s = setup(&e);

    let zero_principal = fixed_offer(&e, &s, 0, 50, 30 * ONE_DAY);
    let signature = s.sign(&e, &zero_principal);
    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &zero_principal, &signature, &s.borrower),
        Err(Ok(ContractError::InvalidOffer))
    );
    assert!(!s
        .client
        .is_offer_revoked(&s.client.get_offer_hash(&zero_principal)));

    let free_perpetual = perpetual_offer(&e, &s, 0, 3);
    let signature = s.sign(&e, &free_perpetual);
    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &free_perpetual, &signature, &s.borrower),
        Err(Ok(ContractError::InvalidOffer))
    );

    let negative_yield = fixed_offer(&e, &s, 1_000, -1, 30 * ONE_DAY);
    let signature = s.sign(&e, &negative_yield);
    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &negative_yield, &signature, &s.borrower),
        Err(Ok(ContractError::InvalidOffer))
    );
}

#[test]
fn test_lender_cannot_borrow_from_itself() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let signature = s.sign(&e, &offer);
    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &offer, &signature, &s.lender.address),
        Err(Ok(ContractError::InvalidOffer))
    );
}

#[test]
fn test_fixed_deadline_overflow() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, u64::MAX - 10);
    let signature = s.sign(&e, &offer);
    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &offer, &signature, &s.borrower),
        Err(Ok(ContractError::Overflow))
    );
}

// ═══════════════════════════════════════════════════════════════════
// 4. Revocation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_revoked_offer_cannot_be_accepted() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let hash = s.client.get_offer_hash(&offer);
    let signature = s.lender.sign(&e, &hash);

    s.client
        .revoke_offer(&s.orchestrator, &hash, &signature, &s.lender.address);
    assert!(s.client.is_offer_revoked(&hash));

    assert_eq!(
        s.client
            .try_create_loan(&s.orchestrator, &offer, &signature, &s.borrower),
        Err(Ok(ContractError::OfferAlreadyUsed))
    );
}

#[test]
fn test_revoke_twice_fails() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let hash = s.client.get_offer_hash(&offer);
    let signature = s.lender.sign(&e, &hash);

    s.client
        .revoke_offer(&s.orchestrator, &hash, &signature, &s.lender.address);
    assert_eq!(
        s.client
            .try_revoke_offer(&s.orchestrator, &hash, &signature, &s.lender.address),
        Err(Ok(ContractError::AlreadyRevoked))
    );
}

#[test]
fn test_revoke_after_acceptance_fails() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let hash = s.client.get_offer_hash(&offer);
    s.open(&e, &offer);

    let signature = s.lender.sign(&e, &hash);
    assert_eq!(
        s.client
            .try_revoke_offer(&s.orchestrator, &hash, &signature, &s.lender.address),
        Err(Ok(ContractError::AlreadyRevoked))
    );
}

#[test]
fn test_revoke_requires_signer_signature() {
    let e = Env::default();
    let s = setup(&e);
    let impostor = Lender::new(&e, 21);
    let offer = fixed_offer(&e, &s, 1_000, 50, 30 * ONE_DAY);
    let hash = s.client.get_offer_hash(&offer);

    let signature = impostor.sign(&e, &hash);
    assert_eq!(
        s.client
            .try_revoke_offer(&s.orchestrator, &hash, &signature, &s.lender.address),
        Err(Ok(ContractError::InvalidSignature))
    );
}
