//! Offer authentication.
//!
//! An offer is identified by a keccak256 digest over a versioned,
//! domain-separated XDR encoding, so a signature is only valid for one
//! network and one deployment of this contract. The digest doubles as the
//! replay key: once accepted or revoked it can never be used again.

use crate::storage;
use crate::types::{Offer, OfferSignature};
use lendstream_errors::ContractError;
use soroban_sdk::xdr::{FromXdr, ToXdr};
use soroban_sdk::{contractclient, Address, Bytes, BytesN, Env, Symbol};

const DOMAIN_NAME: &str = "lendstream";
const DOMAIN_VERSION: u32 = 1;
const OFFER_TYPE: &str = "lendstream_offer";

/// Value a programmable account returns when it approves a digest.
pub const VALID_SIGNATURE_MAGIC: u32 = 0x1626_ba7e;

/// XDR prefix of `ScVal::Address(ScAddress::Account(PublicKey::Ed25519(_)))`.
const ACCOUNT_ADDRESS_PREFIX: [u8; 12] = [0, 0, 0, 18, 0, 0, 0, 0, 0, 0, 0, 0];

/// Interface a programmable account exposes to approve digests it signed.
#[allow(dead_code)]
#[contractclient(name = "SignatureValidatorClient")]
pub trait SignatureValidator {
    fn is_valid_signature(env: Env, hash: BytesN<32>, signature: Bytes) -> u32;
}

fn domain_separator(env: &Env) -> BytesN<32> {
    let domain = (
        Symbol::new(env, DOMAIN_NAME),
        DOMAIN_VERSION,
        env.ledger().network_id(),
        env.current_contract_address(),
    );
    env.crypto().keccak256(&domain.to_xdr(env)).to_bytes()
}

fn struct_hash(env: &Env, offer: &Offer) -> BytesN<32> {
    let collateral = (
        offer.collateral.address.clone(),
        offer.collateral.category,
        offer.collateral.amount,
        offer.collateral.id,
    );
    let encoded = (
        Symbol::new(env, OFFER_TYPE),
        collateral,
        offer.loan_token.clone(),
        offer.principal,
        offer.yield_amount,
        offer.duration,
        offer.expiration,
        offer.lender.clone(),
        offer.nonce.clone(),
    );
    env.crypto().keccak256(&encoded.to_xdr(env)).to_bytes()
}

/// Deterministic digest of an offer for this network and contract.
pub fn offer_hash(env: &Env, offer: &Offer) -> BytesN<32> {
    let mut preimage = Bytes::from_array(env, &domain_separator(env).to_array());
    preimage.append(&Bytes::from_array(env, &struct_hash(env, offer).to_array()));
    env.crypto().keccak256(&preimage).to_bytes()
}

/// Account address controlled by an ed25519 public key.
pub fn key_holder_address(env: &Env, public_key: &BytesN<32>) -> Result<Address, ContractError> {
    let mut encoded = Bytes::from_array(env, &ACCOUNT_ADDRESS_PREFIX);
    encoded.append(&Bytes::from_array(env, &public_key.to_array()));
    Address::from_xdr(env, &encoded).map_err(|_| ContractError::InvalidSignature)
}

/// Check that `signer` approved `hash`.
///
/// Key holders prove it with an ed25519 signature from the key behind their
/// account address. Programmable accounts are asked through
/// [`SignatureValidator`].
///
/// `InvalidSignature` is returned when the public key does not belong to
/// `signer` or the account does not answer with [`VALID_SIGNATURE_MAGIC`].
/// A forged or malformed ed25519 signature from the right key is not reported
/// as a code: the host check traps and the whole invocation fails.
pub fn verify(
    env: &Env,
    hash: &BytesN<32>,
    signature: &OfferSignature,
    signer: &Address,
) -> Result<(), ContractError> {
    match signature {
        OfferSignature::Ed25519(public_key, sig) => {
            if key_holder_address(env, public_key)? != *signer {
                return Err(ContractError::InvalidSignature);
            }
            let message = Bytes::from_array(env, &hash.to_array());
            env.crypto().ed25519_verify(public_key, &message, sig);
            Ok(())
        }
        OfferSignature::Account(proof) => {
            let account = SignatureValidatorClient::new(env, signer);
            match account.try_is_valid_signature(hash, proof) {
                Ok(Ok(VALID_SIGNATURE_MAGIC)) => Ok(()),
                _ => Err(ContractError::InvalidSignature),
            }
        }
    }
}

/// Authenticate an offer for acceptance and consume its hash.
///
/// # Errors
/// * `InvalidSignature` - the lender did not sign this offer
/// * `OfferExpired` - the acceptance deadline has passed
/// * `OfferAlreadyUsed` - accepted or revoked before
pub fn accept(
    env: &Env,
    offer: &Offer,
    signature: &OfferSignature,
) -> Result<BytesN<32>, ContractError> {
    let hash = offer_hash(env, offer);
    verify(env, &hash, signature, &offer.lender)?;

    if offer.expiration != 0 && env.ledger().timestamp() >= offer.expiration {
        return Err(ContractError::OfferExpired);
    }
    if storage::is_offer_revoked(env, &hash) {
        return Err(ContractError::OfferAlreadyUsed);
    }

    storage::mark_offer_revoked(env, &hash);
    Ok(hash)
}

/// Withdraw an offer before anyone accepts it. The signer proves ownership by
/// signing the offer hash itself.
pub fn revoke(
    env: &Env,
    offer_hash: &BytesN<32>,
    signature: &OfferSignature,
    signer: &Address,
) -> Result<(), ContractError> {
    verify(env, offer_hash, signature, signer)?;
    if storage::is_offer_revoked(env, offer_hash) {
        return Err(ContractError::AlreadyRevoked);
    }
    storage::mark_offer_revoked(env, offer_hash);
    Ok(())
}
