use soroban_sdk::{contracttype, Address, Bytes, BytesN};

/// Expiration sentinel for perpetual loans: liveness is governed by the
/// interest stream instead of a deadline.
pub const PERPETUAL_EXPIRATION: u64 = u64::MAX;

// ─── Assets ────────────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssetCategory {
    Fungible = 0,
    NonFungible = 1,
    SemiFungible = 2,
}

/// Descriptor of an asset held as collateral or lent as principal.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Asset {
    pub address: Address,
    pub category: AssetCategory,
    pub amount: i128,
    /// Token id for non-fungible categories, 0 otherwise.
    pub id: u64,
}

// ─── Offers ────────────────────────────────────────────────────────────────

/// Loan terms signed off-chain by the lender. Never stored; only its hash is.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offer {
    pub collateral: Asset,
    /// Token lent as principal and streamed as interest.
    pub loan_token: Address,
    pub principal: i128,
    /// Lump-sum yield for fixed loans, interest per second for perpetual ones.
    pub yield_amount: i128,
    /// Loan duration in seconds. 0 means perpetual.
    pub duration: u64,
    /// Last second (exclusive) the offer can be accepted. 0 means never expires.
    pub expiration: u64,
    pub lender: Address,
    pub nonce: BytesN<32>,
}

/// Proof that the claimed signer approved a digest.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OfferSignature {
    /// Plain account key: ed25519 public key and signature over the digest.
    Ed25519(BytesN<32>, BytesN<64>),
    /// Programmable account: opaque proof checked by the account itself.
    Account(Bytes),
}

// ─── Loans ─────────────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoanStatus {
    None = 0,
    Running = 2,
    PaidBack = 3,
    Expired = 4,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Loan {
    /// Stored status. Advisory only for perpetual loans.
    pub status: LoanStatus,
    /// Debtor for the life of the loan, independent of the position holder.
    pub borrower: Address,
    /// Seconds for fixed loans. For perpetual loans: 0 at creation, then the
    /// stream-start marker, `expiration - duration` being the expected start.
    pub duration: u64,
    pub expiration: u64,
    pub collateral: Asset,
    pub asset: Asset,
    pub loan_repay_amount: i128,
    pub interest_by_the_second: i128,
}

impl Loan {
    pub fn is_perpetual(&self) -> bool {
        self.expiration == PERPETUAL_EXPIRATION
    }

    /// Expected start time of the interest flow for perpetual loans.
    pub fn stream_start(&self) -> u64 {
        self.expiration.saturating_sub(self.duration)
    }

    pub fn mark_stream_start(&mut self, start: u64) {
        self.duration = PERPETUAL_EXPIRATION - start;
    }
}
