#![no_std]

use soroban_sdk::contracterror;

/// @title  ErrorCategory
/// @notice Groups errors by domain for monitoring, alerting, and dashboards.
/// @dev    Off-chain consumers should switch on this value first, then on the
///         specific `ContractError` code for fine-grained handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Contract setup and initialization errors (codes 1-99).
    Initialization,
    /// Caller identity, permission and signature errors (codes 100-199).
    Authorization,
    /// Signed offer errors (codes 200-299).
    Offer,
    /// Loan lifecycle and position errors (codes 300-399).
    Loan,
    /// Continuous-payment channel errors (codes 400-499).
    Flow,
    /// Safe-math errors (codes 700-799).
    Arithmetic,
}

/// @title  ContractError
/// @notice Canonical error enum shared by the lending core and the flow agreement.
/// @dev    Codes are wire-stable. Never renumber a variant after deployment.
///         Append new variants at the end of their category block only.
///         Use the ErrorExt trait to retrieve the category and description.
///
/// Error Code Layout:
///   1  -  99  : Initialization
///   100 - 199 : Authorization
///   200 - 299 : Offer
///   300 - 399 : Loan
///   400 - 499 : Flow
///   700 - 799 : Arithmetic
#[contracterror]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    // --- Initialization (1-99) ---
    /// Contract has not been initialized yet.
    /// Contracts: stream_loan
    NotInitialized = 1,

    /// Contract has already been initialized and cannot be re-initialized.
    /// Contracts: stream_loan
    AlreadyInitialized = 2,

    // --- Authorization (100-199) ---
    /// Caller is not the admin, the orchestrator, or the position holder.
    /// Contracts: stream_loan
    Unauthorized = 100,

    /// Offer or revocation signature does not verify for the claimed signer.
    /// Contracts: stream_loan
    InvalidSignature = 101,

    // --- Offer (200-299) ---
    /// Offer expiration timestamp has been reached.
    /// Contracts: stream_loan
    OfferExpired = 200,

    /// Offer hash was already accepted or revoked.
    /// Contracts: stream_loan
    OfferAlreadyUsed = 201,

    /// Offer hash is already marked in the revocation registry.
    /// Contracts: stream_loan
    AlreadyRevoked = 202,

    /// Offer terms are malformed (non-positive principal, zero perpetual rate, ...).
    /// Contracts: stream_loan
    InvalidOffer = 203,

    // --- Loan (300-399) ---
    /// No loan record exists for the given id.
    /// Contracts: stream_loan
    LoanNotFound = 300,

    /// Derived loan status is not Running.
    /// Contracts: stream_loan
    NotRepayable = 301,

    /// Caller does not hold the position or the loan is still live.
    /// Contracts: stream_loan
    NotClaimable = 302,

    /// Caller does not hold the position or the loan has not been claimed.
    /// Contracts: stream_loan
    NotBurnable = 303,

    /// Operation only applies to perpetual (streaming) loans.
    /// Contracts: stream_loan
    NotPerpetual = 304,

    /// Stored loan status is not Running.
    /// Contracts: stream_loan
    LoanNotRunning = 305,

    /// Interest stream for this loan is already flowing to the holder.
    /// Contracts: stream_loan
    StreamAlreadyActive = 306,

    /// Interest stream for this loan is not flowing to the holder.
    /// Contracts: stream_loan
    StreamNotActive = 307,

    /// Position transfer to the current holder.
    /// Contracts: stream_loan
    InvalidTransfer = 308,

    // --- Flow (400-499) ---
    /// A flow already exists for this (token, sender, receiver).
    /// Contracts: flow_agreement
    FlowAlreadyExists = 400,

    /// No flow exists for this (token, sender, receiver).
    /// Contracts: flow_agreement
    FlowNotFound = 401,

    /// Flow rate must be strictly positive.
    /// Contracts: flow_agreement
    InvalidFlowRate = 402,

    /// Sender and receiver are the same address.
    /// Contracts: flow_agreement, stream_loan
    SelfFlow = 403,

    /// Operator has not been authorized by the sender for this token.
    /// Contracts: flow_agreement
    OperatorNotAuthorized = 404,

    // --- Arithmetic (700-799) ---
    /// Integer overflow detected during a checked arithmetic operation.
    /// Contracts: stream_loan, flow_agreement
    Overflow = 700,
}

/// @title  ErrorExt
/// @notice Provides category() and description() on every ContractError variant.
/// @dev    Use this for structured logging, monitoring, and off-chain display.
pub trait ErrorExt {
    /// @return The ErrorCategory bucket this error belongs to.
    fn category(&self) -> ErrorCategory;

    /// @return A static string description safe for logging or display.
    fn description(&self) -> &'static str;
}

impl ErrorExt for ContractError {
    fn category(&self) -> ErrorCategory {
        match self {
            ContractError::NotInitialized | ContractError::AlreadyInitialized => {
                ErrorCategory::Initialization
            }

            ContractError::Unauthorized | ContractError::InvalidSignature => {
                ErrorCategory::Authorization
            }

            ContractError::OfferExpired
            | ContractError::OfferAlreadyUsed
            | ContractError::AlreadyRevoked
            | ContractError::InvalidOffer => ErrorCategory::Offer,

            ContractError::LoanNotFound
            | ContractError::NotRepayable
            | ContractError::NotClaimable
            | ContractError::NotBurnable
            | ContractError::NotPerpetual
            | ContractError::LoanNotRunning
            | ContractError::StreamAlreadyActive
            | ContractError::StreamNotActive
            | ContractError::InvalidTransfer => ErrorCategory::Loan,

            ContractError::FlowAlreadyExists
            | ContractError::FlowNotFound
            | ContractError::InvalidFlowRate
            | ContractError::SelfFlow
            | ContractError::OperatorNotAuthorized => ErrorCategory::Flow,

            ContractError::Overflow => ErrorCategory::Arithmetic,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ContractError::NotInitialized => "Contract has not been initialized",
            ContractError::AlreadyInitialized => "Contract has already been initialized",
            ContractError::Unauthorized => "Caller is not authorized for this operation",
            ContractError::InvalidSignature => "Signature does not verify for the claimed signer",
            ContractError::OfferExpired => "Offer has expired",
            ContractError::OfferAlreadyUsed => "Offer was already accepted or revoked",
            ContractError::AlreadyRevoked => "Offer hash is already revoked",
            ContractError::InvalidOffer => "Offer terms are invalid",
            ContractError::LoanNotFound => "No loan found for the given id",
            ContractError::NotRepayable => "Loan is not running and cannot be repaid",
            ContractError::NotClaimable => "Loan cannot be claimed by this holder",
            ContractError::NotBurnable => "Loan cannot be burned by this holder",
            ContractError::NotPerpetual => "Loan is not a perpetual loan",
            ContractError::LoanNotRunning => "Stored loan status is not running",
            ContractError::StreamAlreadyActive => "Interest stream is already active",
            ContractError::StreamNotActive => "Interest stream is not active",
            ContractError::InvalidTransfer => "Position cannot be transferred to its holder",
            ContractError::FlowAlreadyExists => "Flow already exists between these parties",
            ContractError::FlowNotFound => "No flow exists between these parties",
            ContractError::InvalidFlowRate => "Flow rate must be strictly positive",
            ContractError::SelfFlow => "Sender and receiver must differ",
            ContractError::OperatorNotAuthorized => "Operator is not authorized by the sender",
            ContractError::Overflow => "Integer overflow in checked arithmetic",
        }
    }
}
