//! Shared test helpers for flow_agreement tests.

#![cfg(test)]

use crate::{FlowAgreement, FlowAgreementClient};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{Address, Env};

/// One day in seconds.
pub const ONE_DAY: u64 = 86_400;

/// Registers the agreement and generates a token plus two parties.
/// Returns `(client, token, sender, receiver)`.
pub fn setup(e: &Env) -> (FlowAgreementClient<'_>, Address, Address, Address) {
    e.mock_all_auths();

    let contract_id = e.register(FlowAgreement, ());
    let client = FlowAgreementClient::new(e, &contract_id);
    let token = Address::generate(e);
    let sender = Address::generate(e);
    let receiver = Address::generate(e);

    (client, token, sender, receiver)
}
