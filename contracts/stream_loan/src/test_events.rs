#![cfg(test)]

use crate::test_helpers::*;
use soroban_sdk::testutils::{Address as _, Events};
use soroban_sdk::{Address, BytesN, Env, FromVal, Symbol, Val, Vec};

/// Last event published by `contract` in the latest invocation.
fn last_event(e: &Env, contract: &Address) -> (Vec<Val>, Val) {
    let event = e
        .events()
        .all()
        .into_iter()
        .rev()
        .find(|ev| ev.0 == *contract)
        .unwrap();
    (event.1, event.2)
}

fn topic_name(e: &Env, topics: &Vec<Val>) -> Symbol {
    Symbol::from_val(e, &topics.get(0).unwrap())
}

#[test]
fn test_lifecycle_event_emissions() {
    let e = Env::default();
    let s = setup(&e);
    let contract = s.client.address.clone();
    let holder = s.lender.address.clone();

    // --- Create ---
    let offer = perpetual_offer(&e, &s, 5, 1);
    let hash = s.client.get_offer_hash(&offer);
    let loan_id = s.open(&e, &offer);

    let (topics, data) = last_event(&e, &contract);
    assert_eq!(topic_name(&e, &topics), Symbol::new(&e, "loan_created"));
    assert_eq!(u64::from_val(&e, &topics.get(1).unwrap()), loan_id);
    assert_eq!(
        <(Address, BytesN<32>)>::from_val(&e, &data),
        (holder.clone(), hash)
    );

    // --- Stream started ---
    s.client.begin_stream(&s.orchestrator, &loan_id, &holder);
    let (topics, data) = last_event(&e, &contract);
    assert_eq!(topic_name(&e, &topics), Symbol::new(&e, "stream_started"));
    assert_eq!(<(Address, i128)>::from_val(&e, &data), (holder.clone(), 5));

    // --- Transfer ---
    let buyer = Address::generate(&e);
    s.client.transfer(&holder, &buyer, &loan_id);
    let (topics, data) = last_event(&e, &contract);
    assert_eq!(topic_name(&e, &topics), Symbol::new(&e, "position_transfer"));
    assert_eq!(
        <(Address, Address)>::from_val(&e, &data),
        (holder.clone(), buyer.clone())
    );

    // --- Repay ---
    s.client.repay_loan(&s.orchestrator, &loan_id, &buyer);
    let (topics, _) = last_event(&e, &contract);
    assert_eq!(topic_name(&e, &topics), Symbol::new(&e, "loan_repaid"));
    assert_eq!(u64::from_val(&e, &topics.get(1).unwrap()), loan_id);

    // --- Stream ended ---
    s.client.end_stream(&s.orchestrator, &loan_id, &buyer);
    let (topics, data) = last_event(&e, &contract);
    assert_eq!(topic_name(&e, &topics), Symbol::new(&e, "stream_ended"));
    assert_eq!(<(Address, i128)>::from_val(&e, &data), (buyer.clone(), 5));

    // --- Claim ---
    s.client.claim(&s.orchestrator, &loan_id, &buyer);
    let (topics, data) = last_event(&e, &contract);
    assert_eq!(topic_name(&e, &topics), Symbol::new(&e, "loan_claimed"));
    assert_eq!(Address::from_val(&e, &data), buyer);

    // --- Burn ---
    s.client.burn(&s.orchestrator, &loan_id, &buyer);
    let (topics, data) = last_event(&e, &contract);
    assert_eq!(topic_name(&e, &topics), Symbol::new(&e, "loan_burned"));
    assert_eq!(Address::from_val(&e, &data), buyer);
}

#[test]
fn test_offer_revoked_event() {
    let e = Env::default();
    let s = setup(&e);
    let offer = fixed_offer(&e, &s, 1_000, 50, ONE_DAY);
    let hash = s.client.get_offer_hash(&offer);
    let signature = s.lender.sign(&e, &hash);

    s.client
        .revoke_offer(&s.orchestrator, &hash, &signature, &s.lender.address);

    let (topics, data) = last_event(&e, &s.client.address);
    assert_eq!(topic_name(&e, &topics), Symbol::new(&e, "offer_revoked"));
    assert_eq!(BytesN::<32>::from_val(&e, &data), hash);
}

#[test]
fn test_orchestrator_set_event() {
    let e = Env::default();
    let s = setup(&e);
    let next = Address::generate(&e);

    s.client.set_orchestrator(&s.admin, &next);

    let (topics, data) = last_event(&e, &s.client.address);
    assert_eq!(topic_name(&e, &topics), Symbol::new(&e, "orchestrator_set"));
    assert_eq!(Address::from_val(&e, &data), next);
}
