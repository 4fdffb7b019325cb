use soroban_sdk::{Address, Env, Symbol};

/// Emitted on every create, update and delete of a flow.
///
/// # Topics
/// * `Symbol` - "flow_updated"
/// * `Address` - token
/// * `Address` - sender
/// * `Address` - receiver
///
/// # Data
/// * `i128` - previous rate (0 when created)
/// * `i128` - new rate (0 when deleted)
pub fn emit_flow_updated(
    e: &Env,
    token: &Address,
    sender: &Address,
    receiver: &Address,
    old_rate: i128,
    new_rate: i128,
) {
    let topics = (
        Symbol::new(e, "flow_updated"),
        token.clone(),
        sender.clone(),
        receiver.clone(),
    );
    e.events().publish(topics, (old_rate, new_rate));
}

/// Emitted when an operator permission is granted or withdrawn.
pub fn emit_operator_set(
    e: &Env,
    token: &Address,
    sender: &Address,
    operator: &Address,
    enabled: bool,
) {
    let topics = (Symbol::new(e, "operator_set"), token.clone(), sender.clone());
    e.events().publish(topics, (operator.clone(), enabled));
}
