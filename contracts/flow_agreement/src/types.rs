use soroban_sdk::{contracttype, Address};

// ─── Flow state ────────────────────────────────────────────────────────────

/// Live state of one flow. Field names are part of the cross-contract
/// interface read by the lending core.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlowInfo {
    /// Ledger timestamp of the last create or update of this flow.
    pub timestamp: u64,
    /// Amount of `token` per second moving from sender to receiver.
    pub flow_rate: i128,
}

// ─── Storage keys ──────────────────────────────────────────────────────────

#[contracttype]
pub enum DataKey {
    /// Flow keyed by (token, sender, receiver). At most one per ordered pair.
    Flow(Address, Address, Address),
    /// Operator permission keyed by (token, sender, operator).
    Operator(Address, Address, Address),
    /// Net flow rate of an account for a token (inflows minus outflows).
    NetFlow(Address, Address),
}
