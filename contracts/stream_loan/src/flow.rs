//! Adapter over the external continuous-payment channel.
//!
//! The channel keeps one flow per (token, sender, receiver). This contract acts
//! as the borrower's flow operator, so the borrower must have authorized the
//! contract address on the channel before a stream can start. Channel writes
//! never trap: a refused write comes back as a `ContractError`.

use crate::storage;
use lendstream_errors::ContractError;
use soroban_sdk::{contractclient, contracttype, Address, Env};

/// Live state of a flow as reported by the channel.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlowInfo {
    /// Time of the last create or update of the flow.
    pub timestamp: u64,
    pub flow_rate: i128,
}

#[allow(dead_code)]
#[contractclient(name = "FlowChannelClient")]
pub trait FlowChannel {
    fn get_flow(env: Env, token: Address, sender: Address, receiver: Address) -> Option<FlowInfo>;

    fn create_flow_by_operator(
        env: Env,
        operator: Address,
        token: Address,
        sender: Address,
        receiver: Address,
        flow_rate: i128,
    ) -> Result<(), ContractError>;

    fn update_flow_by_operator(
        env: Env,
        operator: Address,
        token: Address,
        sender: Address,
        receiver: Address,
        flow_rate: i128,
    ) -> Result<(), ContractError>;

    fn delete_flow_by_operator(
        env: Env,
        operator: Address,
        token: Address,
        sender: Address,
        receiver: Address,
    ) -> Result<(), ContractError>;
}

/// Result of removing a loan's rate from a live flow.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reduction {
    /// The flow carried exactly the removed rate and was deleted.
    Deleted,
    /// The flow was decreased to the contained rate.
    Decreased(i128),
    /// The live rate was below the removed rate; nothing was written.
    Skipped { live_rate: i128 },
}

pub struct FlowController<'a> {
    env: &'a Env,
    channel: FlowChannelClient<'a>,
}

impl<'a> FlowController<'a> {
    pub fn load(env: &'a Env) -> Result<Self, ContractError> {
        let address = storage::flow_agreement(env)?;
        Ok(Self {
            env,
            channel: FlowChannelClient::new(env, &address),
        })
    }

    pub fn flow(&self, token: &Address, sender: &Address, receiver: &Address) -> Option<FlowInfo> {
        self.channel.get_flow(token, sender, receiver)
    }

    pub fn create(
        &self,
        token: &Address,
        sender: &Address,
        receiver: &Address,
        rate: i128,
    ) -> Result<(), ContractError> {
        let operator = self.env.current_contract_address();
        channel_result(
            self.channel
                .try_create_flow_by_operator(&operator, token, sender, receiver, &rate),
        )
    }

    pub fn update(
        &self,
        token: &Address,
        sender: &Address,
        receiver: &Address,
        rate: i128,
    ) -> Result<(), ContractError> {
        let operator = self.env.current_contract_address();
        channel_result(
            self.channel
                .try_update_flow_by_operator(&operator, token, sender, receiver, &rate),
        )
    }

    pub fn delete(
        &self,
        token: &Address,
        sender: &Address,
        receiver: &Address,
    ) -> Result<(), ContractError> {
        let operator = self.env.current_contract_address();
        channel_result(
            self.channel
                .try_delete_flow_by_operator(&operator, token, sender, receiver),
        )
    }

    /// Set the sender -> receiver flow to exactly `rate`, opening it when absent.
    pub fn reset(
        &self,
        token: &Address,
        sender: &Address,
        receiver: &Address,
        rate: i128,
    ) -> Result<(), ContractError> {
        if self.flow(token, sender, receiver).is_some() {
            self.update(token, sender, receiver, rate)
        } else {
            self.create(token, sender, receiver, rate)
        }
    }

    /// Add `rate` to the sender -> receiver flow, opening it when absent.
    /// Returns the new live rate.
    pub fn increase(
        &self,
        token: &Address,
        sender: &Address,
        receiver: &Address,
        rate: i128,
    ) -> Result<i128, ContractError> {
        match self.flow(token, sender, receiver) {
            Some(live) => {
                let total = live
                    .flow_rate
                    .checked_add(rate)
                    .ok_or(ContractError::Overflow)?;
                self.update(token, sender, receiver, total)?;
                Ok(total)
            }
            None => {
                self.create(token, sender, receiver, rate)?;
                Ok(rate)
            }
        }
    }

    /// Remove exactly `rate` from the sender -> receiver flow. A flow below
    /// `rate` is never touched.
    pub fn reduce(
        &self,
        token: &Address,
        sender: &Address,
        receiver: &Address,
        rate: i128,
    ) -> Result<Reduction, ContractError> {
        let live_rate = self
            .flow(token, sender, receiver)
            .map(|f| f.flow_rate)
            .unwrap_or(0);

        if live_rate == rate {
            self.delete(token, sender, receiver)?;
            Ok(Reduction::Deleted)
        } else if live_rate > rate {
            let remaining = live_rate - rate;
            self.update(token, sender, receiver, remaining)?;
            Ok(Reduction::Decreased(remaining))
        } else {
            Ok(Reduction::Skipped { live_rate })
        }
    }
}

/// Surface the channel's own error code. A refusal that carries no code is
/// reported as the operator not being allowed to act.
fn channel_result<E, I>(
    result: Result<Result<(), E>, Result<ContractError, I>>,
) -> Result<(), ContractError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Err(Ok(error)) => Err(error),
        _ => Err(ContractError::OperatorNotAuthorized),
    }
}
