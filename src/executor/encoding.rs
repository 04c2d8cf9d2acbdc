//! Plan steps as contract calls.
//!
//! Each [`PlannedStep`] maps to exactly one call:
//!
//! | Edge  | Target | Call                             | Amount        |
//! |-------|--------|----------------------------------|---------------|
//! | join  | Tub    | `join(wad)`                      | SKR out       |
//! | exit  | Tub    | `exit(wad)`                      | SKR in        |
//! | boom  | Tap    | `boom(wad)`                      | SKR in        |
//! | bust  | Tap    | `bust(wad)`                      | SKR out       |
//! | order | OASIS  | `take(bytes32 id, uint128 qty)`  | pay-token out |
//!
//! Batched submissions wrap the ordered calls into one
//! `execute(tokens, invocations)` on the Batch Executor.

use crate::chain::contracts::{Otc, Tap, TxManager, Tub, ERC20};
use crate::config::ContractAddresses;
use crate::errors::ExecutionError;
use crate::graph::{EdgeKind, OrderId, VaultOp};
use crate::numeric::Wad;
use crate::path::PlannedStep;
use crate::utils::{order_id_to_b256, u256_to_u128};
use crate::ExecutionResult;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use std::fmt;

/// What a [`ContractCall`] does at its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallAction {
    Approve { spender: Address, amount: U256 },
    Join(Wad),
    Exit(Wad),
    Boom(Wad),
    Bust(Wad),
    Take { order_id: OrderId, quantity: Wad },
    Execute {
        tokens: Vec<Address>,
        invocations: Vec<ContractCall>,
    },
}

/// One external call: a target contract and the action to perform there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub target: Address,
    pub action: CallAction,
}

impl ContractCall {
    pub fn approve(token: Address, spender: Address, amount: U256) -> Self {
        Self {
            target: token,
            action: CallAction::Approve { spender, amount },
        }
    }

    pub fn execute(executor: Address, tokens: Vec<Address>, invocations: Vec<ContractCall>) -> Self {
        Self {
            target: executor,
            action: CallAction::Execute { tokens, invocations },
        }
    }

    /// The call performing one plan step.
    pub fn for_step(step: &PlannedStep, addresses: &ContractAddresses) -> Self {
        match &step.edge.kind {
            EdgeKind::FixedPrice { op, .. } => {
                let (target, action) = match op {
                    VaultOp::Join => (addresses.tub, CallAction::Join(step.amount_out.clone())),
                    VaultOp::Exit => (addresses.tub, CallAction::Exit(step.amount_in.clone())),
                    VaultOp::Boom => (addresses.tap, CallAction::Boom(step.amount_in.clone())),
                    VaultOp::Bust => (addresses.tap, CallAction::Bust(step.amount_out.clone())),
                };
                Self { target, action }
            }
            EdgeKind::BookOrder { order_id, .. } => Self {
                target: addresses.otc,
                action: CallAction::Take {
                    order_id: *order_id,
                    quantity: step.amount_out.clone(),
                },
            },
        }
    }

    pub fn is_approval(&self) -> bool {
        matches!(self.action, CallAction::Approve { .. })
    }

    /// ABI-encoded calldata.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::AmountEncoding` if an amount does not fit its
    /// on-chain integer type (`uint256`, or `uint128` for a take quantity).
    pub fn calldata(&self) -> ExecutionResult<Bytes> {
        let encoded = match &self.action {
            CallAction::Approve { spender, amount } => ERC20::approveCall {
                spender: *spender,
                amount: *amount,
            }
            .abi_encode(),
            CallAction::Join(wad) => Tub::joinCall { wad: encode_wad(wad)? }.abi_encode(),
            CallAction::Exit(wad) => Tub::exitCall { wad: encode_wad(wad)? }.abi_encode(),
            CallAction::Boom(wad) => Tap::boomCall { wad: encode_wad(wad)? }.abi_encode(),
            CallAction::Bust(wad) => Tap::bustCall { wad: encode_wad(wad)? }.abi_encode(),
            CallAction::Take { order_id, quantity } => {
                let quantity = u256_to_u128(encode_wad(quantity)?).map_err(|e| ExecutionError::AmountEncoding {
                    amount: quantity.to_string(),
                    reason: e.to_string(),
                })?;
                Otc::takeCall {
                    id: order_id_to_b256(order_id.0),
                    maxTakeAmount: quantity,
                }
                .abi_encode()
            }
            CallAction::Execute { tokens, invocations } => {
                let invocations = invocations
                    .iter()
                    .map(|call| {
                        Ok(TxManager::Invocation {
                            target: call.target,
                            callData: call.calldata()?,
                        })
                    })
                    .collect::<ExecutionResult<Vec<_>>>()?;
                TxManager::executeCall {
                    tokens: tokens.clone(),
                    invocations,
                }
                .abi_encode()
            }
        };

        Ok(Bytes::from(encoded))
    }
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            CallAction::Approve { spender, .. } => write!(f, "approve({spender:#x})"),
            CallAction::Join(wad) => write!(f, "join({wad})"),
            CallAction::Exit(wad) => write!(f, "exit({wad})"),
            CallAction::Boom(wad) => write!(f, "boom({wad})"),
            CallAction::Bust(wad) => write!(f, "bust({wad})"),
            CallAction::Take { order_id, quantity } => write!(f, "take({order_id}, {quantity})"),
            CallAction::Execute { invocations, .. } => write!(f, "execute({} calls)", invocations.len()),
        }
    }
}

fn encode_wad(wad: &Wad) -> ExecutionResult<U256> {
    wad.to_u256().map_err(|e| ExecutionError::AmountEncoding {
        amount: wad.to_string(),
        reason: e.to_string(),
    })
}
