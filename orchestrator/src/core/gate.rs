//! Minimum-balance gate a pool must pass before a solver is deployed for it

use shared::{Balance, TokenId};

/// A token the gate recognises, with its minimum in base units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateToken {
    pub token_id: TokenId,
    pub minimum: Balance,
}

impl GateToken {
    pub fn new(token_id: TokenId, minimum: Balance) -> Self {
        Self { token_id, minimum }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// `token_id` holds at least its configured minimum
    Pass { token_id: TokenId, balance: Balance },
    Fail,
}

impl GateDecision {
    pub fn passed(&self) -> bool {
        matches!(self, GateDecision::Pass { .. })
    }
}

/// Pool liquidity precondition
///
/// A pool passes when at least one of its tokens is the native token or one of
/// the stable tokens and its ledger balance reaches that token's minimum.
#[derive(Debug, Clone)]
pub struct BalanceGate {
    native: GateToken,
    stables: Vec<GateToken>,
}

impl BalanceGate {
    pub fn new(native: GateToken, stables: Vec<GateToken>) -> Self {
        Self { native, stables }
    }

    fn minimum_for(&self, token_id: &TokenId) -> Option<Balance> {
        std::iter::once(&self.native)
            .chain(self.stables.iter())
            .find(|gate_token| &gate_token.token_id == token_id)
            .map(|gate_token| gate_token.minimum)
    }

    /// Evaluate the gate over `(token, ledger balance)` pairs of one pool
    pub fn evaluate(&self, balances: &[(TokenId, Balance)]) -> GateDecision {
        balances
            .iter()
            .find(|(token_id, balance)| self.minimum_for(token_id).is_some_and(|minimum| *balance >= minimum))
            .map(|(token_id, balance)| GateDecision::Pass {
                token_id: token_id.clone(),
                balance: *balance,
            })
            .unwrap_or(GateDecision::Fail)
    }
}
