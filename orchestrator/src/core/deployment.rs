//! Parameters of a solver deployment

use shared::{PoolId, TokenId};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Highest fee a pool may charge, in basis points
pub const MAX_FEE_BPS: i64 = 10_000;

/// Validated parameters handed to the hosting platform for one solver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverDeploymentParams {
    pub pool_id: PoolId,
    pub token_pair: (TokenId, TokenId),
    pub fee_bps: u16,
}

impl SolverDeploymentParams {
    /// Validate the pool's token pair and fee
    ///
    /// The fee is taken as a signed value so that out-of-range inputs from any
    /// source are rejected here rather than wrapped.
    pub fn new(pool_id: PoolId, token_ids: &[TokenId], fee: i64) -> OrchestratorResult<Self> {
        if !(0..=MAX_FEE_BPS).contains(&fee) {
            return Err(OrchestratorError::InvalidFee { fee });
        }

        let token_pair = match token_ids {
            [first, second] => (first.clone(), second.clone()),
            _ => {
                return Err(OrchestratorError::InvalidTokenPair {
                    pool_id,
                    count: token_ids.len(),
                })
            }
        };

        Ok(Self {
            pool_id,
            token_pair,
            fee_bps: fee as u16,
        })
    }
}
