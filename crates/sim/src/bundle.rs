//! Bundle execution.
//!
//! [`populate_bundle`] interprets a list of input [`Operation`]s against a
//! snapshot. Before each `Borrow` whose market lacks idle liquidity it plans a
//! reallocation and inserts one `PublicReallocate` per vault ahead of the
//! borrow. Every intermediate snapshot is kept in [`Bundle::steps`], so callers
//! can read figures before and after any operation.

use alloy_primitives::{Address, U256};

use crate::allocator::{plan_reallocation, PublicAllocatorOptions, ReallocationPlan};
use crate::error::SimError;
use crate::operation::{Operation, Withdrawal};
use crate::state::SimulationState;

/// Operations actually executed, with the snapshot chain they produced.
///
/// `steps[0]` is the input snapshot and `steps[i + 1]` the snapshot after
/// `operations[i]`.
#[derive(Debug, Clone)]
pub struct Bundle {
    operations: Vec<Operation>,
    steps: Vec<SimulationState>,
    plans: Vec<ReallocationPlan>,
}

impl Bundle {
    fn new(initial: SimulationState) -> Self {
        Self {
            operations: Vec::new(),
            steps: vec![initial],
            plans: Vec::new(),
        }
    }

    fn push(&mut self, operation: Operation) -> Result<(), SimError> {
        let next = self.final_state().with_operation(&operation)?;
        self.operations.push(operation);
        self.steps.push(next);
        Ok(())
    }

    /// Executed operations, including inserted reallocations
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Snapshot chain, one longer than [`Bundle::operations`]
    pub fn steps(&self) -> &[SimulationState] {
        &self.steps
    }

    /// Reallocation plans computed while populating, one per reallocating borrow
    pub fn plans(&self) -> &[ReallocationPlan] {
        &self.plans
    }

    /// Snapshot the bundle started from
    pub fn initial_state(&self) -> &SimulationState {
        &self.steps[0]
    }

    /// Snapshot after the last operation
    pub fn final_state(&self) -> &SimulationState {
        &self.steps[self.steps.len() - 1]
    }

    /// Snapshot right before `operations[index]` executed.
    pub fn state_before(&self, index: usize) -> Option<&SimulationState> {
        if index < self.operations.len() {
            self.steps.get(index)
        } else {
            None
        }
    }

    /// Snapshot right before the last `Borrow`, i.e. after any reallocation
    pub fn state_before_borrow(&self) -> Option<&SimulationState> {
        let index = self
            .operations
            .iter()
            .rposition(|operation| matches!(operation, Operation::Borrow { .. }))?;
        self.state_before(index)
    }

    /// Inserted `PublicReallocate` operations
    pub fn reallocations(&self) -> impl Iterator<Item = &Operation> {
        self.operations
            .iter()
            .filter(|operation| matches!(operation, Operation::PublicReallocate { .. }))
    }

    /// Total assets moved by inserted reallocations
    pub fn reallocated_assets(&self) -> U256 {
        self.reallocations()
            .fold(U256::ZERO, |acc, operation| acc + operation.reallocated_assets())
    }
}

/// Applies `inputs` to `state`, inserting reallocations where borrows need them.
///
/// # Errors
///
/// - [`SimError::InsufficientLiquidity`] when a borrow exceeds idle liquidity
///   plus everything the public allocator can bring in
/// - any error raised by an individual operation
pub fn populate_bundle(
    inputs: &[Operation],
    state: &SimulationState,
    options: &PublicAllocatorOptions,
) -> Result<Bundle, SimError> {
    let mut bundle = Bundle::new(state.clone());

    for input in inputs {
        if let Operation::Borrow {
            market_id, assets, ..
        } = input
        {
            let liquidity = bundle.final_state().market(market_id)?.liquidity();

            if *assets > liquidity {
                let need = *assets - liquidity;
                let plan = plan_reallocation(bundle.final_state(), *market_id, need, options)?;

                if !plan.is_fully_matched() {
                    return Err(SimError::InsufficientLiquidity {
                        market_id: *market_id,
                        requested: *assets,
                        available: liquidity + plan.matched,
                        shortfall: plan.shortfall,
                    });
                }

                for operation in reallocation_operations(&plan) {
                    bundle.push(operation)?;
                }
                bundle.plans.push(plan);
            }
        }

        bundle.push(input.clone())?;
    }

    Ok(bundle)
}

/// Groups a plan into one `PublicReallocate` per vault.
///
/// Vaults keep the order of their first withdrawal in the plan; each group's
/// withdrawals are sorted by market id.
pub fn reallocation_operations(plan: &ReallocationPlan) -> Vec<Operation> {
    let mut groups: Vec<(Address, Vec<Withdrawal>)> = Vec::new();

    for planned in &plan.withdrawals {
        let withdrawal = Withdrawal {
            market_id: planned.market_id,
            amount: planned.amount,
        };
        match groups.iter_mut().find(|(vault, _)| *vault == planned.vault) {
            Some((_, withdrawals)) => withdrawals.push(withdrawal),
            None => groups.push((planned.vault, vec![withdrawal])),
        }
    }

    groups
        .into_iter()
        .map(|(vault, mut withdrawals)| {
            withdrawals.sort_by_key(|withdrawal| withdrawal.market_id);
            Operation::PublicReallocate {
                vault,
                target_market_id: plan.target_market_id,
                withdrawals,
            }
        })
        .collect()
}
