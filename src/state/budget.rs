use std::sync::{Mutex, PoisonError};

/// Process-wide page budget shared by all workers
///
/// The counter only ever decreases, and only inside [`CrawlBudget::try_spend`],
/// which runs the store operation under the same lock. The number of
/// successful stores therefore never exceeds the initial budget, and a failed
/// store never consumes a unit.
#[derive(Debug)]
pub struct CrawlBudget {
    initial: u64,
    remaining: Mutex<u64>,
}

/// Outcome of a budget-guarded store
#[derive(Debug, PartialEq, Eq)]
pub enum Spend<T> {
    /// The operation ran and one unit was consumed; `remaining` is the count after it
    Spent { value: T, remaining: u64 },
    /// The budget was already exhausted; the operation did not run
    Exhausted,
}

impl CrawlBudget {
    pub fn new(pages: u64) -> Self {
        Self {
            initial: pages,
            remaining: Mutex::new(pages),
        }
    }

    /// Pages still allowed
    pub fn remaining(&self) -> u64 {
        *self.remaining.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pages consumed so far
    pub fn spent(&self) -> u64 {
        self.initial - self.remaining()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Runs `op` and consumes one unit if it succeeds, all under the budget lock
    ///
    /// Returns `Spend::Exhausted` without running `op` when nothing is left.
    /// `op` should be short: it is synchronous and every other spender waits
    /// on the lock while it runs.
    pub fn try_spend<T, E>(&self, op: impl FnOnce() -> Result<T, E>) -> Result<Spend<T>, E> {
        let mut remaining = self.remaining.lock().unwrap_or_else(PoisonError::into_inner);

        if *remaining == 0 {
            return Ok(Spend::Exhausted);
        }

        let value = op()?;
        *remaining -= 1;

        Ok(Spend::Spent {
            value,
            remaining: *remaining,
        })
    }
}
