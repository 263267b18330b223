//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `WorkerState`: the per-worker crawl loop state machine
//! - `DomainState`: per-origin request scheduling (politeness slots)
//! - `CrawlBudget`: the shared page budget
//! - `StopSignal`: the one-way stop latch observed by every worker

mod budget;
mod domain_state;
mod stop;
mod worker_state;

pub use budget::{CrawlBudget, Spend};
pub use domain_state::DomainState;
pub use stop::{StopReason, StopSignal};
pub use worker_state::WorkerState;
