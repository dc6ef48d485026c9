// src/watch/mod.rs
// =============================================================================
// This module keeps registered sites under watch.
//
// Features:
// - One independent, repeating check loop per site
// - New sites can be added at any time without touching running loops
// - All loops stop together on shutdown, with a bounded grace period
// =============================================================================

mod scheduler;

pub use scheduler::Scheduler;
