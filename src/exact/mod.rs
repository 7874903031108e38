//! Exact solvers module.
//!
//! All three are exponential and refuse instances above their node ceiling
//! with `ComplexityLimitExceeded`.

pub mod backtracking;
pub mod branch_bound;
pub mod held_karp;

pub use backtracking::BacktrackingSolver;
pub use branch_bound::BranchAndBoundSolver;
pub use held_karp::{HeldKarpSolver, HELD_KARP_HARD_LIMIT};
