//! Heuristics module.
//!
//! Tour constructions without an optimality guarantee.

pub mod aco;
pub mod bitonic;
pub mod construction;
pub mod grid;

pub use aco::*;
pub use bitonic::*;
pub use construction::*;
pub use grid::*;
