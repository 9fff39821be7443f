//! Implied volatility: configuration, query types and the hybrid solver.

pub mod config;
pub mod solver;
pub mod types;

pub use config::{InitialGuess, SolverConfig, SolverMethod};
pub use solver::{solve, HybridSolver};
pub use types::{ImpliedVolQuery, ImpliedVolReport, SolverPhase, SolverState};
