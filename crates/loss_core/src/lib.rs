//! # loss_core: Numerical Foundation for Credit Loss Simulation
//!
//! ## Layer 1 (Foundation) Role
//!
//! loss_core is the bottom layer of the workspace and provides:
//! - Forward-mode dual numbers and the [`Scalar`](types::Scalar) abstraction (`types::dual`)
//! - Structured error taxonomy shared by every layer (`types::error`)
//! - Newton–Raphson and bisection root finders (`math::solvers`)
//! - Row-appendable dense matrix for loan attribute tables (`math::matrix`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other loss_* crates, with minimal external dependencies:
//! - num-traits: `Zero`/`One` identities for the dual type
//! - statrs: the error function for `f64`
//! - thiserror: error derives
//! - serde: serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use loss_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
//! use loss_core::types::Dual;
//!
//! // Solve x² - 2 = 0 with derivatives from the dual number
//! let solver = NewtonRaphsonSolver::new(SolverConfig::default());
//! let solution = solver.find_root(|x: Dual| x * x - 2.0, 1.0);
//!
//! assert!(solution.is_converged());
//! assert!((solution.root - std::f64::consts::SQRT_2).abs() < 1e-6);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for `Dual` and solver results

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod math;
pub mod types;
