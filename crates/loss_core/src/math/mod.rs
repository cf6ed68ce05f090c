//! Numerical building blocks.
//!
//! - [`solvers`]: scalar root finding (Newton–Raphson with dual numbers, bisection)
//! - [`matrix`]: dense, row-appendable loan attribute storage

pub mod matrix;
pub mod solvers;

pub use matrix::DenseMatrix;
