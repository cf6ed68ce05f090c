//! Core numeric and error types.
//!
//! This module provides:
//! - `dual`: the [`Dual`] forward-mode AD number and the [`Scalar`] trait
//! - `error`: [`ModelError`], the error taxonomy shared by all layers

pub mod dual;
pub mod error;

pub use dual::{Dual, Scalar};
pub use error::ModelError;
