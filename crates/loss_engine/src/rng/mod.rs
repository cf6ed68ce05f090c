//! # Random Number Generation
//!
//! Seeded pseudo-random number generation for Monte Carlo loss simulation.
//!
//! - **Reproducibility**: all generators are seeded; per-trial streams are
//!   derived deterministically from `(seed, trial)`
//! - **Efficiency**: batch operations fill `&mut [f64]` slices without
//!   allocating
//!
//! ## Usage Example
//!
//! ```rust
//! use loss_engine::rng::LossRng;
//!
//! let mut rng = LossRng::from_seed(12345);
//! let u = rng.gen_uniform();
//! let z = rng.gen_normal();
//! assert!((0.0..1.0).contains(&u));
//! assert!(z.is_finite());
//!
//! // Same (seed, trial) pair, same stream
//! let a = LossRng::for_trial(12345, 17).gen_uniform();
//! let b = LossRng::for_trial(12345, 17).gen_uniform();
//! assert_eq!(a, b);
//! ```

mod prng;

pub use prng::LossRng;
