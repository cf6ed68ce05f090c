//! Archimedean copula sampler (Marshall–Olkin construction).

use super::LaplaceTransform;
use crate::rng::LossRng;

/// Archimedean copula generated by the Laplace transform of a frailty.
///
/// Given a realised frailty `w`, each index draws `E = −ln(U)/w` with
/// `U` uniform on `(0, 1)` and reports `L(E)`. The resulting uniforms are
/// exchangeable with dependence driven by the spread of `W`.
///
/// # Examples
///
/// ```rust
/// use loss_engine::frailty::{ArchimedeanCopula, InverseGaussianFrailty};
/// use loss_engine::rng::LossRng;
///
/// let copula = ArchimedeanCopula::new(InverseGaussianFrailty::new(1.0, 2.0).unwrap());
/// let mut rng = LossRng::from_seed(9);
///
/// let u = copula.uniforms(5, 1.3, &mut rng);
/// assert_eq!(u.len(), 5);
/// assert!(u.iter().all(|v| *v > 0.0 && *v < 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct ArchimedeanCopula<L> {
    generator: L,
}

impl<L: LaplaceTransform> ArchimedeanCopula<L> {
    /// Creates a copula from a Laplace transform.
    pub fn new(generator: L) -> Self {
        Self { generator }
    }

    /// Generator (Laplace transform) of the copula.
    pub fn generator(&self) -> &L {
        &self.generator
    }

    /// Draws `m` copula uniforms under frailty `frailty`, passing each to
    /// `callback(u, index)`.
    pub fn generate<F>(&self, m: usize, frailty: f64, rng: &mut LossRng, mut callback: F)
    where
        F: FnMut(f64, usize),
    {
        for i in 0..m {
            let e = -rng.gen_uniform_open().ln() / frailty;
            callback(self.generator.laplace(e), i);
        }
    }

    /// Collects `m` copula uniforms.
    pub fn uniforms(&self, m: usize, frailty: f64, rng: &mut LossRng) -> Vec<f64> {
        let mut out = Vec::with_capacity(m);
        self.generate(m, frailty, rng, |u, _| out.push(u));
        out
    }
}
