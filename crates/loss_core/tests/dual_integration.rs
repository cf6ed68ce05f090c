//! Integration tests for the dual number type.
//!
//! Derivatives from `loss_core::types::Dual` are checked against closed
//! forms (property based) and against `num_dual::Dual64` as an independent
//! forward-mode implementation.

use approx::assert_relative_eq;
use loss_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
use loss_core::types::{Dual, Scalar};
use num_dual::{Dual64, DualNum};
use proptest::prelude::*;

/// Hazard-style composite used throughout the models: 1 - exp(-exp(a + b ln x)).
fn hazard_pd<S: Scalar>(x: S, a: f64, b: f64) -> S {
    -((x.ln() * b + a).exp() * -1.0).exp() + 1.0
}

#[test]
fn test_matches_num_dual_on_composite() {
    let x = 2.5;
    let ours = Dual::variable(x);
    let reference = Dual64::new(x, 1.0);

    let f_ours = (ours * ours + 1.0).sqrt() * ours.exp() / (ours.ln() + 3.0);
    let f_ref = (reference * reference + 1.0).sqrt() * reference.exp() / (reference.ln() + 3.0);

    assert_relative_eq!(f_ours.value(), f_ref.re, epsilon = 1e-10);
    assert_relative_eq!(f_ours.derivative(), f_ref.eps, epsilon = 1e-10);
}

#[test]
fn test_matches_num_dual_on_trig_and_powf() {
    let x = 0.8;
    let ours = Dual::variable(x);
    let reference = Dual64::new(x, 1.0);

    let f_ours = ours.sin() * ours.cos() + ours.powf(2.5);
    let f_ref = reference.sin() * reference.cos() + reference.powf(2.5);

    assert_relative_eq!(f_ours.value(), f_ref.re, epsilon = 1e-12);
    assert_relative_eq!(f_ours.derivative(), f_ref.eps, epsilon = 1e-12);
}

#[test]
fn test_hazard_pd_derivative_closed_form() {
    let (a, b, t) = (-4.0, 1.2, 18.0);
    let pd = hazard_pd(Dual::variable(t), a, b);

    // d/dt [1 - exp(-H)] with H = exp(a) t^b is exp(-H) · b · H / t
    let h = a.exp() * t.powf(b);
    let expected = (-h).exp() * b * h / t;

    assert_relative_eq!(pd.value(), 1.0 - (-h).exp(), epsilon = 1e-12);
    assert_relative_eq!(pd.derivative(), expected, epsilon = 1e-12);
}

#[test]
fn test_newton_inverts_hazard_curve() {
    let (a, b) = (-4.0, 1.2);
    let u = 0.3;
    let solver = NewtonRaphsonSolver::new(SolverConfig::default());
    let solution = solver.find_root(|t: Dual| hazard_pd(t, a, b) - u, 10.0);

    assert!(solution.is_converged());
    assert_relative_eq!(hazard_pd(solution.root, a, b), u, epsilon = 1e-6);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn test_chain_rule_exp_of_square(x in -3.0..3.0f64) {
        let y = (Dual::variable(x) * Dual::variable(x)).exp();
        let expected = 2.0 * x * (x * x).exp();
        prop_assert!((y.derivative() - expected).abs() <= 1e-9 * expected.abs().max(1.0));
    }

    #[test]
    fn test_chain_rule_log_of_sqrt(x in 0.01..100.0f64) {
        // d/dx ln(sqrt(x)) = 1 / (2x)
        let y = Dual::variable(x).sqrt().ln();
        prop_assert!((y.derivative() - 0.5 / x).abs() <= 1e-9 * (0.5 / x).max(1.0));
    }

    #[test]
    fn test_chain_rule_erf_scaled(x in -4.0..4.0f64, k in 0.1..3.0f64) {
        // d/dx erf(kx) = 2k/√π · exp(-k²x²)
        let y = (Dual::variable(x) * k).erf();
        let expected = 2.0 * k / std::f64::consts::PI.sqrt() * (-(k * x) * (k * x)).exp();
        prop_assert!((y.derivative() - expected).abs() <= 1e-12);
    }

    #[test]
    fn test_quotient_matches_num_dual(x in 0.1..10.0f64, c in 0.5..5.0f64) {
        let ours = Dual::variable(x) / (Dual::variable(x) + c);
        let reference = Dual64::new(x, 1.0) / (Dual64::new(x, 1.0) + c);
        prop_assert!((ours.derivative() - reference.eps).abs() <= 1e-12);
    }

    #[test]
    fn test_ordering_uses_value_only(a in -1e6..1e6f64, b in -1e6..1e6f64, da in -10.0..10.0f64) {
        let lhs = Dual::new(a, da);
        let rhs = Dual::constant(b);
        prop_assert_eq!(lhs < rhs, a < b);
        prop_assert_eq!(lhs == rhs, a == b);
    }
}
