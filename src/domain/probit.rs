//! Inverse standard normal CDF (probit).
//!
//! Acklam's rational approximation, split into a central region and two
//! tails. Relative error is below 1.15e-9 over the whole open interval,
//! which is well beyond the `f32` precision of the feature vector.

/// Smallest probability handed to [`probit`].
pub const PROBABILITY_FLOOR: f64 = 1e-12;

/// Central / tail breakpoint.
const P_LOW: f64 = 0.02425;
const P_HIGH: f64 = 1.0 - P_LOW;

// Central region numerator / denominator.
const A: [f64; 6] = [
    -39.6968302866538,
    220.946098424521,
    -275.928510446969,
    138.357751867269,
    -30.6647980661472,
    2.50662827745924,
];
const B: [f64; 5] = [
    -54.4760987982241,
    161.585836858041,
    -155.698979859887,
    66.8013118877197,
    -13.2806815528857,
];

// Tail numerator / denominator.
const C: [f64; 6] = [
    -7.78489400243029e-03,
    -0.322396458041136,
    -2.40075827716184,
    -2.54973253934373,
    4.37466414146497,
    2.93816398269878,
];
const D: [f64; 4] = [
    7.78469570904146e-03,
    0.32246712907004,
    2.445134137143,
    3.75440866190742,
];

/// Clamp a probability into `[1e-12, 1 - 1e-12]` so [`probit`] stays finite.
///
/// NaN passes through untouched.
#[must_use]
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR)
}

/// Approximate Φ⁻¹(p) for `p` strictly inside (0, 1).
///
/// Callers are expected to clamp with [`clamp_probability`] first; the
/// exact endpoints do not produce a finite result.
#[must_use]
pub fn probit(p: f64) -> f64 {
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        return tail(q);
    }
    if P_HIGH < p {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        return -tail(q);
    }

    let q = p - 0.5;
    let r = q * q;
    (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
        / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
}

fn tail(q: f64) -> f64 {
    (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
        / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
}
