use crate::PdError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, PdError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PdError::NonFinite { what, value: v })
    }
}

/// Strictly positive and finite.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, PdError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(PdError::OutOfRange { what, value: v })
    }
}

/// Relative change `|current - previous| / |previous|`.
///
/// Two exact zeros count as no change; a move away from zero is infinite.
pub fn relative_change(previous: Real, current: Real) -> Real {
    if previous == 0.0 {
        if current == 0.0 { 0.0 } else { Real::INFINITY }
    } else {
        ((current - previous) / previous).abs()
    }
}
