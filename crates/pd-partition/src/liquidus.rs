//! Pressure-only peridotite liquidus.

/// Evaluate `T[K] = sum_i c_i * P^i` by Horner's rule.
pub fn liquidus_temperature(coefficients: &[f64], pressure_gpa: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * pressure_gpa + c)
}
