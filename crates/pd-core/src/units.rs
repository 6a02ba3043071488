// pd-core/src/units.rs

use uom::si::f64::{Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature};

// Public canonical unit types (SI, f64)
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

/// Pressures are quoted in GPa throughout the partitioning fits.
#[inline]
pub fn gpa(v: f64) -> Pressure {
    use uom::si::pressure::gigapascal;
    Pressure::new::<gigapascal>(v)
}

#[inline]
pub fn kelvin(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn to_gpa(p: Pressure) -> f64 {
    use uom::si::pressure::gigapascal;
    p.get::<gigapascal>()
}

#[inline]
pub fn to_kelvin(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_in_working_units() {
        assert!((to_gpa(gpa(54.0)) - 54.0).abs() < 1e-9);
        assert!((to_kelvin(kelvin(3500.0)) - 3500.0).abs() < 1e-9);
    }

    #[test]
    fn gigapascal_is_stored_in_pascal() {
        assert!((gpa(1.0).value - 1.0e9).abs() < 1e-3);
    }

    #[test]
    fn near_vacuum_pressure_stays_positive() {
        assert!(gpa(0.0001).value > 0.0);
        assert!((to_gpa(gpa(0.0001)) - 1.0e-4).abs() < 1e-15);
    }
}
