//! Conversion between binding free energy (kcal/mol) and Ki / IC50.

use std::f64::consts::LN_10;

use crate::error::Result;
use crate::models::{PairedSamples, Unit};

/// RT in kcal/mol at ~298 K.
pub const RT_KCAL: f64 = 0.5961;

impl Unit {
    /// Ki / IC50 in this unit for a binding free energy in kcal/mol.
    pub fn concentration_from(self, delta_g: f64) -> f64 {
        (delta_g / RT_KCAL).exp() / self.multiplier()
    }

    /// Binding free energy in kcal/mol for a Ki / IC50 in this unit.
    pub fn free_energy_from(self, concentration: f64) -> f64 {
        (concentration * self.multiplier()).ln() * RT_KCAL
    }

    /// `log10` of [`Unit::concentration_from`], computed without the
    /// intermediate exponential so large energies stay finite.
    pub fn log10_concentration_from(self, delta_g: f64) -> f64 {
        delta_g / (RT_KCAL * LN_10) - self.multiplier().log10()
    }
}

/// Converts a binding energy in kcal/mol to a Ki or IC50 in `units`.
pub fn free_energy_to_concentration(delta_g: f64, units: &str) -> Result<f64> {
    let unit: Unit = units.parse()?;
    Ok(unit.concentration_from(delta_g))
}

/// Converts a Ki or IC50 in `units` to a binding energy in kcal/mol.
pub fn concentration_to_free_energy(concentration: f64, units: &str) -> Result<f64> {
    let unit: Unit = units.parse()?;
    Ok(unit.free_energy_from(concentration))
}

impl PairedSamples {
    /// Both columns expressed as Ki / IC50 in `unit`.
    pub fn to_concentration(&self, unit: Unit) -> Result<PairedSamples> {
        PairedSamples::new(
            self.predicted().iter().map(|&v| unit.concentration_from(v)).collect(),
            self.experimental().iter().map(|&v| unit.concentration_from(v)).collect(),
        )
    }

    /// Builds a kcal/mol sample set from Ki / IC50 columns in `unit`.
    ///
    /// Non-positive concentrations map to non-finite energies and are
    /// rejected by the constructor.
    pub fn from_concentration(
        predicted: &[f64],
        experimental: &[f64],
        unit: Unit,
    ) -> Result<PairedSamples> {
        PairedSamples::new(
            predicted.iter().map(|&v| unit.free_energy_from(v)).collect(),
            experimental.iter().map(|&v| unit.free_energy_from(v)).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetkError;

    #[test]
    fn round_trip_is_identity() {
        for units in ["uM", "nM"] {
            for &dg in &[-14.2, -11.11, -8.0, -5.5, 0.0, 1.3] {
                let conc = free_energy_to_concentration(dg, units).unwrap();
                let back = concentration_to_free_energy(conc, units).unwrap();
                assert!((back - dg).abs() < 1e-9, "{units}: {dg} -> {conc} -> {back}");
            }
        }
    }

    #[test]
    fn known_nanomolar_value() {
        let ki = free_energy_to_concentration(-11.11, "nM").unwrap();
        assert!((ki - 8.05).abs() < 0.01, "got {ki}");

        let dg = concentration_to_free_energy(8.0, "nM").unwrap();
        assert!((dg + 11.11).abs() < 0.01, "got {dg}");
    }

    #[test]
    fn micromolar_is_thousand_times_smaller() {
        let um = Unit::Micromolar.concentration_from(-9.0);
        let nm = Unit::Nanomolar.concentration_from(-9.0);
        assert!((nm / um - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn unsupported_unit_is_rejected() {
        assert!(matches!(
            free_energy_to_concentration(-9.0, "mM"),
            Err(MetkError::UnsupportedUnit(u)) if u == "mM"
        ));
        assert!(matches!(
            concentration_to_free_energy(1.0, "pM"),
            Err(MetkError::UnsupportedUnit(_))
        ));
    }

    #[test]
    fn sample_set_conversion_round_trips() {
        let samples = PairedSamples::new(vec![-10.0, -9.0], vec![-10.5, -8.2]).unwrap();
        let ki = samples.to_concentration(Unit::Nanomolar).unwrap();
        let back =
            PairedSamples::from_concentration(ki.predicted(), ki.experimental(), Unit::Nanomolar)
                .unwrap();
        for (a, b) in back.experimental().iter().zip(samples.experimental()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_concentration_is_rejected() {
        assert!(matches!(
            PairedSamples::from_concentration(&[0.0], &[1.0], Unit::Micromolar),
            Err(MetkError::InvalidValue { .. })
        ));
    }

    #[test]
    fn log_concentration_matches_and_stays_finite() {
        for unit in [Unit::Micromolar, Unit::Nanomolar] {
            let direct = unit.concentration_from(-9.3).log10();
            assert!((unit.log10_concentration_from(-9.3) - direct).abs() < 1e-12);
        }
        assert!(Unit::Micromolar.concentration_from(500.0).is_infinite());
        let log_ki = Unit::Micromolar.log10_concentration_from(500.0);
        assert!(log_ki.is_finite());
        assert!((log_ki - (500.0 / (RT_KCAL * LN_10) + 6.0)).abs() < 1e-9);
    }
}
