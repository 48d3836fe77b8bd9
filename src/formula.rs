// Formula Engine
// Muscle mass estimate from height, weight, resistance and sex

use serde::{Deserialize, Serialize};
use std::fmt;

const INTERCEPT: f64 = 0.827;
const RESISTANCE_INDEX_COEF: f64 = 0.19;
const SEX_COEF: f64 = 2.101;
const WEIGHT_COEF: f64 = 0.079;

/// Biological sex as used by the regression model.
/// The numeric code is fixed by the model: male = 1, female = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn code(&self) -> u8 {
        match self {
            Sex::Male => 1,
            Sex::Female => 0,
        }
    }

    /// Label written to the `Gender` column of the measurement log
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "Man",
            Sex::Female => "Vrouw",
        }
    }

    /// Map a reference-table code. The integer part 1 is male, every other number is female.
    pub fn from_code(code: f64) -> Self {
        if code.trunc() == 1.0 {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "man" | "male" | "m" | "1" => Some(Sex::Male),
            "vrouw" | "female" | "v" | "f" | "0" => Some(Sex::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("Fout in berekening: Resistentie mag niet nul zijn.")]
    DivisionByZero,

    #[error("Fout in berekening: ongeldige invoer (geen eindig getal)")]
    NonFinite,
}

/// Compute the muscle mass estimate in kg.
///
/// `mass = (0.827 + 0.19 * h²/R + 2.101 * sex + 0.079 * w) / (h² / 10000)`
///
/// A zero height or resistance is reported as [`FormulaError::DivisionByZero`]
/// instead of producing an infinite value.
pub fn compute_mass(
    height_cm: f64,
    weight_kg: f64,
    resistance_ohm: f64,
    sex: Sex,
) -> Result<f64, FormulaError> {
    if !(height_cm.is_finite() && weight_kg.is_finite() && resistance_ohm.is_finite()) {
        return Err(FormulaError::NonFinite);
    }
    if resistance_ohm == 0.0 || height_cm == 0.0 {
        return Err(FormulaError::DivisionByZero);
    }

    let height_sq = height_cm * height_cm;
    let numerator = INTERCEPT
        + RESISTANCE_INDEX_COEF * (height_sq / resistance_ohm)
        + SEX_COEF * f64::from(sex.code())
        + WEIGHT_COEF * weight_kg;
    let mass = numerator / (height_sq / 10_000.0);

    if mass.is_finite() {
        Ok(mass)
    } else {
        Err(FormulaError::NonFinite)
    }
}
