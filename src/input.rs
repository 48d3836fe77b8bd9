// Measurement Input
// Editable form values; each stays unset until the user enters it

use crate::formula::Sex;
use crate::reference::PersonRecord;
use std::ops::RangeInclusive;

pub const HEIGHT_RANGE_CM: RangeInclusive<f64> = 50.0..=250.0;
pub const WEIGHT_RANGE_KG: RangeInclusive<f64> = 30.0..=200.0;
pub const RESISTANCE_RANGE_OHM: RangeInclusive<f64> = 1.0..=1000.0;

/// Clamp into `range`. Non-finite values are rejected.
pub fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> Option<f64> {
    if value.is_finite() {
        Some(value.clamp(*range.start(), *range.end()))
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementInput {
    pub identifier: String,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    resistance_ohm: Option<f64>,
    sex: Option<Sex>,
}

/// All four values present; ready for the formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompleteInput {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub resistance_ohm: f64,
    pub sex: Sex,
}

impl MeasurementInput {
    /// Start from a reference person: height and sex become the editable defaults.
    pub fn for_person(person: &PersonRecord) -> Self {
        let mut input = MeasurementInput {
            identifier: person.identifier.clone(),
            ..Default::default()
        };
        input.set_height(person.height_cm);
        input.set_sex(person.sex);
        input
    }

    pub fn height_cm(&self) -> Option<f64> {
        self.height_cm
    }

    pub fn weight_kg(&self) -> Option<f64> {
        self.weight_kg
    }

    pub fn resistance_ohm(&self) -> Option<f64> {
        self.resistance_ohm
    }

    pub fn sex(&self) -> Option<Sex> {
        self.sex
    }

    pub fn set_height(&mut self, value: Option<f64>) {
        self.height_cm = value.and_then(|v| clamp_to(v, &HEIGHT_RANGE_CM));
    }

    pub fn set_weight(&mut self, value: Option<f64>) {
        self.weight_kg = value.and_then(|v| clamp_to(v, &WEIGHT_RANGE_KG));
    }

    pub fn set_resistance(&mut self, value: Option<f64>) {
        self.resistance_ohm = value.and_then(|v| clamp_to(v, &RESISTANCE_RANGE_OHM));
    }

    pub fn set_sex(&mut self, sex: Option<Sex>) {
        self.sex = sex;
    }

    /// Keep the person's defaults but carry over live measurements
    pub fn reselect(&mut self, person: &PersonRecord) {
        let weight = self.weight_kg;
        let resistance = self.resistance_ohm;
        *self = MeasurementInput::for_person(person);
        self.weight_kg = weight;
        self.resistance_ohm = resistance;
    }

    /// Labels of the fields still empty, in form order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.height_cm.is_none() {
            missing.push("Lengte (cm)");
        }
        if self.sex.is_none() {
            missing.push("Geslacht");
        }
        if self.weight_kg.is_none() {
            missing.push("Gewicht (kg)");
        }
        if self.resistance_ohm.is_none() {
            missing.push("Resistentie");
        }
        missing
    }

    pub fn complete(&self) -> Option<CompleteInput> {
        Some(CompleteInput {
            height_cm: self.height_cm?,
            weight_kg: self.weight_kg?,
            resistance_ohm: self.resistance_ohm?,
            sex: self.sex?,
        })
    }
}
