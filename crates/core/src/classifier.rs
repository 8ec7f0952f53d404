//! Priority classification from symptoms and vitals.
//!
//! A deterministic front-desk rule set, not clinical decision support.

use crate::constants::{URGENT_PULSE_BPM, URGENT_TEMPERATURE_F};
use crate::models::{PriorityClass, SymptomTag, Vitals};

/// Classifies a patient into a priority class. Pure and total.
///
/// Rules apply in order, first match wins:
///
/// 1. Any critical symptom tag (chest pain, breathing difficulty, bleeding,
///    unconscious) → critical.
/// 2. Fever or pain tag, pulse above 120 bpm, or temperature above 103 °F
///    → urgent.
/// 3. Otherwise → non-urgent.
///
/// Missing vitals fields never trigger the threshold checks.
pub fn classify(symptoms: &[SymptomTag], vitals: &Vitals) -> PriorityClass {
    if symptoms.iter().any(|s| s.is_critical()) {
        return PriorityClass::Critical;
    }

    let symptomatic =
        symptoms.contains(&SymptomTag::Fever) || symptoms.contains(&SymptomTag::Pain);
    let pulse_high = vitals.pulse.is_some_and(|p| p > URGENT_PULSE_BPM);
    let temperature_high = vitals
        .temperature
        .is_some_and(|t| t > URGENT_TEMPERATURE_F);

    if symptomatic || pulse_high || temperature_high {
        PriorityClass::Urgent
    } else {
        PriorityClass::NonUrgent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(pulse: Option<u32>, temperature: Option<f64>) -> Vitals {
        Vitals {
            blood_pressure: None,
            pulse,
            temperature,
        }
    }

    #[test]
    fn unconscious_is_critical_regardless_of_other_fields() {
        let combos: &[&[SymptomTag]] = &[
            &[SymptomTag::Unconscious],
            &[SymptomTag::Unconscious, SymptomTag::Fever],
            &[SymptomTag::Headache, SymptomTag::Unconscious, SymptomTag::Other],
        ];
        for symptoms in combos {
            assert_eq!(
                classify(symptoms, &vitals(Some(60), Some(97.0))),
                PriorityClass::Critical
            );
        }
    }

    #[test]
    fn every_critical_tag_wins_over_urgent_signals() {
        for tag in [
            SymptomTag::ChestPain,
            SymptomTag::BreathingDifficulty,
            SymptomTag::Bleeding,
            SymptomTag::Unconscious,
        ] {
            assert_eq!(
                classify(&[tag, SymptomTag::Fever], &vitals(Some(180), Some(105.0))),
                PriorityClass::Critical
            );
        }
    }

    #[test]
    fn fever_or_pain_tag_is_urgent() {
        assert_eq!(
            classify(&[SymptomTag::Fever], &Vitals::default()),
            PriorityClass::Urgent
        );
        assert_eq!(
            classify(&[SymptomTag::Pain], &Vitals::default()),
            PriorityClass::Urgent
        );
    }

    #[test]
    fn vitals_thresholds_are_strict() {
        // Exactly at the threshold does not trigger.
        assert_eq!(
            classify(&[], &vitals(Some(120), Some(103.0))),
            PriorityClass::NonUrgent
        );
        assert_eq!(
            classify(&[], &vitals(Some(121), None)),
            PriorityClass::Urgent
        );
        assert_eq!(
            classify(&[], &vitals(None, Some(103.1))),
            PriorityClass::Urgent
        );
    }

    #[test]
    fn missing_vitals_and_benign_tags_are_non_urgent() {
        assert_eq!(
            classify(&[SymptomTag::Headache, SymptomTag::Nausea], &Vitals::default()),
            PriorityClass::NonUrgent
        );
        assert_eq!(classify(&[], &Vitals::default()), PriorityClass::NonUrgent);
    }
}
