// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Catalog exercise model and the weekly plan it belongs to.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A prescribed set or rep count.
///
/// Older catalog documents use plain integers, newer ones free-form ranges
/// such as `"10-15"`. Both deserialize into this one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPrescription", into = "RawPrescription")]
pub enum Prescription {
    Fixed(u32),
    Range { min: u32, max: u32 },
}

impl Prescription {
    /// Upper bound of the prescription, used as the "total sets" snapshot.
    pub fn target(&self) -> u32 {
        match self {
            Prescription::Fixed(n) => *n,
            Prescription::Range { max, .. } => *max,
        }
    }

    /// Parse `"12"`, `"10-15"` or `"10–15"` (en dash).
    pub fn parse(raw: &str) -> Result<Self, PrescriptionError> {
        let raw = raw.trim();
        let invalid = || PrescriptionError(raw.to_string());

        match raw.split_once(&['-', '–'][..]) {
            Some((lo, hi)) => {
                let min: u32 = lo.trim().parse().map_err(|_| invalid())?;
                let max: u32 = hi.trim().parse().map_err(|_| invalid())?;
                if min > max {
                    return Err(invalid());
                }
                if min == max {
                    Ok(Prescription::Fixed(min))
                } else {
                    Ok(Prescription::Range { min, max })
                }
            }
            None => raw.parse().map(Prescription::Fixed).map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for Prescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prescription::Fixed(n) => write!(f, "{}", n),
            Prescription::Range { min, max } => write!(f, "{}-{}", min, max),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid set/rep prescription: {0:?}")]
pub struct PrescriptionError(String);

/// Wire shape of a prescription: a bare count or a range string.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawPrescription {
    Count(u32),
    Text(String),
}

impl TryFrom<RawPrescription> for Prescription {
    type Error = PrescriptionError;

    fn try_from(raw: RawPrescription) -> Result<Self, Self::Error> {
        match raw {
            RawPrescription::Count(n) => Ok(Prescription::Fixed(n)),
            RawPrescription::Text(s) => Prescription::parse(&s),
        }
    }
}

impl From<Prescription> for RawPrescription {
    fn from(p: Prescription) -> Self {
        match p {
            Prescription::Fixed(n) => RawPrescription::Count(n),
            range => RawPrescription::Text(range.to_string()),
        }
    }
}

/// A single exercise as defined by the workout plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Display name, unique within a day
    pub name: String,
    /// Muscles worked (free text)
    pub target_muscles: String,
    pub sets: Prescription,
    pub reps: Prescription,
    pub weight_guidance: String,
    /// Posture and form guidance
    pub posture: String,
    #[serde(default)]
    pub dos: Vec<String>,
    #[serde(default)]
    pub donts: Vec<String>,
    /// Tutorial video links, may be empty
    #[serde(default)]
    pub tutorial_urls: Vec<String>,
}

/// Weekly schedule: one ordered exercise list per weekday.
#[derive(Debug, Clone, Default)]
pub struct WorkoutPlan {
    schedule: [Vec<Exercise>; 7],
}

impl WorkoutPlan {
    pub fn new(schedule: [Vec<Exercise>; 7]) -> Self {
        Self { schedule }
    }

    pub fn exercises_for(&self, day: Weekday) -> &[Exercise] {
        &self.schedule[day.num_days_from_monday() as usize]
    }

    /// A weekday with nothing scheduled.
    pub fn is_rest_day(&self, day: Weekday) -> bool {
        self.exercises_for(day).is_empty()
    }

    /// All weekdays in week order (Monday first) with their exercises.
    pub fn days(&self) -> impl Iterator<Item = (Weekday, &[Exercise])> {
        crate::time_utils::WEEK
            .iter()
            .map(move |&day| (day, self.exercises_for(day)))
    }

    /// First exercise with this name, scanning Monday through Sunday.
    pub fn find_exercise(&self, name: &str) -> Option<&Exercise> {
        self.schedule.iter().flatten().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prescription_from_integer_and_range() {
        let fixed: Prescription = serde_json::from_str("12").unwrap();
        assert_eq!(fixed, Prescription::Fixed(12));

        let range: Prescription = serde_json::from_str("\"10-15\"").unwrap();
        assert_eq!(range, Prescription::Range { min: 10, max: 15 });
        assert_eq!(range.target(), 15);

        let en_dash: Prescription = serde_json::from_str("\"8–12\"").unwrap();
        assert_eq!(en_dash, Prescription::Range { min: 8, max: 12 });
    }

    #[test]
    fn test_prescription_serializes_back_to_wire_shape() {
        assert_eq!(serde_json::to_string(&Prescription::Fixed(4)).unwrap(), "4");
        assert_eq!(
            serde_json::to_string(&Prescription::Range { min: 10, max: 15 }).unwrap(),
            "\"10-15\""
        );
    }

    #[test]
    fn test_prescription_rejects_inverted_range() {
        assert!(Prescription::parse("15-10").is_err());
        assert!(Prescription::parse("lots").is_err());
        assert_eq!(Prescription::parse("12-12").unwrap(), Prescription::Fixed(12));
    }
}
