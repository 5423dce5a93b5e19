use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Age the analysis model is given when the patient's date of birth is unknown.
pub const DEFAULT_PATIENT_AGE: i32 = 50;
/// Sex the analysis model is given when the patient record carries neither
/// a `sex` nor a `gender` value.
pub const DEFAULT_PATIENT_SEX: &str = "Male";

/// The slice of patient data the analysis model needs, resolved from the
/// patients table with defaults applied where the record is incomplete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientProfile {
    pub age: i32,
    pub sex: String,
    pub name: Option<String>,
}

impl Default for PatientProfile {
    fn default() -> Self {
        Self {
            age: DEFAULT_PATIENT_AGE,
            sex: DEFAULT_PATIENT_SEX.to_string(),
            name: None,
        }
    }
}

impl PatientProfile {
    /// Build a profile from raw patient columns, applying the defaults.
    pub fn resolve(
        dob: Option<NaiveDate>,
        sex: Option<String>,
        gender: Option<String>,
        name: Option<String>,
    ) -> Self {
        let age = dob
            .map(|d| age_from_dob(d, Utc::now().date_naive()))
            .unwrap_or(DEFAULT_PATIENT_AGE);
        let sex = sex
            .filter(|s| !s.is_empty())
            .or_else(|| gender.filter(|g| !g.is_empty()))
            .unwrap_or_else(|| DEFAULT_PATIENT_SEX.to_string());
        Self { age, sex, name }
    }
}

/// Whole-year age at `today`, accounting for whether the birthday has
/// occurred yet this year.
pub fn age_from_dob(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    let had_birthday = (today.month(), today.day()) >= (dob.month(), dob.day());
    if !had_birthday {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_after_birthday_this_year() {
        assert_eq!(age_from_dob(date(1960, 3, 15), date(2026, 8, 7)), 66);
    }

    #[test]
    fn test_age_before_birthday_this_year() {
        assert_eq!(age_from_dob(date(1960, 11, 2), date(2026, 8, 7)), 65);
    }

    #[test]
    fn test_age_on_birthday() {
        assert_eq!(age_from_dob(date(1980, 8, 7), date(2026, 8, 7)), 46);
    }

    #[test]
    fn test_resolve_with_full_record() {
        let profile = PatientProfile::resolve(
            Some(date(1956, 1, 20)),
            Some("Female".to_string()),
            None,
            Some("Jane Doe".to_string()),
        );
        assert_eq!(profile.sex, "Female");
        assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
        assert!(profile.age >= 70);
    }

    #[test]
    fn test_resolve_falls_back_to_gender_column() {
        let profile = PatientProfile::resolve(None, None, Some("Female".to_string()), None);
        assert_eq!(profile.sex, "Female");
        assert_eq!(profile.age, DEFAULT_PATIENT_AGE);
    }

    #[test]
    fn test_resolve_defaults_when_record_empty() {
        let profile = PatientProfile::resolve(None, Some(String::new()), None, None);
        assert_eq!(profile, PatientProfile::default());
    }
}
