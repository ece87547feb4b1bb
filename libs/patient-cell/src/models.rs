use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};

use shared_models::error::AppError;
use shared_utils::query::optional_param;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "0+")]
    ZeroPositive,
    #[serde(rename = "0-")]
    ZeroNegative,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl BloodType {
    pub fn display_name(&self) -> &'static str {
        match self {
            BloodType::APositive => "A Rh+",
            BloodType::ANegative => "A Rh-",
            BloodType::BPositive => "B Rh+",
            BloodType::BNegative => "B Rh-",
            BloodType::AbPositive => "AB Rh+",
            BloodType::AbNegative => "AB Rh-",
            BloodType::ZeroPositive => "0 Rh+",
            BloodType::ZeroNegative => "0 Rh-",
            BloodType::Unknown => "Bilinmiyor",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub blood_type: BloodType,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub chronic_diseases: String,
    #[serde(default)]
    pub current_medications: String,
    #[serde(default)]
    pub emergency_contact_name: String,
    #[serde(default)]
    pub emergency_contact_phone: String,
    #[serde(default)]
    pub notes: String,
    pub sms_consent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.date_of_birth.and_then(|dob| today.years_since(dob))
    }
}

fn default_sms_consent() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub clinic_id: Uuid,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub blood_type: BloodType,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub chronic_diseases: String,
    #[serde(default)]
    pub current_medications: String,
    #[serde(default)]
    pub emergency_contact_name: String,
    #[serde(default)]
    pub emergency_contact_phone: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_sms_consent")]
    pub sms_consent: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_type: Option<BloodType>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
    pub current_medications: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
    pub sms_consent: Option<bool>,
}

/// Query string of `GET /patients` as sent; a blank clinic means every clinic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientListParams {
    pub clinic: Option<String>,
    pub name: Option<String>,
}

impl PatientListParams {
    pub fn into_query(self) -> Result<PatientListQuery, AppError> {
        Ok(PatientListQuery {
            clinic: optional_param("clinic", self.clinic.as_deref())?,
            name: self.name,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientListQuery {
    pub clinic: Option<Uuid>,
    /// Case-insensitive fragment of the patient's name.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
