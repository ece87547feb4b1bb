use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use shared_models::error::AppError;
use shared_utils::query::optional_param;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClinicRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dentist {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDentistRequest {
    pub clinic_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDentistRequest {
    pub clinic_id: Option<Uuid>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

/// Query string of `GET /dentists` as sent; a blank clinic means every clinic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DentistListParams {
    pub clinic: Option<String>,
}

impl DentistListParams {
    pub fn into_query(self) -> Result<DentistListQuery, AppError> {
        Ok(DentistListQuery {
            clinic: optional_param("clinic", self.clinic.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DentistListQuery {
    pub clinic: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ClinicError {
    #[error("Clinic not found")]
    ClinicNotFound,

    #[error("Dentist not found")]
    DentistNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_dentists_are_active_by_default() {
        let request: CreateDentistRequest = serde_json::from_value(json!({
            "clinic_id": Uuid::new_v4(),
            "name": "Ayşe Yılmaz"
        }))
        .unwrap();

        assert!(request.is_active);
        assert!(request.specialty.is_empty());
    }

    #[test]
    fn test_clinic_tolerates_missing_optional_text() {
        let clinic: Clinic = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": "Gülüş Diş Kliniği",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(clinic.address, "");
    }
}
