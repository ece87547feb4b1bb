use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Patient, CreatePatientRequest, UpdatePatientRequest, PatientListQuery, PatientError};

pub struct PatientService {
    supabase: SupabaseClient,
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!(PatientError::ValidationError(format!("{} is required", field))));
    }
    Ok(())
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_patient(
        &self,
        request: CreatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient> {
        debug!("Creating patient {} in clinic {}", request.name, request.clinic_id);

        require("name", &request.name)?;
        require("phone", &request.phone)?;

        let now = Utc::now().to_rfc3339();
        let patient_data = json!({
            "clinic_id": request.clinic_id,
            "name": request.name.trim(),
            "phone": request.phone.trim(),
            "email": request.email,
            "date_of_birth": request.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
            "blood_type": request.blood_type,
            "allergies": request.allergies,
            "chronic_diseases": request.chronic_diseases,
            "current_medications": request.current_medications,
            "emergency_contact_name": request.emergency_contact_name,
            "emergency_contact_phone": request.emergency_contact_phone,
            "notes": request.notes,
            "sms_consent": request.sms_consent,
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Patient> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/patients",
            Some(auth_token),
            Some(patient_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let patient = result.into_iter().next()
            .ok_or_else(|| anyhow!(PatientError::DatabaseError("Failed to create patient".to_string())))?;

        info!("Patient created with ID: {}", patient.id);
        Ok(patient)
    }

    pub async fn get_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Patient> {
        debug!("Fetching patient: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Patient> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        result.into_iter().next().ok_or_else(|| anyhow!(PatientError::NotFound))
    }

    pub async fn list_patients(
        &self,
        query: PatientListQuery,
        auth_token: &str,
    ) -> Result<Vec<Patient>> {
        debug!("Listing patients with query: {:?}", query);

        let mut query_parts = vec![];

        if let Some(clinic_id) = query.clinic {
            query_parts.push(format!("clinic_id=eq.{}", clinic_id));
        }
        if let Some(name) = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            query_parts.push(format!("name=ilike.*{}*", urlencoding::encode(name)));
        }
        query_parts.push("order=name.asc".to_string());

        let path = format!("/rest/v1/patients?{}", query_parts.join("&"));
        let patients: Vec<Patient> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(patients)
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient> {
        debug!("Updating patient: {}", patient_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            require("name", &name)?;
            update_data.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(phone) = request.phone {
            require("phone", &phone)?;
            update_data.insert("phone".to_string(), json!(phone.trim()));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(date_of_birth) = request.date_of_birth {
            update_data.insert("date_of_birth".to_string(), json!(date_of_birth.format("%Y-%m-%d").to_string()));
        }
        if let Some(blood_type) = request.blood_type {
            update_data.insert("blood_type".to_string(), json!(blood_type));
        }
        if let Some(allergies) = request.allergies {
            update_data.insert("allergies".to_string(), json!(allergies));
        }
        if let Some(chronic_diseases) = request.chronic_diseases {
            update_data.insert("chronic_diseases".to_string(), json!(chronic_diseases));
        }
        if let Some(current_medications) = request.current_medications {
            update_data.insert("current_medications".to_string(), json!(current_medications));
        }
        if let Some(emergency_contact_name) = request.emergency_contact_name {
            update_data.insert("emergency_contact_name".to_string(), json!(emergency_contact_name));
        }
        if let Some(emergency_contact_phone) = request.emergency_contact_phone {
            update_data.insert("emergency_contact_phone".to_string(), json!(emergency_contact_phone));
        }
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        if let Some(sms_consent) = request.sms_consent {
            update_data.insert("sms_consent".to_string(), json!(sms_consent));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Patient> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        result.into_iter().next().ok_or_else(|| anyhow!(PatientError::NotFound))
    }

    pub async fn delete_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<()> {
        debug!("Deleting patient: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let deleted: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(SupabaseClient::representation_headers()),
        ).await?;

        if deleted.is_empty() {
            return Err(anyhow!(PatientError::NotFound));
        }

        info!("Patient {} deleted", patient_id);
        Ok(())
    }
}
