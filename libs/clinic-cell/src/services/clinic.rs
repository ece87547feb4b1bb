use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Clinic, CreateClinicRequest, UpdateClinicRequest, ClinicError};

pub struct ClinicService {
    supabase: SupabaseClient,
}

impl ClinicService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_clinics(&self, auth_token: &str) -> Result<Vec<Clinic>> {
        let clinics: Vec<Clinic> = self.supabase.request(
            Method::GET,
            "/rest/v1/clinics?order=name.asc",
            Some(auth_token),
            None,
        ).await?;

        Ok(clinics)
    }

    pub async fn get_clinic(&self, clinic_id: Uuid, auth_token: &str) -> Result<Clinic> {
        debug!("Fetching clinic: {}", clinic_id);

        let path = format!("/rest/v1/clinics?id=eq.{}", clinic_id);
        let result: Vec<Clinic> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        result.into_iter().next().ok_or_else(|| anyhow!(ClinicError::ClinicNotFound))
    }

    pub async fn create_clinic(&self, request: CreateClinicRequest, auth_token: &str) -> Result<Clinic> {
        if request.name.trim().is_empty() {
            return Err(anyhow!(ClinicError::ValidationError("name is required".to_string())));
        }

        let now = Utc::now().to_rfc3339();
        let clinic_data = json!({
            "name": request.name.trim(),
            "address": request.address,
            "phone": request.phone,
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Clinic> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/clinics",
            Some(auth_token),
            Some(clinic_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let clinic = result.into_iter().next()
            .ok_or_else(|| anyhow!(ClinicError::DatabaseError("Failed to create clinic".to_string())))?;

        info!("Clinic created with ID: {}", clinic.id);
        Ok(clinic)
    }

    pub async fn update_clinic(
        &self,
        clinic_id: Uuid,
        request: UpdateClinicRequest,
        auth_token: &str,
    ) -> Result<Clinic> {
        debug!("Updating clinic: {}", clinic_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(anyhow!(ClinicError::ValidationError("name is required".to_string())));
            }
            update_data.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/clinics?id=eq.{}", clinic_id);
        let result: Vec<Clinic> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        result.into_iter().next().ok_or_else(|| anyhow!(ClinicError::ClinicNotFound))
    }

    pub async fn delete_clinic(&self, clinic_id: Uuid, auth_token: &str) -> Result<()> {
        let path = format!("/rest/v1/clinics?id=eq.{}", clinic_id);
        let deleted: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(SupabaseClient::representation_headers()),
        ).await?;

        if deleted.is_empty() {
            return Err(anyhow!(ClinicError::ClinicNotFound));
        }

        info!("Clinic {} deleted", clinic_id);
        Ok(())
    }
}
