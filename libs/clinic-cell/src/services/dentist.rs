use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Dentist, CreateDentistRequest, UpdateDentistRequest, DentistListQuery, ClinicError};

pub struct DentistService {
    supabase: SupabaseClient,
}

impl DentistService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Lists active dentists only; inactive ones stay reachable by id.
    pub async fn list_dentists(&self, query: DentistListQuery, auth_token: &str) -> Result<Vec<Dentist>> {
        debug!("Listing dentists with query: {:?}", query);

        let mut query_parts = vec!["is_active=eq.true".to_string()];

        if let Some(clinic_id) = query.clinic {
            query_parts.push(format!("clinic_id=eq.{}", clinic_id));
        }
        query_parts.push("order=name.asc".to_string());

        let path = format!("/rest/v1/dentists?{}", query_parts.join("&"));
        let dentists: Vec<Dentist> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(dentists)
    }

    pub async fn get_dentist(&self, dentist_id: Uuid, auth_token: &str) -> Result<Dentist> {
        let path = format!("/rest/v1/dentists?id=eq.{}", dentist_id);
        let result: Vec<Dentist> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        result.into_iter().next().ok_or_else(|| anyhow!(ClinicError::DentistNotFound))
    }

    pub async fn create_dentist(&self, request: CreateDentistRequest, auth_token: &str) -> Result<Dentist> {
        debug!("Adding dentist {} to clinic {}", request.name, request.clinic_id);

        if request.name.trim().is_empty() {
            return Err(anyhow!(ClinicError::ValidationError("name is required".to_string())));
        }

        let now = Utc::now().to_rfc3339();
        let dentist_data = json!({
            "clinic_id": request.clinic_id,
            "name": request.name.trim(),
            "phone": request.phone,
            "specialty": request.specialty,
            "email": request.email,
            "is_active": request.is_active,
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Dentist> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/dentists",
            Some(auth_token),
            Some(dentist_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let dentist = result.into_iter().next()
            .ok_or_else(|| anyhow!(ClinicError::DatabaseError("Failed to create dentist".to_string())))?;

        info!("Dentist created with ID: {}", dentist.id);
        Ok(dentist)
    }

    pub async fn update_dentist(
        &self,
        dentist_id: Uuid,
        request: UpdateDentistRequest,
        auth_token: &str,
    ) -> Result<Dentist> {
        let mut update_data = serde_json::Map::new();

        if let Some(clinic_id) = request.clinic_id {
            update_data.insert("clinic_id".to_string(), json!(clinic_id));
        }
        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(anyhow!(ClinicError::ValidationError("name is required".to_string())));
            }
            update_data.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(specialty) = request.specialty {
            update_data.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/dentists?id=eq.{}", dentist_id);
        let result: Vec<Dentist> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        result.into_iter().next().ok_or_else(|| anyhow!(ClinicError::DentistNotFound))
    }

    pub async fn delete_dentist(&self, dentist_id: Uuid, auth_token: &str) -> Result<()> {
        let path = format!("/rest/v1/dentists?id=eq.{}", dentist_id);
        let deleted: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(SupabaseClient::representation_headers()),
        ).await?;

        if deleted.is_empty() {
            return Err(anyhow!(ClinicError::DentistNotFound));
        }

        info!("Dentist {} deleted", dentist_id);
        Ok(())
    }
}
